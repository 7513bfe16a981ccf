//! Supplier minimum order quantity rule.
//!
//! Two operations, both stateless:
//!
//! - [`resolve_minimum_quantity`] computes the minimum a supplier imposes
//!   for a product, expressed in a caller-chosen unit. Requests and order
//!   lines expose their derived `minimum_quantity` attributes through it.
//! - [`enforce_minimum_on_line`] raises a candidate purchase line to the
//!   largest minimum among its contributing requests during
//!   request-to-line materialization.

use rust_decimal::Decimal;

use procure_parties::PartyId;
use procure_products::ProductId;
use procure_uom::{self as uom, Uom};

use crate::create_purchase::PlannedLine;
use crate::directory::ProductDirectory;
use crate::request::PurchaseRequest;

/// Resolve the minimum order quantity for (`product_id`, `party`) in
/// `target_unit`.
///
/// Returns `None` when no minimum applies: no supplier given, unknown
/// product, no offer from that supplier, or an unset/zero minimum. The
/// configured minimum lives in the product's purchase unit; it is converted
/// into `target_unit` when the units share a category, and returned raw
/// otherwise (an incompatible unit degrades softly rather than failing).
pub fn resolve_minimum_quantity<D: ProductDirectory>(
    directory: &D,
    product_id: ProductId,
    party: Option<PartyId>,
    target_unit: &Uom,
) -> Option<Decimal> {
    let party = party?;
    let product = directory.product(product_id)?;
    let offer = product.offer_for(party)?;
    let minimum = offer.effective_minimum()?;
    let purchase_uom = product.purchase_uom()?;

    if purchase_uom.compatible_with(target_unit) {
        Some(uom::convert(purchase_uom, minimum, target_unit).unwrap_or(minimum))
    } else {
        Some(minimum)
    }
}

/// Raise `line`'s quantity to the largest minimum among its contributing
/// requests (absent minimums count as zero), re-deriving the line amount.
///
/// A single line must satisfy the largest individual minimum; minimums are
/// never summed. When no request carries a minimum, the line is left as the
/// default aggregation computed it. Idempotent.
pub fn enforce_minimum_on_line<'a, D, I>(directory: &D, line: &mut PlannedLine, requests: I)
where
    D: ProductDirectory,
    I: IntoIterator<Item = &'a PurchaseRequest>,
{
    let Some(floor) = requests
        .into_iter()
        .filter_map(|request| request.minimum_quantity(directory))
        .max()
    else {
        return;
    };

    if floor > line.quantity() {
        tracing::debug!(
            product = %line.product_id(),
            baseline = %line.quantity(),
            minimum = %floor,
            "raising purchase line quantity to supplier minimum"
        );
        line.set_quantity(floor);
    }
}
