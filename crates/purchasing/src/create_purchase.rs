//! Materialization of purchase requests into draft purchase orders.
//!
//! Requests for the same supplier, product and unit coalesce onto one
//! candidate line whose baseline quantity is the sum of the group. Each
//! candidate then passes through [`enforce_minimum_on_line`], the single
//! extension point where the supplier minimum raises the quantity, before
//! the draft order is built through the normal aggregate command path.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use procure_core::{Aggregate, DomainError, DomainResult, TenantId};
use procure_parties::PartyId;
use procure_products::{Product, ProductId, SupplierOffer};
use procure_uom::{self as uom, Uom};

use crate::directory::ProductDirectory;
use crate::minimum::{enforce_minimum_on_line, resolve_minimum_quantity};
use crate::order::{
    AddLine, CreatePurchaseOrder, PurchaseOrder, PurchaseOrderCommand, PurchaseOrderId,
};
use crate::request::{PurchaseRequest, PurchaseRequestId, PurchaseRequestState};

/// A candidate purchase-order line, not yet part of an order.
///
/// `amount` is re-derived on every quantity or price change; mutation goes
/// through the setters so it can never go stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    product_id: ProductId,
    quantity: Decimal,
    unit: Uom,
    unit_price: Decimal,
    minimum_quantity: Option<Decimal>,
    amount: Decimal,
}

impl PlannedLine {
    pub fn new(
        product_id: ProductId,
        quantity: Decimal,
        unit: Uom,
        unit_price: Decimal,
        minimum_quantity: Option<Decimal>,
    ) -> Self {
        let amount = crate::order::line_amount(quantity, unit_price);
        Self {
            product_id,
            quantity,
            unit,
            unit_price,
            minimum_quantity,
            amount,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit(&self) -> &Uom {
        &self.unit
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn minimum_quantity(&self) -> Option<Decimal> {
        self.minimum_quantity
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Change the quantity, re-deriving the amount.
    pub fn set_quantity(&mut self, quantity: Decimal) {
        self.quantity = quantity;
        self.amount = crate::order::line_amount(self.quantity, self.unit_price);
    }

    /// Change the unit price, re-deriving the amount.
    pub fn set_unit_price(&mut self, unit_price: Decimal) {
        self.unit_price = unit_price;
        self.amount = crate::order::line_amount(self.quantity, self.unit_price);
    }
}

/// Planned draft order for one supplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasePlan {
    pub tenant_id: TenantId,
    pub supplier_id: PartyId,
    pub lines: Vec<PlannedLine>,
    /// Requests covered by this plan, to be marked purchased by the host.
    pub request_ids: Vec<PurchaseRequestId>,
}

/// Result of planning a batch of requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasePlanning {
    pub plans: Vec<PurchasePlan>,
    /// Requests without a suggested supplier; nothing can be planned for
    /// them and they are reported rather than silently dropped.
    pub unassigned: Vec<PurchaseRequestId>,
}

struct Group<'a> {
    supplier_id: PartyId,
    product_id: ProductId,
    unit: Uom,
    requests: Vec<&'a PurchaseRequest>,
}

/// Group draft requests into candidate lines, apply the supplier minimum to
/// each, and return one plan per supplier (suppliers and lines in
/// first-seen order).
///
/// All requests must be draft and belong to one tenant.
pub fn plan_purchases<D: ProductDirectory>(
    directory: &D,
    requests: &[PurchaseRequest],
) -> DomainResult<PurchasePlanning> {
    let mut tenant_id: Option<TenantId> = None;
    for request in requests {
        if request.state() != PurchaseRequestState::Draft {
            return Err(DomainError::validation(format!(
                "request {} is not draft",
                request.id_typed()
            )));
        }
        match tenant_id {
            None => tenant_id = Some(request.tenant_id()),
            Some(tenant) if tenant != request.tenant_id() => {
                return Err(DomainError::invariant("requests span tenants"));
            }
            Some(_) => {}
        }
    }

    let mut unassigned = Vec::new();
    let mut groups: Vec<Group<'_>> = Vec::new();
    for request in requests {
        let Some(supplier_id) = request.party() else {
            unassigned.push(request.id_typed());
            continue;
        };
        let existing = groups.iter().position(|group| {
            group.supplier_id == supplier_id
                && group.product_id == request.product_id()
                && group.unit == *request.unit()
        });
        match existing {
            Some(i) => groups[i].requests.push(request),
            None => groups.push(Group {
                supplier_id,
                product_id: request.product_id(),
                unit: request.unit().clone(),
                requests: vec![request],
            }),
        }
    }

    let mut plans: Vec<PurchasePlan> = Vec::new();
    for group in &groups {
        let product = directory.product(group.product_id).ok_or_else(|| {
            DomainError::validation(format!("unknown product {}", group.product_id))
        })?;
        let offer = product.offer_for(group.supplier_id);

        let baseline: Decimal = group.requests.iter().map(|request| request.quantity()).sum();
        let minimum = resolve_minimum_quantity(
            directory,
            group.product_id,
            Some(group.supplier_id),
            &group.unit,
        );
        let unit_price =
            offer.and_then(|offer| tier_unit_price(product, offer, baseline, &group.unit));

        let mut line = PlannedLine::new(
            group.product_id,
            baseline,
            group.unit.clone(),
            unit_price.unwrap_or(Decimal::ZERO),
            minimum,
        );

        // Extension point: raise the quantity to the largest contributing
        // minimum, then re-derive the price for the (possibly larger)
        // quantity since a different tier may now apply.
        enforce_minimum_on_line(directory, &mut line, group.requests.iter().copied());
        if line.quantity() != baseline {
            if let Some(offer) = offer {
                if let Some(price) = tier_unit_price(product, offer, line.quantity(), &group.unit) {
                    line.set_unit_price(price);
                }
            }
        }

        let request_ids: Vec<PurchaseRequestId> =
            group.requests.iter().map(|r| r.id_typed()).collect();
        match plans
            .iter()
            .position(|plan| plan.supplier_id == group.supplier_id)
        {
            Some(i) => {
                plans[i].lines.push(line);
                plans[i].request_ids.extend(request_ids);
            }
            None => plans.push(PurchasePlan {
                // `groups` is non-empty here, so a tenant was recorded.
                tenant_id: tenant_id.ok_or_else(|| DomainError::invariant("no tenant"))?,
                supplier_id: group.supplier_id,
                lines: vec![line],
                request_ids,
            }),
        }
    }

    tracing::debug!(
        plans = plans.len(),
        unassigned = unassigned.len(),
        "planned purchases from requests"
    );

    Ok(PurchasePlanning { plans, unassigned })
}

/// Unit price for `quantity` of `product` under `offer`, expressed per
/// `line_unit`.
///
/// Tier thresholds and prices are configured in the product's purchase
/// unit, so the quantity converts into it for tier selection and the
/// selected price converts back into the line's unit. Quantities in a unit
/// from another category select and price at face value.
fn tier_unit_price(
    product: &Product,
    offer: &SupplierOffer,
    quantity: Decimal,
    line_unit: &Uom,
) -> Option<Decimal> {
    let purchase_uom = product.purchase_uom()?;
    let (tier_quantity, price_ratio) = if line_unit.compatible_with(purchase_uom) {
        (
            uom::convert(line_unit, quantity, purchase_uom).unwrap_or(quantity),
            line_unit.factor() / purchase_uom.factor(),
        )
    } else {
        (quantity, Decimal::ONE)
    };
    let price = offer.unit_price_for(tier_quantity)?;
    Some((price * price_ratio).round_dp(4))
}

/// Build the draft purchase order for a plan, driving the aggregate through
/// its normal command path.
pub fn execute_plan(
    plan: &PurchasePlan,
    order_id: PurchaseOrderId,
    now: DateTime<Utc>,
) -> DomainResult<PurchaseOrder> {
    let mut order = PurchaseOrder::empty(order_id);

    let events = order.handle(&PurchaseOrderCommand::CreatePurchaseOrder(
        CreatePurchaseOrder {
            tenant_id: plan.tenant_id,
            order_id,
            supplier_id: plan.supplier_id,
            occurred_at: now,
        },
    ))?;
    for event in &events {
        order.apply(event);
    }

    for line in &plan.lines {
        let events = order.handle(&PurchaseOrderCommand::AddLine(AddLine {
            tenant_id: plan.tenant_id,
            order_id,
            product_id: line.product_id(),
            quantity: line.quantity(),
            unit: line.unit().clone(),
            unit_price: line.unit_price(),
            minimum_quantity: line.minimum_quantity(),
            occurred_at: now,
        }))?;
        for event in &events {
            order.apply(event);
        }
    }

    Ok(order)
}
