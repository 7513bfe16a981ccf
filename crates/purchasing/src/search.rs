//! Filtered search over the derived minimum-quantity attribute.
//!
//! The attribute lives on no table: it is derived per record by joining the
//! product's supplier offer and converting into the record's unit. A
//! storage-backed host translates this into a join; here the predicate is
//! evaluated in process through the same resolver the records use, so both
//! paths agree by construction. Records with no derived minimum never
//! match, like rows dropped by an inner join.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::directory::ProductDirectory;
use crate::minimum::resolve_minimum_quantity;
use crate::order::{PurchaseLine, PurchaseOrder};
use crate::request::PurchaseRequest;

/// Comparison operator for attribute filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn matches(self, left: Decimal, right: Decimal) -> bool {
        match self {
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Gt => left > right,
            Comparison::Ge => left >= right,
        }
    }
}

/// Predicate against the derived minimum-quantity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumQuantityFilter {
    pub comparison: Comparison,
    pub value: Decimal,
}

impl MinimumQuantityFilter {
    pub fn new(comparison: Comparison, value: Decimal) -> Self {
        Self { comparison, value }
    }

    fn matches(&self, minimum: Option<Decimal>) -> bool {
        minimum.is_some_and(|min| self.comparison.matches(min, self.value))
    }
}

/// Requests whose derived minimum satisfies the filter.
pub fn filter_requests<'a, D: ProductDirectory>(
    directory: &D,
    requests: &'a [PurchaseRequest],
    filter: &MinimumQuantityFilter,
) -> Vec<&'a PurchaseRequest> {
    requests
        .iter()
        .filter(|request| filter.matches(request.minimum_quantity(directory)))
        .collect()
}

/// Lines of `order` whose derived minimum satisfies the filter.
///
/// The order's counterparty is the supplier; the minimum is re-derived from
/// the current offer rather than read from the line's creation-time
/// snapshot.
pub fn filter_lines<'a, D: ProductDirectory>(
    directory: &D,
    order: &'a PurchaseOrder,
    filter: &MinimumQuantityFilter,
) -> Vec<&'a PurchaseLine> {
    order
        .lines()
        .iter()
        .filter(|line| {
            let minimum = resolve_minimum_quantity(
                directory,
                line.product_id,
                order.supplier_id(),
                &line.unit,
            );
            filter.matches(minimum)
        })
        .collect()
}
