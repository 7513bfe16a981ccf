//! Purchasing domain module.
//!
//! Purchase requests (internal demand signals), draft purchase orders, and
//! the supplier minimum-order-quantity rule that connects them: when
//! requests are materialized into order lines, each line's quantity is
//! raised to the largest minimum among its contributing requests.
//!
//! Everything here is deterministic domain logic. Reads of product records
//! go through the [`ProductDirectory`] seam; persistence, transactions and
//! request generation belong to the host.

pub mod create_purchase;
pub mod directory;
pub mod minimum;
pub mod order;
pub mod request;
pub mod search;

pub use create_purchase::{PlannedLine, PurchasePlan, PurchasePlanning, plan_purchases, execute_plan};
pub use directory::{InMemoryProducts, ProductDirectory};
pub use minimum::{enforce_minimum_on_line, resolve_minimum_quantity};
pub use order::{
    AddLine, Cancel, Confirm, CreatePurchaseOrder, GoodsReceived, PurchaseLine,
    PurchaseLineQuantitySet, PurchaseOrder, PurchaseOrderCancelled, PurchaseOrderCommand,
    PurchaseOrderConfirmed, PurchaseOrderCreated, PurchaseOrderEvent, PurchaseOrderId,
    PurchaseOrderLineAdded, PurchaseOrderQuoted, PurchaseOrderStatus, ReceiveGoods,
    SendQuotation, SetLineQuantity,
};
pub use request::{PurchaseRequest, PurchaseRequestId, PurchaseRequestState};
pub use search::{Comparison, MinimumQuantityFilter, filter_lines, filter_requests};
