//! Purchase requests: internal demand signals awaiting conversion into
//! purchase-order lines.
//!
//! Requests are generated by supply planning, which is outside this
//! workspace; they arrive here as plain records. They are entities, not
//! aggregates: their lifecycle is owned by the planning process, and the
//! only transition purchasing performs is marking them purchased.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procure_core::{AggregateId, DomainError, DomainResult, Entity, TenantId};
use procure_parties::PartyId;
use procure_products::ProductId;
use procure_uom::Uom;

use crate::directory::ProductDirectory;
use crate::minimum::resolve_minimum_quantity;

/// Purchase request identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseRequestId(pub AggregateId);

impl PurchaseRequestId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseRequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseRequestState {
    Draft,
    Purchased,
    Done,
    Cancelled,
}

/// A demand for `quantity` of a product, suggested to be covered by
/// `party`. `quantity` is expressed in `unit`, which need not be the
/// product's purchase unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    id: PurchaseRequestId,
    tenant_id: TenantId,
    product_id: ProductId,
    party: Option<PartyId>,
    quantity: Decimal,
    unit: Uom,
    state: PurchaseRequestState,
    /// Reference to the demand source (shipment, order point, ...).
    origin: String,
}

impl PurchaseRequest {
    pub fn new(
        id: PurchaseRequestId,
        tenant_id: TenantId,
        product_id: ProductId,
        party: Option<PartyId>,
        quantity: Decimal,
        unit: Uom,
        origin: impl Into<String>,
    ) -> DomainResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("request quantity must be positive"));
        }
        Ok(Self {
            id,
            tenant_id,
            product_id,
            party,
            quantity,
            unit,
            state: PurchaseRequestState::Draft,
            origin: origin.into(),
        })
    }

    pub fn id_typed(&self) -> PurchaseRequestId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn party(&self) -> Option<PartyId> {
        self.party
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit(&self) -> &Uom {
        &self.unit
    }

    pub fn state(&self) -> PurchaseRequestState {
        self.state
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Derived attribute: the supplier minimum for this request, converted
    /// into the request's own unit. Absent when no minimum applies.
    pub fn minimum_quantity<D: ProductDirectory>(&self, directory: &D) -> Option<Decimal> {
        resolve_minimum_quantity(directory, self.product_id, self.party, &self.unit)
    }

    /// Mark the request covered by a purchase. Only draft requests can be
    /// purchased.
    pub fn mark_purchased(&mut self) -> DomainResult<()> {
        if self.state != PurchaseRequestState::Draft {
            return Err(DomainError::invariant(
                "only draft requests can be marked purchased",
            ));
        }
        self.state = PurchaseRequestState::Purchased;
        Ok(())
    }
}

impl Entity for PurchaseRequest {
    type Id = PurchaseRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
