use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procure_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use procure_events::Event;
use procure_parties::PartyId;
use procure_products::ProductId;
use procure_uom::Uom;

/// Purchase order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub AggregateId);

impl PurchaseOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Draft,
    Quotation,
    Confirmed,
    Received,
    Cancelled,
}

/// Purchase order line.
///
/// `minimum_quantity` is a snapshot of the supplier minimum (in the line's
/// unit) taken when the line was created; `None` means no minimum applied.
/// `amount` is always `quantity * unit_price` rounded to 2 decimals and is
/// re-derived whenever the quantity changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit: Uom,
    pub unit_price: Decimal,
    pub minimum_quantity: Option<Decimal>,
    pub amount: Decimal,
}

/// Line amount: quantity times unit price, as money (2 decimals).
pub(crate) fn line_amount(quantity: Decimal, unit_price: Decimal) -> Decimal {
    (quantity * unit_price).round_dp(2)
}

/// While an order is still negotiable, a positive line quantity must reach
/// the supplier minimum; negative quantities (returns) are exempt.
fn check_line_minimum(quantity: Decimal, minimum: Option<Decimal>) -> Result<(), DomainError> {
    if let Some(min) = minimum {
        if quantity >= Decimal::ZERO && quantity < min {
            return Err(DomainError::validation(format!(
                "quantity {quantity} is below the supplier minimum {min}"
            )));
        }
    }
    Ok(())
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    tenant_id: Option<TenantId>,
    supplier_id: Option<PartyId>,
    status: PurchaseOrderStatus,
    lines: Vec<PurchaseLine>,
    version: u64,
    created: bool,
}

impl PurchaseOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PurchaseOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            supplier_id: None,
            status: PurchaseOrderStatus::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn supplier_id(&self) -> Option<PartyId> {
        self.supplier_id
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[PurchaseLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&PurchaseLine> {
        self.lines.iter().find(|line| line.line_no == line_no)
    }

    /// Sum of line amounts.
    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(|line| line.amount).sum()
    }

    /// Lines are only negotiable before confirmation.
    fn lines_mutable(&self) -> bool {
        matches!(
            self.status,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Quotation
        )
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchaseOrder {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: PartyId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLine (only while draft or quotation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit: Uom,
    pub unit_price: Decimal,
    /// Supplier minimum in the line's unit, if one applies.
    pub minimum_quantity: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetLineQuantity (re-derives the line amount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetLineQuantity {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
    pub quantity: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SendQuotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendQuotation {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Confirm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirm {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveGoods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveGoods {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancel {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderCommand {
    CreatePurchaseOrder(CreatePurchaseOrder),
    AddLine(AddLine),
    SetLineQuantity(SetLineQuantity),
    SendQuotation(SendQuotation),
    Confirm(Confirm),
    ReceiveGoods(ReceiveGoods),
    Cancel(Cancel),
}

/// Event: PurchaseOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCreated {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: PartyId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderLineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLineAdded {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit: Uom,
    pub unit_price: Decimal,
    pub minimum_quantity: Option<Decimal>,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseLineQuantitySet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLineQuantitySet {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
    pub quantity: Decimal,
    /// Amount re-derived from the new quantity.
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderQuoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderQuoted {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderConfirmed {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GoodsReceived.
///
/// Carries the received lines so an inventory projection can translate the
/// receipt into stock without reloading the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceived {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: PartyId,
    pub lines: Vec<PurchaseLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCancelled {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderEvent {
    PurchaseOrderCreated(PurchaseOrderCreated),
    PurchaseOrderLineAdded(PurchaseOrderLineAdded),
    PurchaseLineQuantitySet(PurchaseLineQuantitySet),
    PurchaseOrderQuoted(PurchaseOrderQuoted),
    PurchaseOrderConfirmed(PurchaseOrderConfirmed),
    GoodsReceived(GoodsReceived),
    PurchaseOrderCancelled(PurchaseOrderCancelled),
}

impl Event for PurchaseOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(_) => "purchasing.order.created",
            PurchaseOrderEvent::PurchaseOrderLineAdded(_) => "purchasing.order.line_added",
            PurchaseOrderEvent::PurchaseLineQuantitySet(_) => "purchasing.order.line_quantity_set",
            PurchaseOrderEvent::PurchaseOrderQuoted(_) => "purchasing.order.quoted",
            PurchaseOrderEvent::PurchaseOrderConfirmed(_) => "purchasing.order.confirmed",
            PurchaseOrderEvent::GoodsReceived(_) => "purchasing.order.goods_received",
            PurchaseOrderEvent::PurchaseOrderCancelled(_) => "purchasing.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderLineAdded(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseLineQuantitySet(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderQuoted(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderConfirmed(e) => e.occurred_at,
            PurchaseOrderEvent::GoodsReceived(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PurchaseOrder {
    type Command = PurchaseOrderCommand;
    type Event = PurchaseOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.supplier_id = Some(e.supplier_id);
                self.status = PurchaseOrderStatus::Draft;
                self.lines.clear();
                self.created = true;
            }
            PurchaseOrderEvent::PurchaseOrderLineAdded(e) => {
                self.lines.push(PurchaseLine {
                    line_no: e.line_no,
                    product_id: e.product_id,
                    quantity: e.quantity,
                    unit: e.unit.clone(),
                    unit_price: e.unit_price,
                    minimum_quantity: e.minimum_quantity,
                    amount: e.amount,
                });
            }
            PurchaseOrderEvent::PurchaseLineQuantitySet(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.quantity = e.quantity;
                    line.amount = e.amount;
                }
            }
            PurchaseOrderEvent::PurchaseOrderQuoted(_) => {
                self.status = PurchaseOrderStatus::Quotation;
            }
            PurchaseOrderEvent::PurchaseOrderConfirmed(_) => {
                self.status = PurchaseOrderStatus::Confirmed;
            }
            PurchaseOrderEvent::GoodsReceived(_) => {
                self.status = PurchaseOrderStatus::Received;
            }
            PurchaseOrderEvent::PurchaseOrderCancelled(_) => {
                self.status = PurchaseOrderStatus::Cancelled;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PurchaseOrderCommand::CreatePurchaseOrder(cmd) => self.handle_create(cmd),
            PurchaseOrderCommand::AddLine(cmd) => self.handle_add_line(cmd),
            PurchaseOrderCommand::SetLineQuantity(cmd) => self.handle_set_line_quantity(cmd),
            PurchaseOrderCommand::SendQuotation(cmd) => self.handle_quote(cmd),
            PurchaseOrderCommand::Confirm(cmd) => self.handle_confirm(cmd),
            PurchaseOrderCommand::ReceiveGoods(cmd) => self.handle_receive(cmd),
            PurchaseOrderCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl PurchaseOrder {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_order_id(&self, order_id: PurchaseOrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_exists(&self, tenant_id: TenantId, order_id: PurchaseOrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(tenant_id)?;
        self.ensure_order_id(order_id)
    }

    fn handle_create(
        &self,
        cmd: &CreatePurchaseOrder,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("purchase order already exists"));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderCreated(
            PurchaseOrderCreated {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                supplier_id: cmd.supplier_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;

        if !self.lines_mutable() {
            return Err(DomainError::invariant(
                "lines can only change while the order is draft or quotation",
            ));
        }

        if cmd.quantity == Decimal::ZERO {
            return Err(DomainError::validation("quantity cannot be zero"));
        }

        if cmd.unit_price < Decimal::ZERO {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }

        check_line_minimum(cmd.quantity, cmd.minimum_quantity)?;

        let next_line_no = (self.lines.len() as u32) + 1;
        Ok(vec![PurchaseOrderEvent::PurchaseOrderLineAdded(
            PurchaseOrderLineAdded {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                line_no: next_line_no,
                product_id: cmd.product_id,
                quantity: cmd.quantity,
                unit: cmd.unit.clone(),
                unit_price: cmd.unit_price,
                minimum_quantity: cmd.minimum_quantity,
                amount: line_amount(cmd.quantity, cmd.unit_price),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_set_line_quantity(
        &self,
        cmd: &SetLineQuantity,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;

        if !self.lines_mutable() {
            return Err(DomainError::invariant(
                "lines can only change while the order is draft or quotation",
            ));
        }

        let line = self
            .line(cmd.line_no)
            .ok_or_else(|| DomainError::validation(format!("no line {}", cmd.line_no)))?;

        if cmd.quantity == Decimal::ZERO {
            return Err(DomainError::validation("quantity cannot be zero"));
        }

        check_line_minimum(cmd.quantity, line.minimum_quantity)?;

        Ok(vec![PurchaseOrderEvent::PurchaseLineQuantitySet(
            PurchaseLineQuantitySet {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                line_no: cmd.line_no,
                quantity: cmd.quantity,
                amount: line_amount(cmd.quantity, line.unit_price),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_quote(&self, cmd: &SendQuotation) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;

        if self.status != PurchaseOrderStatus::Draft {
            return Err(DomainError::invariant(
                "only draft purchase orders can be quoted",
            ));
        }

        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "cannot quote a purchase order without lines",
            ));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderQuoted(
            PurchaseOrderQuoted {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_confirm(&self, cmd: &Confirm) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;

        if self.status != PurchaseOrderStatus::Quotation {
            return Err(DomainError::invariant(
                "only quoted purchase orders can be confirmed",
            ));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderConfirmed(
            PurchaseOrderConfirmed {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_receive(&self, cmd: &ReceiveGoods) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;

        // Invariant: cannot receive before confirmation.
        if self.status != PurchaseOrderStatus::Confirmed {
            return Err(DomainError::invariant(
                "cannot receive goods before the purchase order is confirmed",
            ));
        }

        let supplier_id = self
            .supplier_id
            .ok_or_else(|| DomainError::invariant("supplier must be set"))?;

        Ok(vec![PurchaseOrderEvent::GoodsReceived(GoodsReceived {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            supplier_id,
            lines: self.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &Cancel) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;

        if !self.lines_mutable() {
            return Err(DomainError::invariant(
                "only draft or quotation purchase orders can be cancelled",
            ));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderCancelled(
            PurchaseOrderCancelled {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_order_id() -> PurchaseOrderId {
        PurchaseOrderId::new(AggregateId::new())
    }

    fn test_supplier_id() -> PartyId {
        PartyId::new(AggregateId::new())
    }

    fn test_product_id() -> ProductId {
        ProductId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn drive(order: &mut PurchaseOrder, cmd: PurchaseOrderCommand) -> Vec<PurchaseOrderEvent> {
        let events = order.handle(&cmd).unwrap();
        for event in &events {
            order.apply(event);
        }
        events
    }

    fn draft_order(tenant_id: TenantId, order_id: PurchaseOrderId) -> PurchaseOrder {
        let mut order = PurchaseOrder::empty(order_id);
        drive(
            &mut order,
            PurchaseOrderCommand::CreatePurchaseOrder(CreatePurchaseOrder {
                tenant_id,
                order_id,
                supplier_id: test_supplier_id(),
                occurred_at: test_time(),
            }),
        );
        order
    }

    fn add_line_cmd(
        tenant_id: TenantId,
        order_id: PurchaseOrderId,
        quantity: Decimal,
        minimum: Option<Decimal>,
    ) -> AddLine {
        AddLine {
            tenant_id,
            order_id,
            product_id: test_product_id(),
            quantity,
            unit: Uom::unit(),
            unit_price: dec!(14),
            minimum_quantity: minimum,
            occurred_at: test_time(),
        }
    }

    #[test]
    fn add_line_computes_the_amount() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = draft_order(tenant_id, order_id);

        drive(
            &mut order,
            PurchaseOrderCommand::AddLine(add_line_cmd(tenant_id, order_id, dec!(5), None)),
        );

        let line = order.line(1).unwrap();
        assert_eq!(line.quantity, dec!(5));
        assert_eq!(line.amount, dec!(70));
        assert_eq!(order.total_amount(), dec!(70));
    }

    #[test]
    fn add_line_rejects_quantity_below_minimum() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let order = draft_order(tenant_id, order_id);

        let err = order
            .handle(&PurchaseOrderCommand::AddLine(add_line_cmd(
                tenant_id,
                order_id,
                dec!(3),
                Some(dec!(5)),
            )))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("below the supplier minimum")),
            _ => panic!("Expected Validation error for below-minimum quantity"),
        }
    }

    #[test]
    fn add_line_allows_negative_quantity_despite_minimum() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = draft_order(tenant_id, order_id);

        // A return to the supplier ignores the minimum.
        drive(
            &mut order,
            PurchaseOrderCommand::AddLine(add_line_cmd(
                tenant_id,
                order_id,
                dec!(-2),
                Some(dec!(5)),
            )),
        );
        assert_eq!(order.line(1).unwrap().quantity, dec!(-2));
        assert_eq!(order.line(1).unwrap().amount, dec!(-28));
    }

    #[test]
    fn add_line_accepts_quantity_at_the_minimum() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = draft_order(tenant_id, order_id);

        drive(
            &mut order,
            PurchaseOrderCommand::AddLine(add_line_cmd(
                tenant_id,
                order_id,
                dec!(5),
                Some(dec!(5)),
            )),
        );
        assert_eq!(order.line(1).unwrap().minimum_quantity, Some(dec!(5)));
    }

    #[test]
    fn set_line_quantity_rederives_the_amount() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = draft_order(tenant_id, order_id);
        drive(
            &mut order,
            PurchaseOrderCommand::AddLine(add_line_cmd(tenant_id, order_id, dec!(5), None)),
        );

        drive(
            &mut order,
            PurchaseOrderCommand::SetLineQuantity(SetLineQuantity {
                tenant_id,
                order_id,
                line_no: 1,
                quantity: dec!(7),
                occurred_at: test_time(),
            }),
        );

        let line = order.line(1).unwrap();
        assert_eq!(line.quantity, dec!(7));
        assert_eq!(line.amount, dec!(98));
    }

    #[test]
    fn set_line_quantity_enforces_the_stored_minimum() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = draft_order(tenant_id, order_id);
        drive(
            &mut order,
            PurchaseOrderCommand::AddLine(add_line_cmd(
                tenant_id,
                order_id,
                dec!(5),
                Some(dec!(5)),
            )),
        );

        let err = order
            .handle(&PurchaseOrderCommand::SetLineQuantity(SetLineQuantity {
                tenant_id,
                order_id,
                line_no: 1,
                quantity: dec!(4),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("below the supplier minimum")),
            _ => panic!("Expected Validation error for below-minimum quantity"),
        }
    }

    #[test]
    fn lines_are_locked_after_confirmation() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = draft_order(tenant_id, order_id);
        drive(
            &mut order,
            PurchaseOrderCommand::AddLine(add_line_cmd(tenant_id, order_id, dec!(5), None)),
        );
        drive(
            &mut order,
            PurchaseOrderCommand::SendQuotation(SendQuotation {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }),
        );
        drive(
            &mut order,
            PurchaseOrderCommand::Confirm(Confirm {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }),
        );

        let err = order
            .handle(&PurchaseOrderCommand::AddLine(add_line_cmd(
                tenant_id,
                order_id,
                dec!(1),
                None,
            )))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => {
                assert!(msg.contains("draft or quotation"))
            }
            _ => panic!("Expected InvariantViolation for locked lines"),
        }
    }

    #[test]
    fn quote_requires_lines() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let order = draft_order(tenant_id, order_id);

        let err = order
            .handle(&PurchaseOrderCommand::SendQuotation(SendQuotation {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("without lines")),
            _ => panic!("Expected Validation error for quoting an empty order"),
        }
    }

    #[test]
    fn cannot_receive_before_confirmation() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = draft_order(tenant_id, order_id);
        drive(
            &mut order,
            PurchaseOrderCommand::AddLine(add_line_cmd(tenant_id, order_id, dec!(5), None)),
        );

        let err = order
            .handle(&PurchaseOrderCommand::ReceiveGoods(ReceiveGoods {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => {
                assert!(msg.contains("before the purchase order is confirmed"))
            }
            _ => panic!("Expected InvariantViolation for receiving before confirmation"),
        }
    }

    #[test]
    fn receive_after_confirmation_emits_goods_received_with_lines() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = PurchaseOrder::empty(order_id);
        let supplier_id = test_supplier_id();
        drive(
            &mut order,
            PurchaseOrderCommand::CreatePurchaseOrder(CreatePurchaseOrder {
                tenant_id,
                order_id,
                supplier_id,
                occurred_at: test_time(),
            }),
        );
        drive(
            &mut order,
            PurchaseOrderCommand::AddLine(add_line_cmd(tenant_id, order_id, dec!(5), None)),
        );
        drive(
            &mut order,
            PurchaseOrderCommand::SendQuotation(SendQuotation {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }),
        );
        drive(
            &mut order,
            PurchaseOrderCommand::Confirm(Confirm {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }),
        );

        let events = drive(
            &mut order,
            PurchaseOrderCommand::ReceiveGoods(ReceiveGoods {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }),
        );

        match &events[0] {
            PurchaseOrderEvent::GoodsReceived(e) => {
                assert_eq!(e.supplier_id, supplier_id);
                assert_eq!(e.lines.len(), 1);
                assert_eq!(e.lines[0].quantity, dec!(5));
            }
            _ => panic!("Expected GoodsReceived event"),
        }
        assert_eq!(order.status(), PurchaseOrderStatus::Received);
    }

    #[test]
    fn event_types_are_stable_identifiers() {
        // Projections subscribe by these names; renaming them is a schema change.
        let event = PurchaseOrderEvent::PurchaseOrderCreated(PurchaseOrderCreated {
            tenant_id: test_tenant_id(),
            order_id: test_order_id(),
            supplier_id: test_supplier_id(),
            occurred_at: test_time(),
        });
        assert_eq!(event.event_type(), "purchasing.order.created");
        assert_eq!(event.version(), 1);
    }

    #[test]
    fn cancel_is_only_allowed_while_negotiable() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = draft_order(tenant_id, order_id);
        drive(
            &mut order,
            PurchaseOrderCommand::AddLine(add_line_cmd(tenant_id, order_id, dec!(5), None)),
        );
        drive(
            &mut order,
            PurchaseOrderCommand::Cancel(Cancel {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(order.status(), PurchaseOrderStatus::Cancelled);
    }
}
