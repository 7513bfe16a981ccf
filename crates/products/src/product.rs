use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procure_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId, ValueObject};
use procure_events::Event;
use procure_parties::PartyId;
use procure_uom::Uom;

/// Product identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Product status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Active,
    Archived,
}

/// One quantity tier of a supplier's price list.
///
/// The tier with the largest `quantity` not exceeding the ordered quantity
/// applies. A tier at quantity 0 is the supplier's base price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl ValueObject for PriceTier {}

/// A supplier's offer for this product.
///
/// `minimum_quantity` is expressed in the product's purchase unit of
/// measure. `None` or zero means the supplier imposes no minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierOffer {
    pub party: PartyId,
    pub minimum_quantity: Option<Decimal>,
    pub lead_time_days: u32,
    pub price_tiers: Vec<PriceTier>,
}

impl ValueObject for SupplierOffer {}

impl SupplierOffer {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(min) = self.minimum_quantity {
            if min < Decimal::ZERO {
                return Err(DomainError::validation(
                    "minimum quantity cannot be negative",
                ));
            }
        }
        for tier in &self.price_tiers {
            if tier.quantity < Decimal::ZERO {
                return Err(DomainError::validation(
                    "price tier quantity cannot be negative",
                ));
            }
            if tier.unit_price < Decimal::ZERO {
                return Err(DomainError::validation("unit price cannot be negative"));
            }
        }
        Ok(())
    }

    /// The minimum that actually binds: unset and zero both mean "none".
    pub fn effective_minimum(&self) -> Option<Decimal> {
        self.minimum_quantity.filter(|min| *min > Decimal::ZERO)
    }

    /// Unit price for an order of `quantity`: the tier with the largest
    /// threshold not exceeding it.
    pub fn unit_price_for(&self, quantity: Decimal) -> Option<Decimal> {
        self.price_tiers
            .iter()
            .filter(|tier| tier.quantity <= quantity)
            .max_by(|a, b| a.quantity.cmp(&b.quantity))
            .map(|tier| tier.unit_price)
    }
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    tenant_id: Option<TenantId>,
    sku: String,
    name: String,
    status: ProductStatus,
    default_uom: Option<Uom>,
    purchase_uom: Option<Uom>,
    purchasable: bool,
    offers: Vec<SupplierOffer>,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            tenant_id: None,
            sku: String::new(),
            name: String::new(),
            status: ProductStatus::Draft,
            default_uom: None,
            purchase_uom: None,
            purchasable: false,
            offers: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    pub fn default_uom(&self) -> Option<&Uom> {
        self.default_uom.as_ref()
    }

    /// The unit supplier offers (and their minimums) are expressed in.
    pub fn purchase_uom(&self) -> Option<&Uom> {
        self.purchase_uom.as_ref()
    }

    pub fn purchasable(&self) -> bool {
        self.purchasable
    }

    /// Supplier offers in configured order.
    pub fn offers(&self) -> &[SupplierOffer] {
        &self.offers
    }

    /// First offer from the given supplier, if any.
    pub fn offer_for(&self, party: PartyId) -> Option<&SupplierOffer> {
        self.offers.iter().find(|offer| offer.party == party)
    }

    /// Whether purchase lines may be created for this product.
    pub fn can_be_purchased(&self) -> bool {
        self.purchasable && self.status == ProductStatus::Active
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub default_uom: Uom,
    /// Unit purchases are negotiated in. Must share `default_uom`'s category.
    pub purchase_uom: Uom,
    pub purchasable: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ActivateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateProduct {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ArchiveProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveProduct {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddSupplierOffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSupplierOffer {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub offer: SupplierOffer,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetSupplierMinimum (change the minimum on an existing offer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSupplierMinimum {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub party: PartyId,
    pub minimum_quantity: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    ActivateProduct(ActivateProduct),
    ArchiveProduct(ArchiveProduct),
    AddSupplierOffer(AddSupplierOffer),
    SetSupplierMinimum(SetSupplierMinimum),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub default_uom: Uom,
    pub purchase_uom: Uom,
    pub purchasable: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductActivated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductArchived {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SupplierOfferAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierOfferAdded {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub offer: SupplierOffer,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SupplierMinimumSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierMinimumSet {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub party: PartyId,
    pub minimum_quantity: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    ProductActivated(ProductActivated),
    ProductArchived(ProductArchived),
    SupplierOfferAdded(SupplierOfferAdded),
    SupplierMinimumSet(SupplierMinimumSet),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "products.product.created",
            ProductEvent::ProductActivated(_) => "products.product.activated",
            ProductEvent::ProductArchived(_) => "products.product.archived",
            ProductEvent::SupplierOfferAdded(_) => "products.product.supplier_offer_added",
            ProductEvent::SupplierMinimumSet(_) => "products.product.supplier_minimum_set",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::ProductActivated(e) => e.occurred_at,
            ProductEvent::ProductArchived(e) => e.occurred_at,
            ProductEvent::SupplierOfferAdded(e) => e.occurred_at,
            ProductEvent::SupplierMinimumSet(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.tenant_id = Some(e.tenant_id);
                self.sku = e.sku.clone();
                self.name = e.name.clone();
                self.status = ProductStatus::Draft;
                self.default_uom = Some(e.default_uom.clone());
                self.purchase_uom = Some(e.purchase_uom.clone());
                self.purchasable = e.purchasable;
                self.offers.clear();
                self.created = true;
            }
            ProductEvent::ProductActivated(_) => {
                self.status = ProductStatus::Active;
            }
            ProductEvent::ProductArchived(_) => {
                self.status = ProductStatus::Archived;
            }
            ProductEvent::SupplierOfferAdded(e) => {
                self.offers.push(e.offer.clone());
            }
            ProductEvent::SupplierMinimumSet(e) => {
                if let Some(offer) = self.offers.iter_mut().find(|o| o.party == e.party) {
                    offer.minimum_quantity = e.minimum_quantity;
                }
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::ActivateProduct(cmd) => self.handle_activate(cmd),
            ProductCommand::ArchiveProduct(cmd) => self.handle_archive(cmd),
            ProductCommand::AddSupplierOffer(cmd) => self.handle_add_offer(cmd),
            ProductCommand::SetSupplierMinimum(cmd) => self.handle_set_minimum(cmd),
        }
    }
}

impl Product {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        if cmd.sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }

        // Purchases are converted back into stock kept in the default unit.
        if !cmd.purchase_uom.compatible_with(&cmd.default_uom) {
            return Err(DomainError::validation(
                "purchase unit must share the default unit's category",
            ));
        }

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            sku: cmd.sku.clone(),
            name: cmd.name.clone(),
            default_uom: cmd.default_uom.clone(),
            purchase_uom: cmd.purchase_uom.clone(),
            purchasable: cmd.purchasable,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_activate(&self, cmd: &ActivateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_product_id(cmd.product_id)?;

        if self.status == ProductStatus::Active {
            return Err(DomainError::conflict("product is already active"));
        }

        if self.status == ProductStatus::Archived {
            return Err(DomainError::invariant(
                "archived products cannot be activated",
            ));
        }

        Ok(vec![ProductEvent::ProductActivated(ProductActivated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_archive(&self, cmd: &ArchiveProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_product_id(cmd.product_id)?;

        if self.status == ProductStatus::Archived {
            return Err(DomainError::conflict("product is already archived"));
        }

        Ok(vec![ProductEvent::ProductArchived(ProductArchived {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_offer(&self, cmd: &AddSupplierOffer) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_product_id(cmd.product_id)?;

        if !self.purchasable {
            return Err(DomainError::invariant(
                "cannot add supplier offers to a non-purchasable product",
            ));
        }

        cmd.offer.validate()?;

        if self.offer_for(cmd.offer.party).is_some() {
            return Err(DomainError::conflict(
                "supplier already has an offer for this product",
            ));
        }

        Ok(vec![ProductEvent::SupplierOfferAdded(SupplierOfferAdded {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            offer: cmd.offer.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_minimum(
        &self,
        cmd: &SetSupplierMinimum,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_product_id(cmd.product_id)?;

        if let Some(min) = cmd.minimum_quantity {
            if min < Decimal::ZERO {
                return Err(DomainError::validation(
                    "minimum quantity cannot be negative",
                ));
            }
        }

        if self.offer_for(cmd.party).is_none() {
            return Err(DomainError::validation(
                "supplier has no offer for this product",
            ));
        }

        Ok(vec![ProductEvent::SupplierMinimumSet(SupplierMinimumSet {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            party: cmd.party,
            minimum_quantity: cmd.minimum_quantity,
            occurred_at: cmd.occurred_at,
        })])
    }
}
