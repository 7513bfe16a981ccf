//! End-to-end purchasing scenarios: from configured supplier offers and
//! demand requests to draft purchase orders, across the whole crate
//! surface the way a host application would drive it.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use procure_core::{Aggregate, AggregateId, TenantId};
use procure_parties::{Party, PartyCommand, PartyId, PartyKind, RegisterParty};
use procure_products::{
    AddSupplierOffer, CreateProduct, PriceTier, Product, ProductCommand, ProductId, SupplierOffer,
};
use procure_purchasing::{
    InMemoryProducts, PurchaseOrderId, PurchaseOrderStatus, PurchaseRequest, PurchaseRequestId,
    PurchaseRequestState, execute_plan, plan_purchases,
};
use procure_uom::Uom;

fn drive<A: Aggregate>(aggregate: &mut A, cmd: A::Command)
where
    A::Error: core::fmt::Debug,
{
    let events = aggregate.handle(&cmd).expect("command should succeed");
    for event in &events {
        aggregate.apply(event);
    }
}

fn register_supplier(tenant_id: TenantId) -> Party {
    let party_id = PartyId::new(AggregateId::new());
    let mut party = Party::empty(party_id);
    drive(
        &mut party,
        PartyCommand::RegisterParty(RegisterParty {
            tenant_id,
            party_id,
            kind: PartyKind::Supplier,
            name: "Supplier".to_string(),
            contact: None,
            occurred_at: Utc::now(),
        }),
    );
    party
}

fn purchasable_product(
    tenant_id: TenantId,
    supplier_id: PartyId,
    minimum: Option<Decimal>,
    unit_price: Decimal,
) -> Product {
    let product_id = ProductId::new(AggregateId::new());
    let mut product = Product::empty(product_id);
    drive(
        &mut product,
        ProductCommand::CreateProduct(CreateProduct {
            tenant_id,
            product_id,
            sku: format!("SKU-{product_id}"),
            name: "Product".to_string(),
            default_uom: Uom::unit(),
            purchase_uom: Uom::unit(),
            purchasable: true,
            occurred_at: Utc::now(),
        }),
    );
    drive(
        &mut product,
        ProductCommand::AddSupplierOffer(AddSupplierOffer {
            tenant_id,
            product_id,
            offer: SupplierOffer {
                party: supplier_id,
                minimum_quantity: minimum,
                lead_time_days: 2,
                price_tiers: vec![PriceTier {
                    quantity: dec!(0),
                    unit_price,
                }],
            },
            occurred_at: Utc::now(),
        }),
    );
    product
}

fn demand(
    tenant_id: TenantId,
    product_id: ProductId,
    supplier_id: PartyId,
    quantity: Decimal,
) -> PurchaseRequest {
    PurchaseRequest::new(
        PurchaseRequestId::new(AggregateId::new()),
        tenant_id,
        product_id,
        Some(supplier_id),
        quantity,
        Uom::unit(),
        "shipment-out",
    )
    .expect("valid request")
}

#[test]
fn demand_below_the_minimum_is_raised_to_it() {
    procure_observability::init();

    let tenant_id = TenantId::new();
    let supplier = register_supplier(tenant_id);
    assert!(supplier.can_transact());
    let supplier_id = supplier.id_typed();

    let product = purchasable_product(tenant_id, supplier_id, Some(dec!(5)), dec!(14));
    let product_id = product.id_typed();
    let mut directory = InMemoryProducts::new();
    directory.insert(product);

    // Demand of 3, below the supplier minimum of 5.
    let mut request = demand(tenant_id, product_id, supplier_id, dec!(3));
    assert_eq!(request.quantity(), dec!(3));
    assert_eq!(request.minimum_quantity(&directory), Some(dec!(5)));

    let planning = plan_purchases(&directory, std::slice::from_ref(&request)).unwrap();
    assert!(planning.unassigned.is_empty());
    assert_eq!(planning.plans.len(), 1);

    let order = execute_plan(
        &planning.plans[0],
        PurchaseOrderId::new(AggregateId::new()),
        Utc::now(),
    )
    .unwrap();

    assert_eq!(order.status(), PurchaseOrderStatus::Draft);
    assert_eq!(order.lines().len(), 1);
    let line = &order.lines()[0];
    assert_eq!(line.quantity, dec!(5));
    assert_eq!(line.minimum_quantity, Some(dec!(5)));
    assert_eq!(line.amount, dec!(70));

    request.mark_purchased().unwrap();
    assert_eq!(request.state(), PurchaseRequestState::Purchased);
}

#[test]
fn demand_above_the_minimum_is_not_inflated() {
    let tenant_id = TenantId::new();
    let supplier_id = register_supplier(tenant_id).id_typed();

    let product = purchasable_product(tenant_id, supplier_id, Some(dec!(5)), dec!(14));
    let product_id = product.id_typed();
    let mut directory = InMemoryProducts::new();
    directory.insert(product);

    // Later demand of 7 for the same product: above the minimum.
    let request = demand(tenant_id, product_id, supplier_id, dec!(7));
    assert_eq!(request.minimum_quantity(&directory), Some(dec!(5)));

    let planning = plan_purchases(&directory, std::slice::from_ref(&request)).unwrap();
    let order = execute_plan(
        &planning.plans[0],
        PurchaseOrderId::new(AggregateId::new()),
        Utc::now(),
    )
    .unwrap();

    let line = &order.lines()[0];
    assert_eq!(line.quantity, dec!(7));
    assert_eq!(line.amount, dec!(98));
}

#[test]
fn products_ordered_together_keep_their_own_minimums() {
    let tenant_id = TenantId::new();
    let supplier_id = register_supplier(tenant_id).id_typed();

    let loose = purchasable_product(tenant_id, supplier_id, Some(dec!(5)), dec!(14));
    let strict = purchasable_product(tenant_id, supplier_id, Some(dec!(12)), dec!(9));
    let loose_id = loose.id_typed();
    let strict_id = strict.id_typed();
    let mut directory = InMemoryProducts::new();
    directory.insert(loose);
    directory.insert(strict);

    let requests = vec![
        demand(tenant_id, loose_id, supplier_id, dec!(10)),
        demand(tenant_id, strict_id, supplier_id, dec!(10)),
    ];

    let planning = plan_purchases(&directory, &requests).unwrap();
    // Same supplier: one order, two lines.
    assert_eq!(planning.plans.len(), 1);
    let order = execute_plan(
        &planning.plans[0],
        PurchaseOrderId::new(AggregateId::new()),
        Utc::now(),
    )
    .unwrap();
    assert_eq!(order.lines().len(), 2);

    let loose_line = order
        .lines()
        .iter()
        .find(|line| line.product_id == loose_id)
        .unwrap();
    let strict_line = order
        .lines()
        .iter()
        .find(|line| line.product_id == strict_id)
        .unwrap();

    // Demand already exceeds the minimum of 5: untouched.
    assert_eq!(loose_line.quantity, dec!(10));
    // Minimum of 12 exceeds the demand of 10: raised.
    assert_eq!(strict_line.quantity, dec!(12));
    assert_eq!(order.total_amount(), dec!(140) + dec!(108));
}
