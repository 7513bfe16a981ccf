//! Products domain module: the catalog side of purchasing.
//!
//! A product owns its supplier offers: who sells it, at what tiered
//! prices, with what lead time, and above what minimum order quantity.

pub mod product;

pub use product::{
    ActivateProduct, AddSupplierOffer, ArchiveProduct, CreateProduct, PriceTier, Product,
    ProductActivated, ProductArchived, ProductCommand, ProductCreated, ProductEvent, ProductId,
    ProductStatus, SetSupplierMinimum, SupplierMinimumSet, SupplierOffer, SupplierOfferAdded,
};
