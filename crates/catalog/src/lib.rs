//! Catalog domain module.
//!
//! This crate contains the business rules for categories and the product
//! parent/variant hierarchy, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage). Stores in `warehouse-infra` orchestrate these
//! types against a persistence backend.

pub mod category;
pub mod patch;
pub mod product;
pub mod validation;

pub use category::{Category, CategoryPatch, NewCategory};
pub use patch::{ProductChanges, ProductPatch};
pub use product::{
    Attrs, NewParent, NewProductRow, NewVariant, Parent, ParentWithVariants, Price, Product,
    ProductRow, Sku, Stock, Variant,
};
