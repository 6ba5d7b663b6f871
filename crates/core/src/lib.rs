//! `warehouse-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the catalog and its
//! infrastructure adapters (no IO, no storage drivers).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, StorageError};
pub use id::{CategoryId, ProductId};
pub use value_object::ValueObject;
