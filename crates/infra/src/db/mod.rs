//! Relational persistence for the catalog.
//!
//! The stores only see the [`Database`] / [`UnitOfWork`] traits; the backends
//! are interchangeable:
//! - [`InMemoryDatabase`] for tests and local runs
//! - [`PostgresDatabase`] for deployments

pub mod in_memory;
pub mod postgres;
pub mod schema;
pub mod r#trait;

pub use in_memory::InMemoryDatabase;
pub use postgres::PostgresDatabase;
pub use r#trait::{Database, IdOrder, ProductFilter, UnitOfWork};
