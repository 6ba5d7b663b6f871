//! Infrastructure layer: relational persistence and the catalog stores.
//!
//! - [`db`]: the `Database` / `UnitOfWork` boundary with in-memory and
//!   Postgres backends
//! - [`store`]: `CategoryStore` and `ProductStore`, the operations the HTTP
//!   layer calls

pub mod db;
pub mod store;
