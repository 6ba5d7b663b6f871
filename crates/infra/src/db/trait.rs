use std::sync::Arc;

use warehouse_catalog::{Category, CategoryPatch, NewCategory, NewProductRow, ProductChanges, ProductRow};
use warehouse_core::{CategoryId, ProductId, StorageError};

/// Row predicate for product queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductFilter {
    /// Rows with `parent_id IS NULL`.
    Parents,
    /// Rows with `parent_id IS NOT NULL`.
    Variants,
    /// Variants bound to the given parent.
    VariantsOf(ProductId),
    /// Rows holding `sku`, optionally ignoring one row (the row being updated).
    Sku {
        sku: String,
        excluding: Option<ProductId>,
    },
}

/// Result ordering by id.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdOrder {
    Ascending,
    Descending,
}

/// One transactional scope against the backing store.
///
/// Writes become visible to other units of work only after [`commit`]. Dropping
/// a unit of work without committing discards its writes.
///
/// Backends must:
/// - signal unique constraint violations (category name, product SKU) as
///   [`StorageError::UniqueViolation`]
/// - signal references to missing rows (category, parent) as
///   [`StorageError::ForeignKeyViolation`]
/// - never cascade a product delete on their own
///
/// [`commit`]: UnitOfWork::commit
#[async_trait::async_trait]
pub trait UnitOfWork: Send {
    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>, StorageError>;

    /// All categories, newest first.
    async fn list_categories(&mut self) -> Result<Vec<Category>, StorageError>;

    async fn insert_category(&mut self, input: &NewCategory) -> Result<Category, StorageError>;

    /// Returns the number of rows updated (0 when the id is absent).
    async fn update_category(
        &mut self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<u64, StorageError>;

    /// Returns the number of rows deleted. Products referencing the category
    /// keep existing with `category_id = NULL`.
    async fn delete_category(&mut self, id: CategoryId) -> Result<u64, StorageError>;

    async fn get_product(&mut self, id: ProductId) -> Result<Option<ProductRow>, StorageError>;

    async fn query_products(
        &mut self,
        filter: &ProductFilter,
        order: IdOrder,
    ) -> Result<Vec<ProductRow>, StorageError>;

    async fn insert_product(&mut self, row: &NewProductRow) -> Result<ProductRow, StorageError>;

    /// Returns the number of rows updated (0 when the id is absent).
    async fn update_product(
        &mut self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<u64, StorageError>;

    /// Returns the number of rows deleted. Fails with a foreign key violation
    /// while variants still reference the row.
    async fn delete_product(&mut self, id: ProductId) -> Result<u64, StorageError>;

    /// Deletes every variant of `parent_id`; returns how many were removed.
    async fn delete_variants_of(&mut self, parent_id: ProductId) -> Result<u64, StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

/// Relational persistence boundary used by the catalog stores.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    /// Open a new unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError>;

    /// Create tables, constraints and indexes when absent (idempotent).
    async fn ensure_schema(&self) -> Result<(), StorageError>;
}

#[async_trait::async_trait]
impl<D> Database for Arc<D>
where
    D: Database + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        (**self).begin().await
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        (**self).ensure_schema().await
    }
}
