//! Backend wrappers that inject the failure modes a healthy in-memory store
//! never produces on its own.

use warehouse_catalog::{Category, CategoryPatch, NewCategory, NewProductRow, ProductChanges, ProductRow};
use warehouse_core::{CategoryId, ProductId, StorageError};

use crate::db::{Database, IdOrder, InMemoryDatabase, ProductFilter, UnitOfWork};

/// Faults applied to every unit of work a [`FaultyDatabase`] opens.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Faults {
    /// SKU lookups see no rows, as if a concurrent insert had not committed yet.
    pub stale_sku_reads: bool,
    /// `delete_product` fails with a backend error.
    pub fail_product_delete: bool,
    /// `rollback` fails with a backend error.
    pub fail_rollback: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FaultyDatabase {
    pub inner: InMemoryDatabase,
    pub faults: Faults,
}

impl FaultyDatabase {
    pub fn new(inner: InMemoryDatabase, faults: Faults) -> Self {
        Self { inner, faults }
    }
}

#[async_trait::async_trait]
impl Database for FaultyDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyUnitOfWork {
            inner,
            faults: self.faults,
        }))
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.inner.ensure_schema().await
    }
}

struct FaultyUnitOfWork {
    inner: Box<dyn UnitOfWork>,
    faults: Faults,
}

#[async_trait::async_trait]
impl UnitOfWork for FaultyUnitOfWork {
    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        self.inner.get_category(id).await
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, StorageError> {
        self.inner.list_categories().await
    }

    async fn insert_category(&mut self, input: &NewCategory) -> Result<Category, StorageError> {
        self.inner.insert_category(input).await
    }

    async fn update_category(
        &mut self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<u64, StorageError> {
        self.inner.update_category(id, patch).await
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<u64, StorageError> {
        self.inner.delete_category(id).await
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<ProductRow>, StorageError> {
        self.inner.get_product(id).await
    }

    async fn query_products(
        &mut self,
        filter: &ProductFilter,
        order: IdOrder,
    ) -> Result<Vec<ProductRow>, StorageError> {
        if self.faults.stale_sku_reads && matches!(filter, ProductFilter::Sku { .. }) {
            return Ok(Vec::new());
        }
        self.inner.query_products(filter, order).await
    }

    async fn insert_product(&mut self, row: &NewProductRow) -> Result<ProductRow, StorageError> {
        self.inner.insert_product(row).await
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<u64, StorageError> {
        self.inner.update_product(id, changes).await
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<u64, StorageError> {
        if self.faults.fail_product_delete {
            return Err(StorageError::backend("delete_product", "connection reset"));
        }
        self.inner.delete_product(id).await
    }

    async fn delete_variants_of(&mut self, parent_id: ProductId) -> Result<u64, StorageError> {
        self.inner.delete_variants_of(parent_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        let FaultyUnitOfWork { inner, faults } = *self;
        inner.rollback().await?;
        if faults.fail_rollback {
            return Err(StorageError::backend("rollback", "connection reset"));
        }
        Ok(())
    }
}
