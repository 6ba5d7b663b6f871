use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use warehouse_catalog::{Category, CategoryPatch, NewCategory, NewProductRow, ProductChanges, ProductRow};
use warehouse_core::{CategoryId, ProductId, StorageError};

use super::r#trait::{Database, IdOrder, ProductFilter, UnitOfWork};
use super::schema::{
    CATEGORY_NAME_UNIQUE, PRODUCT_CATEGORY_FK, PRODUCT_PARENT_FK, PRODUCT_ROLE_CHECK,
    PRODUCT_SKU_UNIQUE,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, ProductRow>,
    category_seq: i64,
    product_seq: i64,
}

/// In-memory relational store.
///
/// Intended for tests/dev. Emulates the Postgres schema's constraints (unique
/// category name and SKU, category/parent foreign keys, role check) so the
/// stores behave the same against either backend. Units of work are
/// serialized: each one holds the tables exclusively and edits a private copy
/// that replaces the shared state on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Database for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        let committed = self.tables.clone().lock_owned().await;
        let working = committed.clone();
        Ok(Box::new(InMemoryUnitOfWork { committed, working }))
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        tracing::debug!("in-memory backend has no schema to provision");
        Ok(())
    }
}

struct InMemoryUnitOfWork {
    committed: OwnedMutexGuard<Tables>,
    working: Tables,
}

impl InMemoryUnitOfWork {
    fn check_sku_free(&self, sku: Option<&str>, owner: Option<ProductId>) -> Result<(), StorageError> {
        let Some(sku) = sku else {
            return Ok(());
        };
        let taken = self
            .working
            .products
            .values()
            .any(|row| row.sku.as_deref() == Some(sku) && Some(row.id) != owner);
        if taken {
            return Err(StorageError::unique(PRODUCT_SKU_UNIQUE));
        }
        Ok(())
    }

    fn check_category_exists(&self, category_id: Option<CategoryId>) -> Result<(), StorageError> {
        match category_id {
            Some(id) if !self.working.categories.contains_key(&id) => {
                Err(StorageError::foreign_key(PRODUCT_CATEGORY_FK))
            }
            _ => Ok(()),
        }
    }

    fn check_role_partition(row: &ProductRow) -> Result<(), StorageError> {
        if row.violates_role_partition() {
            return Err(StorageError::backend(
                "check_constraint",
                format!("row {} violates {PRODUCT_ROLE_CHECK}", row.id),
            ));
        }
        Ok(())
    }
}

fn matches_filter(row: &ProductRow, filter: &ProductFilter) -> bool {
    match filter {
        ProductFilter::Parents => row.is_parent(),
        ProductFilter::Variants => row.is_variant(),
        ProductFilter::VariantsOf(parent_id) => row.parent_id == Some(*parent_id),
        ProductFilter::Sku { sku, excluding } => {
            row.sku.as_deref() == Some(sku.as_str()) && Some(row.id) != *excluding
        }
    }
}

#[async_trait::async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, StorageError> {
        Ok(self.working.categories.values().rev().cloned().collect())
    }

    async fn insert_category(&mut self, input: &NewCategory) -> Result<Category, StorageError> {
        if self.working.categories.values().any(|c| c.name == input.name) {
            return Err(StorageError::unique(CATEGORY_NAME_UNIQUE));
        }

        self.working.category_seq += 1;
        let id = CategoryId::new(self.working.category_seq);
        let category = input.clone().into_category(id);
        self.working.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &mut self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<u64, StorageError> {
        if let Some(name) = &patch.name {
            let taken = self
                .working
                .categories
                .values()
                .any(|c| c.name == *name && c.id != id);
            if taken {
                return Err(StorageError::unique(CATEGORY_NAME_UNIQUE));
            }
        }

        match self.working.categories.get_mut(&id) {
            Some(category) => {
                patch.apply_to(category);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<u64, StorageError> {
        if self.working.categories.remove(&id).is_none() {
            return Ok(0);
        }
        // ON DELETE SET NULL
        for row in self.working.products.values_mut() {
            if row.category_id == Some(id) {
                row.category_id = None;
            }
        }
        Ok(1)
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<ProductRow>, StorageError> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn query_products(
        &mut self,
        filter: &ProductFilter,
        order: IdOrder,
    ) -> Result<Vec<ProductRow>, StorageError> {
        let matching = self
            .working
            .products
            .values()
            .filter(|row| matches_filter(row, filter))
            .cloned();
        Ok(match order {
            IdOrder::Ascending => matching.collect(),
            IdOrder::Descending => {
                let mut rows: Vec<ProductRow> = matching.collect();
                rows.reverse();
                rows
            }
        })
    }

    async fn insert_product(&mut self, row: &NewProductRow) -> Result<ProductRow, StorageError> {
        self.check_sku_free(row.sku(), None)?;
        self.check_category_exists(row.category_id())?;
        if let Some(parent_id) = row.parent_id() {
            if !self.working.products.contains_key(&parent_id) {
                return Err(StorageError::foreign_key(PRODUCT_PARENT_FK));
            }
        }

        let id = ProductId::new(self.working.product_seq + 1);
        let stored = row.clone().into_row(id);
        Self::check_role_partition(&stored)?;

        self.working.product_seq += 1;
        self.working.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<u64, StorageError> {
        let Some(current) = self.working.products.get(&id) else {
            return Ok(0);
        };

        let mut updated = current.clone();
        changes.apply_to(&mut updated);

        self.check_sku_free(changes.new_sku(), Some(id))?;
        if let Some(category_id) = changes.category_id {
            self.check_category_exists(category_id)?;
        }
        Self::check_role_partition(&updated)?;

        self.working.products.insert(id, updated);
        Ok(1)
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<u64, StorageError> {
        let referenced = self
            .working
            .products
            .values()
            .any(|row| row.parent_id == Some(id));
        if referenced {
            return Err(StorageError::foreign_key(PRODUCT_PARENT_FK));
        }
        Ok(u64::from(self.working.products.remove(&id).is_some()))
    }

    async fn delete_variants_of(&mut self, parent_id: ProductId) -> Result<u64, StorageError> {
        let before = self.working.products.len();
        self.working
            .products
            .retain(|_, row| row.parent_id != Some(parent_id));
        Ok((before - self.working.products.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let InMemoryUnitOfWork {
            mut committed,
            working,
        } = *self;
        *committed = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}
