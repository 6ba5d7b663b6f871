//! Parent/variant hierarchy operations.
//!
//! Role rules enforced here, on top of what the schema enforces:
//! - parent operations only ever touch rows with `parent_id IS NULL`, variant
//!   operations only rows with a parent; the wrong role reads as `NotFound`
//! - updates are narrowed to the role's allow-list before reaching storage
//! - SKUs are pre-checked, and a unique violation raised by storage anyway
//!   (concurrent writer) is reported the same way
//! - deleting a parent removes its variants first, in the same unit of work

use tracing::instrument;

use warehouse_catalog::{
    NewParent, NewProductRow, NewVariant, Parent, ParentWithVariants, ProductPatch, ProductRow,
    Variant,
};
use warehouse_core::{CategoryId, DomainError, DomainResult, Entity, ProductId};

use super::{finish, reference_as_validation, unique_as_conflict};
use crate::db::{Database, IdOrder, ProductFilter, UnitOfWork};

/// Operations over the product hierarchy.
#[derive(Debug, Clone)]
pub struct ProductStore<D> {
    db: D,
}

impl<D: Database> ProductStore<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    /// Variant-only fields are never set on a parent; the row starts active.
    #[instrument(skip(self, input), fields(name = %input.name), err(level = "debug"))]
    pub async fn create_parent(&self, input: NewParent) -> DomainResult<Parent> {
        input.validate()?;
        let mut uow = self.db.begin().await?;
        let result = create_parent_in(uow.as_mut(), input).await;
        let parent = finish(uow, result).await?;
        tracing::info!(product_id = %parent.id(), "parent created");
        Ok(parent)
    }

    /// All parents, newest first.
    pub async fn list_parents(&self) -> DomainResult<Vec<Parent>> {
        let mut uow = self.db.begin().await?;
        let result = uow
            .query_products(&ProductFilter::Parents, IdOrder::Descending)
            .await
            .map(|rows| rows.into_iter().filter_map(ProductRow::into_parent).collect())
            .map_err(DomainError::from);
        finish(uow, result).await
    }

    /// The parent and its variants in ascending id order.
    #[instrument(skip(self), err(level = "debug"))]
    pub async fn get_parent_with_variants(&self, id: ProductId) -> DomainResult<ParentWithVariants> {
        let mut uow = self.db.begin().await?;
        let result = parent_with_variants_in(uow.as_mut(), id).await;
        finish(uow, result).await
    }

    #[instrument(skip(self, patch), err(level = "debug"))]
    pub async fn update_parent(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Parent> {
        patch.validate()?;
        let mut uow = self.db.begin().await?;
        let result = update_parent_in(uow.as_mut(), id, patch).await;
        finish(uow, result).await
    }

    /// Deletes every variant of the parent, then the parent. Returns how many
    /// variants were removed.
    #[instrument(skip(self), err(level = "debug"))]
    pub async fn delete_parent(&self, id: ProductId) -> DomainResult<u64> {
        let mut uow = self.db.begin().await?;
        let result = delete_parent_in(uow.as_mut(), id).await;
        let variants_deleted = finish(uow, result).await?;
        tracing::info!(product_id = %id, variants_deleted, "parent deleted");
        Ok(variants_deleted)
    }

    /// Fails `NotFound` unless `parent_id` is a parent, `Conflict` when the SKU is taken.
    #[instrument(skip(self, input), fields(name = %input.name), err(level = "debug"))]
    pub async fn create_variant(&self, parent_id: ProductId, input: NewVariant) -> DomainResult<Variant> {
        input.validate()?;
        let mut uow = self.db.begin().await?;
        let result = create_variant_in(uow.as_mut(), parent_id, input).await;
        let variant = finish(uow, result).await?;
        tracing::info!(product_id = %variant.id(), parent_id = %parent_id, "variant created");
        Ok(variant)
    }

    /// All variants across parents, newest first.
    pub async fn list_variants(&self) -> DomainResult<Vec<Variant>> {
        let mut uow = self.db.begin().await?;
        let result = uow
            .query_products(&ProductFilter::Variants, IdOrder::Descending)
            .await
            .map(|rows| rows.into_iter().filter_map(ProductRow::into_variant).collect())
            .map_err(DomainError::from);
        finish(uow, result).await
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn get_variant(&self, id: ProductId) -> DomainResult<Variant> {
        let mut uow = self.db.begin().await?;
        let result = load_variant(uow.as_mut(), id).await;
        finish(uow, result).await
    }

    #[instrument(skip(self, patch), err(level = "debug"))]
    pub async fn update_variant(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Variant> {
        patch.validate()?;
        let mut uow = self.db.begin().await?;
        let result = update_variant_in(uow.as_mut(), id, patch).await;
        finish(uow, result).await
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn delete_variant(&self, id: ProductId) -> DomainResult<()> {
        let mut uow = self.db.begin().await?;
        let result = delete_variant_in(uow.as_mut(), id).await;
        finish(uow, result).await?;
        tracing::info!(product_id = %id, "variant deleted");
        Ok(())
    }
}

fn parent_not_found(id: ProductId) -> DomainError {
    DomainError::not_found(format!("parent {id}"))
}

fn variant_not_found(id: ProductId) -> DomainError {
    DomainError::not_found(format!("variant {id}"))
}

fn sku_taken(sku: &str) -> DomainError {
    DomainError::conflict(format!("sku '{sku}' already exists"))
}

async fn load_parent(uow: &mut dyn UnitOfWork, id: ProductId) -> DomainResult<Parent> {
    uow.get_product(id)
        .await?
        .and_then(ProductRow::into_parent)
        .ok_or_else(|| parent_not_found(id))
}

async fn load_variant(uow: &mut dyn UnitOfWork, id: ProductId) -> DomainResult<Variant> {
    uow.get_product(id)
        .await?
        .and_then(ProductRow::into_variant)
        .ok_or_else(|| variant_not_found(id))
}

async fn ensure_category_exists(uow: &mut dyn UnitOfWork, id: CategoryId) -> DomainResult<()> {
    match uow.get_category(id).await? {
        Some(_) => Ok(()),
        None => Err(DomainError::validation(format!("category {id} does not exist"))),
    }
}

/// Pre-check: is `sku` held by a row other than `owner`?
async fn ensure_sku_free(
    uow: &mut dyn UnitOfWork,
    sku: &str,
    owner: Option<ProductId>,
) -> DomainResult<()> {
    let filter = ProductFilter::Sku {
        sku: sku.to_string(),
        excluding: owner,
    };
    if uow.query_products(&filter, IdOrder::Ascending).await?.is_empty() {
        Ok(())
    } else {
        Err(sku_taken(sku))
    }
}

async fn create_parent_in(uow: &mut dyn UnitOfWork, input: NewParent) -> DomainResult<Parent> {
    let category_id = input.category_id;
    if let Some(category_id) = category_id {
        ensure_category_exists(uow, category_id).await?;
    }

    let row = uow
        .insert_product(&NewProductRow::parent(input))
        .await
        .map_err(|e| {
            reference_as_validation(e, || {
                format!("category {} does not exist", display_opt(category_id))
            })
        })?;
    let id = row.id;
    row.into_parent().ok_or_else(|| parent_not_found(id))
}

async fn parent_with_variants_in(
    uow: &mut dyn UnitOfWork,
    id: ProductId,
) -> DomainResult<ParentWithVariants> {
    let parent = load_parent(uow, id).await?;
    let variants = uow
        .query_products(&ProductFilter::VariantsOf(id), IdOrder::Ascending)
        .await?
        .into_iter()
        .filter_map(ProductRow::into_variant)
        .collect();
    Ok(ParentWithVariants { parent, variants })
}

async fn update_parent_in(
    uow: &mut dyn UnitOfWork,
    id: ProductId,
    patch: ProductPatch,
) -> DomainResult<Parent> {
    let current = load_parent(uow, id).await?;

    let (changes, dropped) = patch.parent_changes();
    if !dropped.is_empty() {
        tracing::debug!(product_id = %id, ?dropped, "dropped fields not allowed on a parent");
    }
    if changes.is_empty() {
        return Ok(current);
    }

    let new_category = changes.category_id.flatten();
    if let Some(category_id) = new_category {
        ensure_category_exists(uow, category_id).await?;
    }

    let updated = uow.update_product(id, &changes).await.map_err(|e| {
        reference_as_validation(e, || {
            format!("category {} does not exist", display_opt(new_category))
        })
    })?;
    if updated == 0 {
        return Err(parent_not_found(id));
    }

    load_parent(uow, id).await
}

async fn delete_parent_in(uow: &mut dyn UnitOfWork, id: ProductId) -> DomainResult<u64> {
    load_parent(uow, id).await?;

    let variants_deleted = uow.delete_variants_of(id).await?;
    if uow.delete_product(id).await? == 0 {
        return Err(parent_not_found(id));
    }
    Ok(variants_deleted)
}

async fn create_variant_in(
    uow: &mut dyn UnitOfWork,
    parent_id: ProductId,
    input: NewVariant,
) -> DomainResult<Variant> {
    load_parent(uow, parent_id).await?;

    let sku = input.sku.as_ref().map(|s| s.as_str().to_string());
    if let Some(sku) = &sku {
        ensure_sku_free(uow, sku, None).await?;
    }

    let row = uow
        .insert_product(&NewProductRow::variant(parent_id, input))
        .await
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                return parent_not_found(parent_id);
            }
            match (&sku, e.is_unique_violation()) {
                (Some(sku), true) => sku_taken(sku),
                _ => DomainError::Storage(e),
            }
        })?;
    let id = row.id;
    row.into_variant().ok_or_else(|| variant_not_found(id))
}

async fn update_variant_in(
    uow: &mut dyn UnitOfWork,
    id: ProductId,
    patch: ProductPatch,
) -> DomainResult<Variant> {
    let current = load_variant(uow, id).await?;

    let (changes, dropped) = patch.variant_changes();
    if !dropped.is_empty() {
        tracing::debug!(product_id = %id, ?dropped, "dropped fields not allowed on a variant");
    }
    if changes.is_empty() {
        return Ok(current);
    }

    if let Some(sku) = changes.new_sku() {
        ensure_sku_free(uow, sku, Some(id)).await?;
    }

    let updated = uow
        .update_product(id, &changes)
        .await
        .map_err(|e| {
            unique_as_conflict(e, || {
                format!("sku '{}' already exists", changes.new_sku().unwrap_or_default())
            })
        })?;
    if updated == 0 {
        return Err(variant_not_found(id));
    }

    load_variant(uow, id).await
}

async fn delete_variant_in(uow: &mut dyn UnitOfWork, id: ProductId) -> DomainResult<()> {
    load_variant(uow, id).await?;
    match uow.delete_product(id).await? {
        0 => Err(variant_not_found(id)),
        _ => Ok(()),
    }
}

fn display_opt(id: Option<CategoryId>) -> String {
    id.map_or_else(|| "null".to_string(), |id| id.to_string())
}
