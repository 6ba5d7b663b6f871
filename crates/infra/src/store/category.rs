use tracing::instrument;

use warehouse_catalog::{Category, CategoryPatch, NewCategory};
use warehouse_core::{CategoryId, DomainError, DomainResult, Entity};

use super::{finish, unique_as_conflict};
use crate::db::{Database, UnitOfWork};

/// CRUD over categories.
#[derive(Debug, Clone)]
pub struct CategoryStore<D> {
    db: D,
}

impl<D: Database> CategoryStore<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    /// Fails `Conflict` when the name is already taken.
    #[instrument(skip(self, input), fields(name = %input.name), err(level = "debug"))]
    pub async fn create(&self, input: NewCategory) -> DomainResult<Category> {
        input.validate()?;
        let mut uow = self.db.begin().await?;
        let result = create_in(uow.as_mut(), &input).await;
        let category = finish(uow, result).await?;
        tracing::info!(category_id = %category.id(), "category created");
        Ok(category)
    }

    /// All categories, newest first.
    pub async fn list(&self) -> DomainResult<Vec<Category>> {
        let mut uow = self.db.begin().await?;
        let result = uow.list_categories().await.map_err(DomainError::from);
        finish(uow, result).await
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn get(&self, id: CategoryId) -> DomainResult<Category> {
        let mut uow = self.db.begin().await?;
        let result = load(uow.as_mut(), id).await;
        finish(uow, result).await
    }

    /// Applies only the supplied fields.
    #[instrument(skip(self, patch), err(level = "debug"))]
    pub async fn update(&self, id: CategoryId, patch: CategoryPatch) -> DomainResult<Category> {
        patch.validate()?;
        let mut uow = self.db.begin().await?;
        let result = update_in(uow.as_mut(), id, &patch).await;
        finish(uow, result).await
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, id: CategoryId) -> DomainResult<()> {
        let mut uow = self.db.begin().await?;
        let result = delete_in(uow.as_mut(), id).await;
        finish(uow, result).await?;
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}

async fn load(uow: &mut dyn UnitOfWork, id: CategoryId) -> DomainResult<Category> {
    uow.get_category(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("category {id}")))
}

async fn create_in(uow: &mut dyn UnitOfWork, input: &NewCategory) -> DomainResult<Category> {
    uow.insert_category(input)
        .await
        .map_err(|e| unique_as_conflict(e, || format!("category name '{}' already exists", input.name)))
}

async fn update_in(
    uow: &mut dyn UnitOfWork,
    id: CategoryId,
    patch: &CategoryPatch,
) -> DomainResult<Category> {
    let mut category = load(uow, id).await?;
    if patch.is_empty() {
        return Ok(category);
    }

    let updated = uow.update_category(id, patch).await.map_err(|e| {
        unique_as_conflict(e, || {
            format!(
                "category name '{}' already exists",
                patch.name.as_deref().unwrap_or_default()
            )
        })
    })?;
    if updated == 0 {
        return Err(DomainError::not_found(format!("category {id}")));
    }

    patch.apply_to(&mut category);
    Ok(category)
}

async fn delete_in(uow: &mut dyn UnitOfWork, id: CategoryId) -> DomainResult<()> {
    match uow.delete_category(id).await? {
        0 => Err(DomainError::not_found(format!("category {id}"))),
        _ => Ok(()),
    }
}
