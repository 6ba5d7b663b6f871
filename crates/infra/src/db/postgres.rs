//! Postgres-backed catalog storage.
//!
//! Every [`UnitOfWork`] wraps one SQL transaction; dropping it without
//! committing rolls the transaction back.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StorageError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StorageError |
//! |------------|----------------------|--------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (foreign key violation) | `23503` | `ForeignKeyViolation` |
//! | Database (other, incl. check `23514`) | Any other | `Backend` |
//! | PoolClosed / RowNotFound / Other | N/A | `Backend` |

use std::sync::Arc;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::instrument;

use warehouse_catalog::{
    Attrs, Category, CategoryPatch, NewCategory, NewProductRow, ProductChanges, ProductRow,
};
use warehouse_core::{CategoryId, ProductId, StorageError};

use super::r#trait::{Database, IdOrder, ProductFilter, UnitOfWork};
use super::schema;

const CATEGORY_COLUMNS: &str = "id, name, description, image_url";
const PRODUCT_COLUMNS: &str =
    "id, parent_id, category_id, name, description, image_url, price, stock, sku, attrs, is_active";

/// Postgres-backed catalog database.
///
/// Uses the SQLx connection pool, which is thread-safe; the handle is cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: Arc<PgPool>,
}

impl PostgresDatabase {
    /// Create a new PostgresDatabase with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `url`.
    #[instrument(skip(url), err)]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl Database for PostgresDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresUnitOfWork { tx }))
    }

    #[instrument(skip(self), err)]
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for statement in schema::STATEMENTS {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(statements = schema::STATEMENTS.len(), "catalog schema ensured");
        Ok(())
    }
}

struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_category", e))?;

        row.as_ref().map(decode_category).transpose()
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id DESC"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;

        rows.iter().map(decode_category).collect()
    }

    async fn insert_category(&mut self, input: &NewCategory) -> Result<Category, StorageError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO categories (name, description, image_url)
            VALUES ($1, $2, $3)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;

        decode_category(&row)
    }

    async fn update_category(
        &mut self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<u64, StorageError> {
        if patch.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE categories SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(description) = &patch.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(image_url) = &patch.image_url {
            set.push("image_url = ").push_bind_unseparated(image_url.clone());
        }
        qb.push(" WHERE id = ").push_bind(id.get());

        let result = qb
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_category", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        Ok(result.rows_affected())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<ProductRow>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;

        row.as_ref().map(decode_product).transpose()
    }

    async fn query_products(
        &mut self,
        filter: &ProductFilter,
        order: IdOrder,
    ) -> Result<Vec<ProductRow>, StorageError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE "));
        match filter {
            ProductFilter::Parents => {
                qb.push("parent_id IS NULL");
            }
            ProductFilter::Variants => {
                qb.push("parent_id IS NOT NULL");
            }
            ProductFilter::VariantsOf(parent_id) => {
                qb.push("parent_id = ").push_bind(parent_id.get());
            }
            ProductFilter::Sku { sku, excluding } => {
                qb.push("sku = ").push_bind(sku.clone());
                if let Some(id) = excluding {
                    qb.push(" AND id <> ").push_bind(id.get());
                }
            }
        }
        qb.push(match order {
            IdOrder::Ascending => " ORDER BY id ASC",
            IdOrder::Descending => " ORDER BY id DESC",
        });

        let rows = qb
            .build()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("query_products", e))?;

        rows.iter().map(decode_product).collect()
    }

    async fn insert_product(&mut self, row: &NewProductRow) -> Result<ProductRow, StorageError> {
        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO products (
                parent_id,
                category_id,
                name,
                description,
                image_url,
                price,
                stock,
                sku,
                attrs,
                is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(row.parent_id().map(ProductId::get))
        .bind(row.category_id().map(CategoryId::get))
        .bind(row.name())
        .bind(row.description())
        .bind(row.image_url())
        .bind(row.price())
        .bind(row.stock())
        .bind(row.sku())
        .bind(row.attrs().cloned().map(Json))
        .bind(row.is_active())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        decode_product(&inserted)
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<u64, StorageError> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE products SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(description) = &changes.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(image_url) = &changes.image_url {
            set.push("image_url = ").push_bind_unseparated(image_url.clone());
        }
        if let Some(category_id) = changes.category_id {
            set.push("category_id = ")
                .push_bind_unseparated(category_id.map(CategoryId::get));
        }
        if let Some(price) = changes.price {
            set.push("price = ").push_bind_unseparated(price);
        }
        if let Some(stock) = changes.stock {
            set.push("stock = ").push_bind_unseparated(stock);
        }
        if let Some(sku) = &changes.sku {
            set.push("sku = ").push_bind_unseparated(sku.clone());
        }
        if let Some(attrs) = &changes.attrs {
            set.push("attrs = ")
                .push_bind_unseparated(attrs.clone().map(Json));
        }
        if let Some(is_active) = changes.is_active {
            set.push("is_active = ").push_bind_unseparated(is_active);
        }
        qb.push(" WHERE id = ").push_bind(id.get());

        let result = qb
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_variants_of(&mut self, parent_id: ProductId) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM products WHERE parent_id = $1")
            .bind(parent_id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_variants_of", e))?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn decode_category(row: &PgRow) -> Result<Category, StorageError> {
    let decode = |e: sqlx::Error| {
        StorageError::backend("decode_category", format!("failed to deserialize category row: {e}"))
    };
    Ok(Category {
        id: CategoryId::new(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        image_url: row.try_get("image_url").map_err(decode)?,
    })
}

fn decode_product(row: &PgRow) -> Result<ProductRow, StorageError> {
    let decode = |e: sqlx::Error| {
        StorageError::backend("decode_product", format!("failed to deserialize product row: {e}"))
    };
    let parent_id: Option<i64> = row.try_get("parent_id").map_err(decode)?;
    let category_id: Option<i64> = row.try_get("category_id").map_err(decode)?;
    let attrs: Option<Json<Attrs>> = row.try_get("attrs").map_err(decode)?;

    Ok(ProductRow {
        id: ProductId::new(row.try_get("id").map_err(decode)?),
        parent_id: parent_id.map(ProductId::new),
        category_id: category_id.map(CategoryId::new),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        image_url: row.try_get("image_url").map_err(decode)?,
        price: row.try_get("price").map_err(decode)?,
        stock: row.try_get("stock").map_err(decode)?,
        sku: row.try_get("sku").map_err(decode)?,
        attrs: attrs.map(|Json(a)| a),
        is_active: row.try_get("is_active").map_err(decode)?,
    })
}

/// Map SQLx errors to StorageError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some("23505") => StorageError::UniqueViolation { constraint },
                Some("23503") => StorageError::ForeignKeyViolation { constraint },
                _ => StorageError::backend(
                    operation,
                    format!("database error: {}", db_err.message()),
                ),
            }
        }
        sqlx::Error::PoolClosed => StorageError::backend(operation, "connection pool closed"),
        sqlx::Error::RowNotFound => StorageError::backend(operation, "unexpected row not found"),
        other => StorageError::backend(operation, format!("sqlx error: {other}")),
    }
}
