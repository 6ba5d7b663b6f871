//! Relational schema for the catalog.
//!
//! Statements are idempotent (`IF NOT EXISTS`) so provisioning can run on
//! every start-up. Constraint names are shared with the in-memory backend so
//! both report the same violation.

pub const CATEGORY_NAME_UNIQUE: &str = "categories_name_key";
pub const PRODUCT_SKU_UNIQUE: &str = "products_sku_key";
pub const PRODUCT_PARENT_FK: &str = "products_parent_id_fkey";
pub const PRODUCT_CATEGORY_FK: &str = "products_category_id_fkey";
pub const PRODUCT_ROLE_CHECK: &str = "products_parent_fields_null";

/// DDL executed in order by `ensure_schema`.
pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(200) NOT NULL,
        description TEXT NULL,
        image_url   VARCHAR(500) NULL,
        CONSTRAINT categories_name_key UNIQUE (name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          BIGSERIAL PRIMARY KEY,
        parent_id   BIGINT NULL,
        category_id BIGINT NULL,
        name        VARCHAR(255) NOT NULL,
        description TEXT NULL,
        image_url   VARCHAR(500) NULL,
        price       NUMERIC(12, 2) NULL,
        stock       INTEGER NULL,
        sku         VARCHAR(64) NULL,
        attrs       JSONB NULL,
        is_active   BOOLEAN NOT NULL DEFAULT TRUE,
        CONSTRAINT products_sku_key UNIQUE (sku),
        CONSTRAINT products_parent_id_fkey
            FOREIGN KEY (parent_id) REFERENCES products (id),
        CONSTRAINT products_category_id_fkey
            FOREIGN KEY (category_id) REFERENCES categories (id) ON DELETE SET NULL,
        CONSTRAINT products_parent_fields_null CHECK (
            parent_id IS NOT NULL
            OR (price IS NULL AND stock IS NULL AND sku IS NULL AND attrs IS NULL)
        ),
        CONSTRAINT products_stock_non_negative CHECK (stock IS NULL OR stock >= 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_categories_name ON categories (name)",
    "CREATE INDEX IF NOT EXISTS ix_products_name ON products (name)",
    "CREATE INDEX IF NOT EXISTS ix_products_parent_id ON products (parent_id)",
];
