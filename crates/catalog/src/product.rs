//! Product hierarchy: one storage record, two roles.
//!
//! Every product is stored as a [`ProductRow`]. A row with `parent_id = NULL`
//! is a **parent** (a non-sellable grouping container); a row with a parent is
//! a **variant** (the sellable unit carrying price, stock, SKU and attributes).
//! Callers work with the role views [`Parent`] and [`Variant`], or with the
//! tagged union [`Product`] when the role is not known up front.

use rust_decimal::Decimal;
use warehouse_core::{CategoryId, DomainError, DomainResult, Entity, ProductId, ValueObject};

use crate::validation::{self, IMAGE_URL_MAX, PRODUCT_NAME_MAX, SKU_MAX};

/// Open key/value attributes of a variant (e.g. `{"color": "red", "size": 42}`).
pub type Attrs = serde_json::Map<String, serde_json::Value>;

/// Fixed-point unit price: at most 12 digits, at most 2 of them after the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Price(Decimal);

impl Price {
    pub const MAX_DIGITS: u32 = 12;
    pub const MAX_SCALE: u32 = 2;

    pub fn new(value: Decimal) -> DomainResult<Self> {
        let normalized = value.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(DomainError::validation(format!(
                "price must have at most {} decimal places (got {value})",
                Self::MAX_SCALE
            )));
        }

        let integer_digits = Self::MAX_DIGITS - Self::MAX_SCALE;
        let limit = Decimal::from(10_i64.pow(integer_digits));
        if normalized.abs() >= limit {
            return Err(DomainError::validation(format!(
                "price must have at most {} digits in total (got {value})",
                Self::MAX_DIGITS
            )));
        }

        let mut amount = normalized;
        amount.rescale(Self::MAX_SCALE);
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for Price {}

/// Units on hand; never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stock(i32);

impl Stock {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::validation(format!(
                "stock must be greater than or equal to 0 (got {value})"
            )));
        }
        let units = i32::try_from(value)
            .map_err(|_| DomainError::validation(format!("stock is too large (got {value})")))?;
        Ok(Self(units))
    }

    pub fn units(&self) -> i32 {
        self.0
    }
}

impl ValueObject for Stock {}

/// Stock-keeping unit, unique across all product rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sku(String);

impl Sku {
    /// Parse a caller-supplied SKU. A blank value means "no SKU".
    pub fn parse(raw: &str) -> DomainResult<Option<Self>> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        validation::optional_text("sku", Some(raw), SKU_MAX)?;
        Ok(Some(Self(raw.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl ValueObject for Sku {}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage record shared by both roles.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub id: ProductId,
    pub parent_id: Option<ProductId>,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub sku: Option<String>,
    pub attrs: Option<Attrs>,
    pub is_active: bool,
}

impl ProductRow {
    pub fn is_parent(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_variant(&self) -> bool {
        self.parent_id.is_some()
    }

    /// True when a parent row carries any variant-only field.
    pub fn violates_role_partition(&self) -> bool {
        self.is_parent()
            && (self.price.is_some()
                || self.stock.is_some()
                || self.sku.is_some()
                || self.attrs.is_some())
    }

    pub fn into_parent(self) -> Option<Parent> {
        match self.into_product() {
            Product::Parent(p) => Some(p),
            Product::Variant(_) => None,
        }
    }

    pub fn into_variant(self) -> Option<Variant> {
        match self.into_product() {
            Product::Variant(v) => Some(v),
            Product::Parent(_) => None,
        }
    }

    pub fn into_product(self) -> Product {
        match self.parent_id {
            None => Product::Parent(Parent {
                id: self.id,
                category_id: self.category_id,
                name: self.name,
                description: self.description,
                image_url: self.image_url,
                is_active: self.is_active,
            }),
            Some(parent_id) => Product::Variant(Variant {
                id: self.id,
                parent_id,
                name: self.name,
                image_url: self.image_url,
                price: self.price,
                stock: self.stock,
                sku: self.sku,
                attrs: self.attrs,
                is_active: self.is_active,
            }),
        }
    }
}

impl Entity for ProductRow {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A product row in either role.
#[derive(Debug, Clone, PartialEq)]
pub enum Product {
    Parent(Parent),
    Variant(Variant),
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        row.into_product()
    }
}

/// Parent view: grouping container, never sellable on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl Entity for Parent {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Variant view: the sellable unit bound to one parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub id: ProductId,
    pub parent_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub sku: Option<String>,
    pub attrs: Option<Attrs>,
    pub is_active: bool,
}

impl Entity for Variant {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A parent with its variants eagerly loaded (ascending id).
#[derive(Debug, Clone, PartialEq)]
pub struct ParentWithVariants {
    pub parent: Parent,
    pub variants: Vec<Variant>,
}

/// Input: create a parent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewParent {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl NewParent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validation::required_text("name", &self.name, PRODUCT_NAME_MAX)?;
        validation::free_text("description", self.description.as_deref())?;
        validation::optional_text("image_url", self.image_url.as_deref(), IMAGE_URL_MAX)
    }
}

/// Input: create a variant under an existing parent.
///
/// `price` and `stock` are mandatory; holding a [`Price`] and a [`Stock`]
/// means both already passed their range checks.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVariant {
    pub name: String,
    pub price: Price,
    pub stock: Stock,
    pub sku: Option<Sku>,
    pub image_url: Option<String>,
    pub attrs: Option<Attrs>,
    pub is_active: bool,
}

impl NewVariant {
    pub fn new(name: impl Into<String>, price: Price, stock: Stock) -> Self {
        Self {
            name: name.into(),
            price,
            stock,
            sku: None,
            image_url: None,
            attrs: None,
            is_active: true,
        }
    }

    pub fn with_sku(mut self, sku: Sku) -> Self {
        self.sku = Some(sku);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        validation::required_text("name", &self.name, PRODUCT_NAME_MAX)?;
        validation::optional_text("image_url", self.image_url.as_deref(), IMAGE_URL_MAX)?;
        match &self.attrs {
            Some(attrs) => validation::attrs("attrs", attrs),
            None => Ok(()),
        }
    }
}

/// A product row ready to be inserted (id not yet assigned).
///
/// Only the two role constructors exist, so every insert goes through the
/// role's field partition.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProductRow {
    parent_id: Option<ProductId>,
    category_id: Option<CategoryId>,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    price: Option<Decimal>,
    stock: Option<i32>,
    sku: Option<String>,
    attrs: Option<Attrs>,
    is_active: bool,
}

impl NewProductRow {
    /// Parent row: variant-only fields are always NULL and the row starts active.
    pub fn parent(input: NewParent) -> Self {
        Self {
            parent_id: None,
            category_id: input.category_id,
            name: input.name,
            description: input.description,
            image_url: input.image_url,
            price: None,
            stock: None,
            sku: None,
            attrs: None,
            is_active: true,
        }
    }

    /// Variant row: category and description are parent-only and stay NULL.
    pub fn variant(parent_id: ProductId, input: NewVariant) -> Self {
        Self {
            parent_id: Some(parent_id),
            category_id: None,
            name: input.name,
            description: None,
            image_url: input.image_url,
            price: Some(input.price.amount()),
            stock: Some(input.stock.units()),
            sku: input.sku.map(Sku::into_string),
            attrs: input.attrs,
            is_active: input.is_active,
        }
    }

    pub fn parent_id(&self) -> Option<ProductId> {
        self.parent_id
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn stock(&self) -> Option<i32> {
        self.stock
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        self.attrs.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Materialize the stored row once the backend assigned an id.
    pub fn into_row(self, id: ProductId) -> ProductRow {
        ProductRow {
            id,
            parent_id: self.parent_id,
            category_id: self.category_id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            price: self.price,
            stock: self.stock,
            sku: self.sku,
            attrs: self.attrs,
            is_active: self.is_active,
        }
    }
}
