use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use warehouse_catalog::{
    Attrs, Category, CategoryPatch, NewCategory, NewParent, NewVariant, Parent, ParentWithVariants,
    Price, ProductPatch, Sku, Stock, Variant,
};
use warehouse_core::{CategoryId, DomainResult, ProductId};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_sku(raw: Option<&str>) -> DomainResult<Option<Sku>> {
    match raw {
        Some(raw) => Sku::parse(raw),
        None => Ok(None),
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl From<CreateCategoryRequest> for NewCategory {
    fn from(body: CreateCategoryRequest) -> Self {
        NewCategory {
            name: body.name,
            description: body.description,
            image_url: body.image_url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

impl From<UpdateCategoryRequest> for CategoryPatch {
    fn from(body: UpdateCategoryRequest) -> Self {
        CategoryPatch {
            name: body.name,
            description: body.description,
            image_url: body.image_url,
        }
    }
}

/// Unknown keys (e.g. `price` sent to a parent) are collected in `ignored`
/// and dropped.
#[derive(Debug, Deserialize)]
pub struct CreateParentRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    #[serde(flatten)]
    pub ignored: serde_json::Map<String, serde_json::Value>,
}

impl CreateParentRequest {
    /// Returns the domain input and the names of the dropped keys.
    pub fn into_domain(self) -> (NewParent, Vec<String>) {
        let input = NewParent {
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            category_id: self.category_id,
        };
        (input, self.ignored.into_iter().map(|(k, _)| k).collect())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVariantRequest {
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub attrs: Option<Attrs>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub ignored: serde_json::Map<String, serde_json::Value>,
}

fn default_active() -> bool {
    true
}

impl CreateVariantRequest {
    /// Returns the domain input and the names of the dropped keys.
    pub fn into_domain(self) -> DomainResult<(NewVariant, Vec<String>)> {
        let mut input = NewVariant::new(self.name, Price::new(self.price)?, Stock::new(self.stock)?);
        input.sku = parse_sku(self.sku.as_deref())?;
        input.image_url = self.image_url;
        input.attrs = self.attrs;
        input.is_active = self.is_active;
        Ok((input, self.ignored.into_iter().map(|(k, _)| k).collect()))
    }
}

/// PATCH body shared by parents and variants; the store narrows it to the
/// target role. `null` on `name`, `price`, `stock` or `is_active` counts as
/// "not supplied" since those columns are never NULL.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<ProductId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<CategoryId>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub sku: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub attrs: Option<Option<Attrs>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UpdateProductRequest {
    pub fn into_patch(self) -> DomainResult<ProductPatch> {
        Ok(ProductPatch {
            parent_id: self.parent_id,
            category_id: self.category_id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            price: self.price.map(Price::new).transpose()?,
            stock: self.stock.map(Stock::new).transpose()?,
            sku: self.sku.map(|sku| parse_sku(sku.as_deref())).transpose()?,
            attrs: self.attrs,
            is_active: self.is_active,
        })
    }
}

// -------------------------
// Response views
// -------------------------

#[derive(Debug, Serialize)]
pub struct CategoryOut {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl From<Category> for CategoryOut {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            image_url: c.image_url,
        }
    }
}

/// `parent_id` is always `null`; it is kept so clients can tell the roles apart.
#[derive(Debug, Serialize)]
pub struct ParentOut {
    pub id: ProductId,
    pub parent_id: Option<ProductId>,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl From<Parent> for ParentOut {
    fn from(p: Parent) -> Self {
        Self {
            id: p.id,
            parent_id: None,
            category_id: p.category_id,
            name: p.name,
            description: p.description,
            image_url: p.image_url,
            is_active: p.is_active,
        }
    }
}

/// Price is serialized as a decimal string (`"59.99"`).
#[derive(Debug, Serialize)]
pub struct VariantOut {
    pub id: ProductId,
    pub parent_id: ProductId,
    pub name: String,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub attrs: Option<Attrs>,
    pub is_active: bool,
}

impl From<Variant> for VariantOut {
    fn from(v: Variant) -> Self {
        Self {
            id: v.id,
            parent_id: v.parent_id,
            name: v.name,
            price: v.price,
            stock: v.stock,
            sku: v.sku,
            image_url: v.image_url,
            attrs: v.attrs,
            is_active: v.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ParentWithVariantsOut {
    #[serde(flatten)]
    pub parent: ParentOut,
    pub variants: Vec<VariantOut>,
}

impl From<ParentWithVariants> for ParentWithVariantsOut {
    fn from(pv: ParentWithVariants) -> Self {
        Self {
            parent: pv.parent.into(),
            variants: pv.variants.into_iter().map(VariantOut::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let body: UpdateProductRequest =
            serde_json::from_value(json!({"description": null, "sku": "  "})).unwrap();
        let patch = body.into_patch().unwrap();

        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.image_url, None);
        assert_eq!(patch.sku, Some(None));
        assert_eq!(patch.name, None);
    }

    #[test]
    fn null_price_counts_as_not_supplied() {
        let body: UpdateProductRequest = serde_json::from_value(json!({"price": null})).unwrap();
        assert_eq!(body.into_patch().unwrap().price, None);
    }

    #[test]
    fn patch_rejects_out_of_range_values() {
        let body: UpdateProductRequest = serde_json::from_value(json!({"stock": -1})).unwrap();
        assert!(body.into_patch().is_err());

        let body: UpdateProductRequest = serde_json::from_value(json!({"price": "1.234"})).unwrap();
        assert!(body.into_patch().is_err());
    }

    #[test]
    fn create_parent_collects_ignored_keys() {
        let body: CreateParentRequest = serde_json::from_value(json!({
            "name": "Sneaker X",
            "price": "10.00",
            "sku": "P-1",
        }))
        .unwrap();
        let (input, mut dropped) = body.into_domain();
        dropped.sort();

        assert_eq!(input.name, "Sneaker X");
        assert_eq!(dropped, vec!["price".to_string(), "sku".to_string()]);
    }

    #[test]
    fn create_variant_accepts_numeric_and_string_prices() {
        for price in [json!(59.99), json!("59.99")] {
            let body: CreateVariantRequest = serde_json::from_value(json!({
                "name": "Red - 42",
                "price": price,
                "stock": 5,
            }))
            .unwrap();
            let (input, dropped) = body.into_domain().unwrap();
            assert_eq!(input.price.amount().to_string(), "59.99");
            assert!(input.is_active);
            assert!(dropped.is_empty());
        }
    }

    #[test]
    fn variant_view_serializes_price_as_string() {
        let view = VariantOut {
            id: ProductId::new(2),
            parent_id: ProductId::new(1),
            name: "Red - 42".to_string(),
            price: Some(Decimal::new(5999, 2)),
            stock: Some(5),
            sku: None,
            image_url: None,
            attrs: None,
            is_active: true,
        };
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["price"], json!("59.99"));
        assert_eq!(json["parent_id"], json!(1));
    }
}
