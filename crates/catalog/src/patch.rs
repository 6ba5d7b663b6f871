//! Partial updates of product rows and the role allow-lists.
//!
//! Callers send a [`ProductPatch`] that may contain any product field. Before a
//! patch reaches storage it is narrowed to the fields the target role may
//! change, producing a [`ProductChanges`]. Out-of-role fields are dropped, not
//! rejected; the dropped field names are returned for logging.

use rust_decimal::Decimal;

use warehouse_core::{CategoryId, DomainResult, ProductId};

use crate::product::{Attrs, Price, ProductRow, Sku, Stock};
use crate::validation::{self, IMAGE_URL_MAX, PRODUCT_NAME_MAX};

/// Fields a parent update may change.
pub const PARENT_FIELDS: &[&str] = &["name", "description", "image_url", "category_id", "is_active"];

/// Fields a variant update may change.
pub const VARIANT_FIELDS: &[&str] = &["name", "image_url", "price", "stock", "sku", "attrs", "is_active"];

/// Caller-supplied partial update (superset of both roles).
///
/// `None` means "not supplied". For nullable columns the inner option
/// distinguishes "set" from "clear to NULL". `price`, `stock` and `name` are
/// never nullable, so they carry a single option.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductPatch {
    pub parent_id: Option<Option<ProductId>>,
    pub category_id: Option<Option<CategoryId>>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub price: Option<Price>,
    pub stock: Option<Stock>,
    pub sku: Option<Option<Sku>>,
    pub attrs: Option<Option<Attrs>>,
    pub is_active: Option<bool>,
}

impl ProductPatch {
    /// Names of the fields present in this patch.
    pub fn supplied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.parent_id.is_some() {
            fields.push("parent_id");
        }
        if self.category_id.is_some() {
            fields.push("category_id");
        }
        if self.name.is_some() {
            fields.push("name");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.image_url.is_some() {
            fields.push("image_url");
        }
        if self.price.is_some() {
            fields.push("price");
        }
        if self.stock.is_some() {
            fields.push("stock");
        }
        if self.sku.is_some() {
            fields.push("sku");
        }
        if self.attrs.is_some() {
            fields.push("attrs");
        }
        if self.is_active.is_some() {
            fields.push("is_active");
        }
        fields
    }

    /// Field-level checks for the values that were supplied.
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validation::required_text("name", name, PRODUCT_NAME_MAX)?;
        }
        if let Some(description) = &self.description {
            validation::free_text("description", description.as_deref())?;
        }
        if let Some(image_url) = &self.image_url {
            validation::optional_text("image_url", image_url.as_deref(), IMAGE_URL_MAX)?;
        }
        if let Some(Some(attrs)) = &self.attrs {
            validation::attrs("attrs", attrs)?;
        }
        Ok(())
    }

    /// Narrow to the parent allow-list. Returns the changes and the dropped field names.
    pub fn parent_changes(self) -> (ProductChanges, Vec<&'static str>) {
        let dropped = self.dropped(PARENT_FIELDS);
        let changes = ProductChanges {
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            category_id: self.category_id,
            is_active: self.is_active,
            ..ProductChanges::default()
        };
        (changes, dropped)
    }

    /// Narrow to the variant allow-list. Returns the changes and the dropped field names.
    pub fn variant_changes(self) -> (ProductChanges, Vec<&'static str>) {
        let dropped = self.dropped(VARIANT_FIELDS);
        let changes = ProductChanges {
            name: self.name,
            image_url: self.image_url,
            price: self.price.map(|p| p.amount()),
            stock: self.stock.map(|s| s.units()),
            sku: self.sku.map(|sku| sku.map(Sku::into_string)),
            attrs: self.attrs,
            is_active: self.is_active,
            ..ProductChanges::default()
        };
        (changes, dropped)
    }

    fn dropped(&self, allowed: &[&str]) -> Vec<&'static str> {
        self.supplied_fields()
            .into_iter()
            .filter(|field| !allowed.contains(field))
            .collect()
    }
}

/// Column-level change set handed to a backend.
///
/// Has no `parent_id`: no update path can re-parent a row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub category_id: Option<Option<CategoryId>>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub sku: Option<Option<String>>,
    pub attrs: Option<Option<Attrs>>,
    pub is_active: Option<bool>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The SKU this change set would assign, if any.
    pub fn new_sku(&self) -> Option<&str> {
        match &self.sku {
            Some(Some(sku)) => Some(sku.as_str()),
            _ => None,
        }
    }

    /// Apply the supplied columns to `row`, leaving the rest untouched.
    pub fn apply_to(&self, row: &mut ProductRow) {
        if let Some(name) = &self.name {
            row.name = name.clone();
        }
        if let Some(description) = &self.description {
            row.description = description.clone();
        }
        if let Some(image_url) = &self.image_url {
            row.image_url = image_url.clone();
        }
        if let Some(category_id) = self.category_id {
            row.category_id = category_id;
        }
        if let Some(price) = self.price {
            row.price = Some(price);
        }
        if let Some(stock) = self.stock {
            row.stock = Some(stock);
        }
        if let Some(sku) = &self.sku {
            row.sku = sku.clone();
        }
        if let Some(attrs) = &self.attrs {
            row.attrs = attrs.clone();
        }
        if let Some(is_active) = self.is_active {
            row.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn price(s: &str) -> Price {
        Price::new(Decimal::from_str(s).unwrap()).unwrap()
    }

    fn full_patch() -> ProductPatch {
        let mut attrs = Attrs::new();
        attrs.insert("size".to_string(), serde_json::json!(42));
        ProductPatch {
            parent_id: Some(Some(ProductId::new(99))),
            category_id: Some(Some(CategoryId::new(3))),
            name: Some("Renamed".to_string()),
            description: Some(Some("desc".to_string())),
            image_url: Some(None),
            price: Some(price("10.50")),
            stock: Some(Stock::new(7).unwrap()),
            sku: Some(Sku::parse("SKU-1").unwrap()),
            attrs: Some(Some(attrs)),
            is_active: Some(false),
        }
    }

    #[test]
    fn parent_changes_drop_variant_only_fields() {
        let (changes, dropped) = full_patch().parent_changes();

        assert_eq!(dropped, vec!["parent_id", "price", "stock", "sku", "attrs"]);
        assert_eq!(changes.name.as_deref(), Some("Renamed"));
        assert_eq!(changes.description, Some(Some("desc".to_string())));
        assert_eq!(changes.image_url, Some(None));
        assert_eq!(changes.category_id, Some(Some(CategoryId::new(3))));
        assert_eq!(changes.is_active, Some(false));
        assert_eq!(changes.price, None);
        assert_eq!(changes.stock, None);
        assert_eq!(changes.sku, None);
        assert_eq!(changes.attrs, None);
    }

    #[test]
    fn variant_changes_drop_parent_only_fields() {
        let (changes, dropped) = full_patch().variant_changes();

        assert_eq!(dropped, vec!["parent_id", "category_id", "description"]);
        assert_eq!(changes.category_id, None);
        assert_eq!(changes.description, None);
        assert_eq!(changes.price, Some(Decimal::from_str("10.50").unwrap()));
        assert_eq!(changes.stock, Some(7));
        assert_eq!(changes.new_sku(), Some("SKU-1"));
        assert!(changes.attrs.is_some());
    }

    #[test]
    fn blank_sku_in_patch_clears_the_column() {
        let patch = ProductPatch {
            sku: Some(Sku::parse("").unwrap()),
            ..ProductPatch::default()
        };
        let (changes, dropped) = patch.variant_changes();
        assert!(dropped.is_empty());
        assert_eq!(changes.sku, Some(None));
        assert_eq!(changes.new_sku(), None);
    }

    #[test]
    fn patch_with_only_blocked_fields_becomes_empty() {
        let patch = ProductPatch {
            price: Some(price("1.00")),
            parent_id: Some(None),
            ..ProductPatch::default()
        };
        let (changes, dropped) = patch.parent_changes();
        assert!(changes.is_empty());
        assert_eq!(dropped, vec!["parent_id", "price"]);
    }

    #[test]
    fn patch_rejects_blank_name() {
        let patch = ProductPatch {
            name: Some(" ".to_string()),
            ..ProductPatch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn patch_rejects_nul_in_description_and_attrs() {
        let description = ProductPatch {
            description: Some(Some("a\u{0}".to_string())),
            ..ProductPatch::default()
        };
        assert!(description.validate().is_err());

        let mut attrs = Attrs::new();
        attrs.insert("size\u{0}".to_string(), serde_json::json!(42));
        let attrs = ProductPatch {
            attrs: Some(Some(attrs)),
            ..ProductPatch::default()
        };
        assert!(attrs.validate().is_err());

        let clear = ProductPatch {
            description: Some(None),
            attrs: Some(None),
            ..ProductPatch::default()
        };
        assert!(clear.validate().is_ok());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_patch() -> impl Strategy<Value = ProductPatch> {
            (
                any::<bool>(),
                any::<bool>(),
                proptest::option::of("[A-Za-z][A-Za-z0-9 ]{0,20}"),
                proptest::option::of(0i64..100_000),
                proptest::option::of(0i64..1_000),
                proptest::option::of("[A-Z0-9-]{1,20}"),
                proptest::option::of(any::<bool>()),
            )
                .prop_map(|(reparent, recategorize, name, cents, stock, sku, is_active)| ProductPatch {
                    parent_id: reparent.then_some(Some(ProductId::new(1))),
                    category_id: recategorize.then_some(Some(CategoryId::new(1))),
                    name,
                    price: cents.map(|c| Price::new(Decimal::new(c, 2)).unwrap()),
                    stock: stock.map(|s| Stock::new(s).unwrap()),
                    sku: sku.map(|s| Sku::parse(&s).unwrap()),
                    is_active,
                    ..ProductPatch::default()
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: applying parent changes never gives a parent row a variant-only field.
            #[test]
            fn parent_changes_keep_role_partition(patch in arb_patch()) {
                let mut row = crate::product::NewProductRow::parent(crate::product::NewParent::new("P"))
                    .into_row(ProductId::new(1));
                let (changes, _) = patch.parent_changes();
                changes.apply_to(&mut row);

                prop_assert!(row.is_parent());
                prop_assert!(!row.violates_role_partition());
            }

            /// Property: variant changes never carry parent_id or category_id.
            #[test]
            fn variant_changes_never_touch_hierarchy(patch in arb_patch()) {
                let (changes, dropped) = patch.clone().variant_changes();
                prop_assert_eq!(changes.category_id, None);
                prop_assert_eq!(changes.description, None);
                prop_assert_eq!(dropped.contains(&"parent_id"), patch.parent_id.is_some());
                prop_assert_eq!(dropped.contains(&"category_id"), patch.category_id.is_some());
            }

            /// Property: every supplied field is either kept or dropped, never both.
            #[test]
            fn allow_lists_partition_supplied_fields(patch in arb_patch()) {
                let supplied = patch.supplied_fields();
                let (_, dropped) = patch.parent_changes();
                for field in &supplied {
                    prop_assert_ne!(PARENT_FIELDS.contains(field), dropped.contains(field));
                }
            }
        }
    }
}
