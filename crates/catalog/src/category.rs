use warehouse_core::{CategoryId, DomainResult, Entity};

use crate::validation::{self, CATEGORY_NAME_MAX, IMAGE_URL_MAX};

/// A flat catalog grouping with a unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input: create a category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validation::required_text("name", &self.name, CATEGORY_NAME_MAX)?;
        validation::free_text("description", self.description.as_deref())?;
        validation::optional_text("image_url", self.image_url.as_deref(), IMAGE_URL_MAX)
    }

    /// Materialize the row a backend stores for this input.
    pub fn into_category(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
        }
    }
}

/// Input: partial category update.
///
/// `None` leaves a field untouched. For nullable columns the inner option
/// distinguishes "set to a value" from "clear to NULL".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.image_url.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validation::required_text("name", name, CATEGORY_NAME_MAX)?;
        }
        if let Some(description) = &self.description {
            validation::free_text("description", description.as_deref())?;
        }
        if let Some(image_url) = &self.image_url {
            validation::optional_text("image_url", image_url.as_deref(), IMAGE_URL_MAX)?;
        }
        Ok(())
    }

    /// Apply the supplied fields to `category`, leaving the rest untouched.
    pub fn apply_to(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(description) = &self.description {
            category.description = description.clone();
        }
        if let Some(image_url) = &self.image_url {
            category.image_url = image_url.clone();
        }
    }
}
