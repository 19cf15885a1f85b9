use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainError, DomainResult, Entity, ProductId};

use crate::slug::slugify;

/// Category record: a named set of products used as a listing filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    pub products: Vec<ProductId>,
    pub created: DateTime<Utc>,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}

impl Category {
    pub fn contains(&self, product: ProductId) -> bool {
        self.products.contains(&product)
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub products: Vec<ProductId>,
    pub is_active: Option<bool>,
}

impl NewCategory {
    pub fn into_category(self, id: CategoryId, created: DateTime<Utc>) -> DomainResult<Category> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| DomainError::validation("category name is required"))?;

        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(DomainError::validation("name must contain letters or digits"));
        }

        Ok(Category {
            id,
            slug,
            name,
            description: self.description.trim().to_string(),
            is_active: self.is_active.unwrap_or(true),
            products: self.products,
            created,
        })
    }
}
