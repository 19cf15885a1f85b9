use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{BrandId, DomainError, DomainResult, Entity, MerchantId};

use crate::slug::slugify;

/// Brand record. Products of an inactive brand are hidden from shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    pub merchant: Option<MerchantId>,
    pub created: DateTime<Utc>,
}

impl Entity for Brand {
    type Id = BrandId;

    fn id(&self) -> BrandId {
        self.id
    }
}

impl Brand {
    pub fn summary(&self) -> BrandSummary {
        BrandSummary {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            is_active: self.is_active,
        }
    }
}

/// The brand fields embedded in product responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandSummary {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
}

/// Input for creating a brand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBrand {
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub is_active: Option<bool>,
    pub merchant: Option<MerchantId>,
}

impl NewBrand {
    pub fn into_brand(self, id: BrandId, created: DateTime<Utc>) -> DomainResult<Brand> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| DomainError::validation("brand name is required"))?;

        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(DomainError::validation("name must contain letters or digits"));
        }

        Ok(Brand {
            id,
            slug,
            name,
            description: self.description.trim().to_string(),
            is_active: self.is_active.unwrap_or(true),
            merchant: self.merchant,
            created,
        })
    }
}
