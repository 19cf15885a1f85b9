use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{BrandId, DomainError, DomainResult, Entity, ProductId};

use crate::brand::BrandSummary;
use crate::slug::slugify;

/// Catalog product record.
///
/// `sku` and `slug` are unique across the catalog. The slug is derived from the
/// name when the product is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
    /// Units in stock. May go negative: cart creation does not check stock.
    pub quantity: i64,
    pub price: Decimal,
    pub taxable: bool,
    pub is_active: bool,
    pub brand: Option<BrandId>,
    pub created: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

impl Product {
    /// Returns which unique field (if any) this product shares with `other`.
    pub fn unique_conflict(&self, other: &Product) -> Option<&'static str> {
        if self.id == other.id {
            return None;
        }
        if self.sku == other.sku {
            return Some("sku");
        }
        if self.slug == other.slug {
            return Some("slug");
        }
        None
    }

    /// Check a candidate against the existing catalog before insertion.
    pub fn ensure_unique<'a>(&self, existing: impl IntoIterator<Item = &'a Product>) -> DomainResult<()> {
        for other in existing {
            if let Some(field) = self.unique_conflict(other) {
                return Err(DomainError::conflict(format!(
                    "a product with this {field} already exists"
                )));
            }
        }
        Ok(())
    }
}

/// Input for creating a product (merchant/admin catalog management).
///
/// Everything is optional at the wire level; [`NewProduct::into_product`]
/// enforces which fields are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
    pub taxable: Option<bool>,
    pub is_active: Option<bool>,
    pub brand: Option<BrandId>,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewProduct {
    /// Validate the input and build the product record.
    pub fn into_product(self, id: ProductId, created: DateTime<Utc>) -> DomainResult<Product> {
        let sku = non_blank(self.sku).ok_or_else(|| DomainError::validation("sku is required"))?;

        let (name, description) = match (non_blank(self.name), non_blank(self.description)) {
            (Some(n), Some(d)) => (n, d),
            _ => return Err(DomainError::validation("name and description are required")),
        };

        let quantity = self
            .quantity
            .ok_or_else(|| DomainError::validation("quantity is required"))?;

        let price = self
            .price
            .ok_or_else(|| DomainError::validation("price is required"))?;
        if price.is_sign_negative() {
            return Err(DomainError::validation("price cannot be negative"));
        }

        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(DomainError::validation("name must contain letters or digits"));
        }

        Ok(Product {
            id,
            sku,
            slug,
            name,
            description,
            image_url: self.image_url,
            image_key: self.image_key,
            quantity,
            price,
            taxable: self.taxable.unwrap_or(false),
            is_active: self.is_active.unwrap_or(true),
            brand: self.brand,
            created,
        })
    }
}

/// Product as presented to shoppers: the record plus its brand summary and,
/// for an authenticated viewer, whether they liked it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub quantity: i64,
    pub taxable: bool,
    pub is_active: bool,
    pub created: DateTime<Utc>,
    pub brand: Option<BrandSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

impl ProductView {
    pub fn new(product: Product, brand: Option<BrandSummary>) -> Self {
        Self {
            id: product.id,
            sku: product.sku,
            name: product.name,
            slug: product.slug,
            description: product.description,
            image_url: product.image_url,
            price: product.price,
            quantity: product.quantity,
            taxable: product.taxable,
            is_active: product.is_active,
            created: product.created,
            brand,
            is_liked: None,
        }
    }
}
