//! Single-product and brand lookups used by the storefront pages.

use rust_decimal::Decimal;
use serde::Serialize;

use storefront_core::{DomainError, DomainResult, UserId};

use crate::listing::{join, paginate::page_count, PAGE_SIZE};
use crate::{Brand, Product, ProductView, WishlistEntry};

/// Fetch an active product by slug; its brand must be active too.
pub fn product_by_slug(slug: &str, products: &[Product], brands: &[Brand]) -> DomainResult<ProductView> {
    let not_found = || DomainError::not_found("Product is not found");

    let product = products
        .iter()
        .find(|p| p.is_active && p.slug == slug)
        .ok_or_else(not_found)?;

    let brand = product
        .brand
        .and_then(|id| brands.iter().find(|b| b.id == id))
        .filter(|b| b.is_active)
        .ok_or_else(not_found)?;

    Ok(ProductView::new(product.clone(), Some(brand.summary())))
}

/// Search result row: just enough to render a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub price: Decimal,
}

/// Case-insensitive substring search over active product names.
pub fn search_by_name(needle: &str, products: &[Product]) -> DomainResult<Vec<SearchHit>> {
    let needle = needle.to_lowercase();
    let hits: Vec<SearchHit> = products
        .iter()
        .filter(|p| p.is_active && p.name.to_lowercase().contains(&needle))
        .map(|p| SearchHit {
            name: p.name.clone(),
            slug: p.slug.clone(),
            image_url: p.image_url.clone(),
            price: p.price,
        })
        .collect();

    if hits.is_empty() {
        return Err(DomainError::not_found("No product found"));
    }
    Ok(hits)
}

/// First page of a brand's storefront.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandListing {
    pub products: Vec<ProductView>,
    pub page: u32,
    pub pages: u64,
    pub products_in_total: u64,
}

/// Active products of the active brand with `brand_slug`, newest first.
///
/// Only the first page is returned.
pub fn brand_listing(
    brand_slug: &str,
    brands: &[Brand],
    products: &[Product],
    viewer: Option<UserId>,
    wishlist: &[WishlistEntry],
) -> DomainResult<BrandListing> {
    let brand = brands
        .iter()
        .find(|b| b.is_active && b.slug == brand_slug)
        .ok_or_else(|| DomainError::not_found(format!("cannot find the brand with slug {brand_slug}")))?;

    let mut owned: Vec<&Product> = products
        .iter()
        .filter(|p| p.is_active && p.brand == Some(brand.id))
        .collect();
    owned.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));

    let likes = viewer.map(|v| join::viewer_likes(v, wishlist));
    let total = owned.len();

    let products = owned
        .into_iter()
        .take(PAGE_SIZE)
        .map(|p| {
            let mut view = ProductView::new(p.clone(), Some(brand.summary()));
            if let Some(likes) = &likes {
                view.is_liked = Some(likes.get(&p.id).copied().unwrap_or(false));
            }
            view
        })
        .collect();

    Ok(BrandListing {
        products,
        page: 1,
        pages: page_count(total),
        products_in_total: total as u64,
    })
}
