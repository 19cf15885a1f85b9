//! Filtered, paginated catalog listing.
//!
//! The listing is built as a chain of explicit stages, each a plain function
//! over in-memory records so it can be tested on its own:
//!
//! 1. [`join::join_brands`]: attach the brand, drop products without an active brand
//! 2. [`join::attach_review_stats`]: total/average rating per product, from
//!    stats the store aggregated per product
//! 3. [`filter::ListingFilter`]: active flag, price range, minimum rating
//! 4. [`filter::restrict_to_category`]: category membership (unknown category → nothing)
//! 5. [`join::annotate_wishlist`]: per-viewer `isLiked`
//! 6. [`paginate::paginate`]: count, sort, skip/take
//!
//! [`run_listing`] wires them together in that order.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{ProductId, UserId};

use crate::{Brand, Category, Product, ProductView, WishlistEntry};

pub mod filter;
pub mod join;
pub mod paginate;

pub use filter::ListingFilter;
pub use join::ReviewStats;

/// Number of products per listing page.
pub const PAGE_SIZE: usize = 8;

/// Inclusive price bounds. Only constructed when both bounds are given.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    /// A range exists only when both bounds are present; a single bound means
    /// "no price filter".
    pub fn from_bounds(min: Option<Decimal>, max: Option<Decimal>) -> Option<Self> {
        match (min, max) {
            (Some(min), Some(max)) => Some(Self { min, max }),
            _ => None,
        }
    }

    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Fields a listing can be sorted on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Price,
    Created,
    Name,
    AverageRating,
    TotalReviews,
}

impl SortField {
    /// Parse the wire name of a sortable field.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "price" => Some(Self::Price),
            "created" => Some(Self::Created),
            "name" => Some(Self::Name),
            "averageRating" => Some(Self::AverageRating),
            "totalReviews" => Some(Self::TotalReviews),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `1` is ascending, `-1` descending.
    pub fn from_sign(sign: i64) -> Option<Self> {
        match sign {
            1 => Some(Self::Ascending),
            -1 => Some(Self::Descending),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

impl Default for SortOrder {
    /// Newest first.
    fn default() -> Self {
        Self::new(SortField::Created, SortDirection::Descending)
    }
}

/// Validated listing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    /// Sort keys in priority order. Empty means newest first.
    pub sort: Vec<SortOrder>,
    pub min_rating: f64,
    pub price: Option<PriceRange>,
    /// Category slug.
    pub category: Option<String>,
    /// 1-based page number; values below 1 are treated as 1.
    pub page: u32,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            sort: vec![SortOrder::default()],
            min_rating: 0.0,
            price: None,
            category: None,
            page: 1,
        }
    }
}

/// Records a listing is computed over.
///
/// Storage backends load this (possibly pre-narrowed, e.g. only active
/// products of the requested category) and the stages do the rest.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub brands: Vec<Brand>,
    /// Review aggregates keyed by product; products without reviews are absent.
    pub review_stats: HashMap<ProductId, ReviewStats>,
    pub categories: Vec<Category>,
    pub viewer: Option<UserId>,
    pub wishlist: Vec<WishlistEntry>,
}

/// One product in a listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedProduct {
    #[serde(flatten)]
    pub product: ProductView,
    pub total_ratings: f64,
    pub total_reviews: u64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub products: Vec<ListedProduct>,
    pub page: u32,
    pub pages_count: u64,
    pub products_in_total: u64,
}

/// Run the full listing pipeline.
pub fn run_listing(query: &ListingQuery, snapshot: CatalogSnapshot) -> ListingPage {
    let CatalogSnapshot {
        products,
        brands,
        review_stats,
        categories,
        viewer,
        wishlist,
    } = snapshot;

    let with_brand = join::join_brands(products, &brands);
    let listed = join::attach_review_stats(with_brand, &review_stats);

    let filter = ListingFilter::from_query(query);
    let mut listed: Vec<ListedProduct> = listed.into_iter().filter(|p| filter.matches(p)).collect();

    if let Some(slug) = query.category.as_deref() {
        let category = filter::resolve_category(slug, &categories);
        listed = filter::restrict_to_category(listed, category);
    }

    if let Some(viewer) = viewer {
        join::annotate_wishlist(&mut listed, viewer, &wishlist);
    }

    paginate::paginate(listed, &query.sort, query.page)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use storefront_core::{BrandId, CategoryId, ProductId, ReviewId, UserId, WishlistId};

    use crate::{Brand, Category, Product, Review, ReviewStatus, WishlistEntry};

    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn brand(active: bool) -> Brand {
        let id = BrandId::new();
        Brand {
            id,
            name: format!("Brand {id}"),
            slug: format!("brand-{id}"),
            description: "brand".into(),
            is_active: active,
            merchant: None,
            created: epoch(),
        }
    }

    /// Product created `n` minutes after the epoch.
    pub fn product(n: i64, price: Decimal, brand: Option<&Brand>) -> Product {
        let id = ProductId::new();
        Product {
            id,
            sku: format!("SKU-{id}"),
            name: format!("Product {n}"),
            slug: format!("product-{id}"),
            description: "product".into(),
            image_url: None,
            image_key: None,
            quantity: 10,
            price,
            taxable: true,
            is_active: true,
            brand: brand.map(|b| b.id),
            created: epoch() + Duration::minutes(n),
        }
    }

    pub fn review(product: &Product, rating: f64) -> Review {
        Review {
            id: ReviewId::new(),
            product: product.id,
            user: None,
            title: "t".into(),
            rating,
            review: "r".into(),
            is_recommended: true,
            status: ReviewStatus::Approved,
            created: epoch(),
        }
    }

    pub fn category(slug: &str, active: bool, products: &[&Product]) -> Category {
        Category {
            id: CategoryId::new(),
            name: slug.into(),
            slug: slug.into(),
            description: "category".into(),
            is_active: active,
            products: products.iter().map(|p| p.id).collect(),
            created: epoch(),
        }
    }

    pub fn like(product: &Product, user: UserId, is_liked: bool) -> WishlistEntry {
        WishlistEntry {
            id: WishlistId::new(),
            product: product.id,
            user,
            is_liked,
            updated: epoch(),
        }
    }
}
