//! Catalog domain module.
//!
//! This crate contains the catalog records (products, brands, categories,
//! reviews, wishlist entries) and the read-side rules built on them: the
//! filtered/paginated listing pipeline, slug and name lookups, and the
//! visibility cascade. Pure logic only (no IO, no HTTP, no storage).

pub mod brand;
pub mod category;
pub mod listing;
pub mod lookup;
pub mod product;
pub mod review;
pub mod slug;
pub mod visibility;
pub mod wishlist;

pub use brand::{Brand, BrandSummary, NewBrand};
pub use category::{Category, NewCategory};
pub use listing::{
    run_listing, CatalogSnapshot, ListedProduct, ListingPage, ListingQuery, PriceRange,
    ReviewStats, SortDirection, SortField, SortOrder, PAGE_SIZE,
};
pub use lookup::{brand_listing, product_by_slug, search_by_name, BrandListing, SearchHit};
pub use product::{NewProduct, Product, ProductView};
pub use review::{Review, ReviewStatus};
pub use slug::slugify;
pub use wishlist::WishlistEntry;
