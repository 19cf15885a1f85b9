//! Persistence for catalog, carts, orders and contact messages.
//!
//! Two backends implement every trait: [`InMemoryStore`] for tests and local
//! runs, [`PostgresStore`] for deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_catalog::{Brand, CatalogSnapshot, Category, Product, Review, WishlistEntry};
use storefront_core::{
    BrandId, CartId, CategoryId, ContactId, DomainError, LineItemId, OrderId, ProductId, UserId,
};
use storefront_sales::{Cart, Order, StockAdjustment};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Conflict(msg) => StoreError::Conflict(msg),
            DomainError::NotFound(msg) => StoreError::NotFound(msg),
            other => StoreError::Corrupt(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A message sent through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created: DateTime<Utc>,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Records a listing runs over: active products (only members of the
    /// active `category` when a slug is given), active brands, review
    /// aggregates for those products, and the viewer's wishlist.
    async fn listing_snapshot(
        &self,
        viewer: Option<UserId>,
        category: Option<&str>,
    ) -> StoreResult<CatalogSnapshot>;

    async fn products(&self) -> StoreResult<Vec<Product>>;
    async fn brands(&self) -> StoreResult<Vec<Brand>>;
    async fn categories(&self) -> StoreResult<Vec<Category>>;
    async fn wishlist_of(&self, user: UserId) -> StoreResult<Vec<WishlistEntry>>;

    /// Fails with [`StoreError::Conflict`] on a duplicate sku or slug.
    async fn insert_product(&self, product: Product) -> StoreResult<()>;
    async fn insert_brand(&self, brand: Brand) -> StoreResult<()>;
    async fn insert_category(&self, category: Category) -> StoreResult<()>;
    async fn insert_review(&self, review: Review) -> StoreResult<()>;
    /// One entry per (user, product); a later mark replaces the earlier one.
    async fn upsert_wishlist(&self, entry: WishlistEntry) -> StoreResult<()>;

    async fn brand(&self, id: BrandId) -> StoreResult<Option<Brand>>;
    async fn category(&self, id: CategoryId) -> StoreResult<Option<Category>>;

    async fn set_brand_active(&self, id: BrandId, active: bool) -> StoreResult<Brand>;
    async fn set_category_active(&self, id: CategoryId, active: bool) -> StoreResult<Category>;
    async fn deactivate_products(&self, ids: &[ProductId]) -> StoreResult<()>;

    /// Apply stock deltas. Unknown products are skipped.
    async fn adjust_stock(&self, adjustments: &[StockAdjustment]) -> StoreResult<()>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn insert_cart(&self, cart: Cart) -> StoreResult<()>;
    async fn cart(&self, id: CartId) -> StoreResult<Option<Cart>>;
    async fn cart_with_item(&self, item: LineItemId) -> StoreResult<Option<Cart>>;
    /// Replace a stored cart. Fails with [`StoreError::NotFound`] if it is gone.
    async fn save_cart(&self, cart: Cart) -> StoreResult<()>;
    /// Returns whether a cart was removed.
    async fn delete_cart(&self, id: CartId) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: Order) -> StoreResult<()>;
    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;
    /// All orders, or only `user`'s when given.
    async fn orders(&self, user: Option<UserId>) -> StoreResult<Vec<Order>>;
    async fn delete_order(&self, id: OrderId) -> StoreResult<bool>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_contact(&self, contact: Contact) -> StoreResult<()>;
}
