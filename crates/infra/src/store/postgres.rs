//! Postgres-backed store.
//!
//! Unique violations (`23505`) map to [`StoreError::Conflict`]; everything
//! else from the driver surfaces as [`StoreError::Database`].

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use storefront_catalog::{
    Brand, CatalogSnapshot, Category, Product, Review, ReviewStats, WishlistEntry,
};
use storefront_core::{
    BrandId, CartId, CategoryId, LineItemId, MerchantId, OrderId, ProductId, UserId, WishlistId,
};
use storefront_sales::{Cart, LineItem, LineItemStatus, Order, StockAdjustment};

use super::{CartStore, CatalogStore, Contact, ContactStore, OrderStore, StoreError, StoreResult};

const SCHEMA: &str = include_str!("../../migrations/0001_storefront.sql");

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create missing tables and indexes. Safe to run on every start.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    async fn load_items(&self, cart: Uuid) -> StoreResult<Vec<LineItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, quantity, purchase_price, total_price, total_tax,
                   price_with_tax, status
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(cart)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(line_item_row).collect()
    }

    async fn load_cart(&self, row: &PgRow) -> StoreResult<Cart> {
        let id: Uuid = row.try_get("id")?;
        let products = self.load_items(id).await?;
        Ok(Cart {
            id: CartId::from_uuid(id),
            user: UserId::from_uuid(row.try_get("user_id")?),
            products,
            created: row.try_get("created")?,
            updated: row.try_get("updated")?,
        })
    }
}

fn map_unique(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict(format!("a {what} with this sku or slug already exists"));
        }
    }
    StoreError::Database(err)
}

fn product_row(row: &PgRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        sku: row.try_get("sku")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        image_key: row.try_get("image_key")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
        taxable: row.try_get("taxable")?,
        is_active: row.try_get("is_active")?,
        brand: row.try_get::<Option<Uuid>, _>("brand_id")?.map(BrandId::from_uuid),
        created: row.try_get("created")?,
    })
}

fn brand_row(row: &PgRow) -> StoreResult<Brand> {
    Ok(Brand {
        id: BrandId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        merchant: row.try_get::<Option<Uuid>, _>("merchant_id")?.map(MerchantId::from_uuid),
        created: row.try_get("created")?,
    })
}

fn category_row(row: &PgRow) -> StoreResult<Category> {
    let products: Vec<Uuid> = row.try_get("product_ids")?;
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        products: products.into_iter().map(ProductId::from_uuid).collect(),
        created: row.try_get("created")?,
    })
}

fn review_stats_row(row: &PgRow) -> StoreResult<(ProductId, ReviewStats)> {
    let count: i64 = row.try_get("total_reviews")?;
    let stats = ReviewStats {
        total_ratings: row.try_get::<Option<f64>, _>("total_ratings")?.unwrap_or(0.0),
        total_reviews: u64::try_from(count)
            .map_err(|_| StoreError::Corrupt(format!("negative review count {count}")))?,
    };
    Ok((ProductId::from_uuid(row.try_get("product_id")?), stats))
}

fn wishlist_row(row: &PgRow) -> StoreResult<WishlistEntry> {
    Ok(WishlistEntry {
        id: WishlistId::from_uuid(row.try_get("id")?),
        product: ProductId::from_uuid(row.try_get("product_id")?),
        user: UserId::from_uuid(row.try_get("user_id")?),
        is_liked: row.try_get("is_liked")?,
        updated: row.try_get("updated")?,
    })
}

fn line_item_row(row: &PgRow) -> StoreResult<LineItem> {
    let status: String = row.try_get("status")?;
    Ok(LineItem {
        id: LineItemId::from_uuid(row.try_get("id")?),
        product: ProductId::from_uuid(row.try_get("product_id")?),
        quantity: row.try_get("quantity")?,
        purchase_price: row.try_get("purchase_price")?,
        total_price: row.try_get("total_price")?,
        total_tax: row.try_get("total_tax")?,
        price_with_tax: row.try_get("price_with_tax")?,
        status: LineItemStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown line item status '{status}'")))?,
    })
}

fn order_row(row: &PgRow) -> StoreResult<Order> {
    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        cart: CartId::from_uuid(row.try_get("cart_id")?),
        user: UserId::from_uuid(row.try_get("user_id")?),
        total: row.try_get("total")?,
        created: row.try_get("created")?,
    })
}

const PRODUCT_COLUMNS: &str = "id, sku, name, slug, description, image_url, image_key, quantity, \
                               price, taxable, is_active, brand_id, created";
const BRAND_COLUMNS: &str = "id, name, slug, description, is_active, merchant_id, created";
const CATEGORY_COLUMNS: &str = "id, name, slug, description, is_active, product_ids, created";

/// Active products, limited to members of the active category `$1` when it is not null.
const LISTED_PRODUCTS: &str = "p.is_active AND ($1::text IS NULL OR p.id IN \
                               (SELECT unnest(c.product_ids) FROM categories c \
                               WHERE c.is_active AND c.slug = $1))";

async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cart: CartId,
    items: &[LineItem],
) -> StoreResult<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, cart_id, position, product_id, quantity, purchase_price,
                total_price, total_tax, price_with_tax, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(cart.as_uuid())
        .bind(position as i32)
        .bind(item.product.as_uuid())
        .bind(item.quantity)
        .bind(item.purchase_price)
        .bind(item.total_price)
        .bind(item.total_tax)
        .bind(item.price_with_tax)
        .bind(item.status.as_str())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn listing_snapshot(
        &self,
        viewer: Option<UserId>,
        category: Option<&str>,
    ) -> StoreResult<CatalogSnapshot> {
        let wishlist = match viewer {
            Some(user) => self.wishlist_of(user).await?,
            None => Vec::new(),
        };

        let products = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE {LISTED_PRODUCTS}"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(product_row)
        .collect::<StoreResult<Vec<_>>>()?;

        let review_stats = sqlx::query(&format!(
            r#"
            SELECT r.product_id, SUM(r.rating) AS total_ratings, COUNT(*) AS total_reviews
            FROM reviews r
            JOIN products p ON p.id = r.product_id
            WHERE {LISTED_PRODUCTS}
            GROUP BY r.product_id
            "#
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(review_stats_row)
        .collect::<StoreResult<HashMap<_, _>>>()?;

        let brands = sqlx::query(&format!("SELECT {BRAND_COLUMNS} FROM brands WHERE is_active"))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(brand_row)
            .collect::<StoreResult<Vec<_>>>()?;

        let categories = match category {
            Some(slug) => sqlx::query(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active AND slug = $1"
            ))
            .bind(slug)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(category_row)
            .collect::<StoreResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(CatalogSnapshot {
            products,
            brands,
            review_stats,
            categories,
            viewer,
            wishlist,
        })
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products"))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(product_row)
            .collect()
    }

    async fn brands(&self) -> StoreResult<Vec<Brand>> {
        sqlx::query(&format!("SELECT {BRAND_COLUMNS} FROM brands"))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(brand_row)
            .collect()
    }

    async fn categories(&self) -> StoreResult<Vec<Category>> {
        sqlx::query(&format!("SELECT {CATEGORY_COLUMNS} FROM categories"))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(category_row)
            .collect()
    }

    async fn wishlist_of(&self, user: UserId) -> StoreResult<Vec<WishlistEntry>> {
        sqlx::query("SELECT id, product_id, user_id, is_liked, updated FROM wishlist WHERE user_id = $1")
            .bind(user.as_uuid())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(wishlist_row)
            .collect()
    }

    #[instrument(skip(self, product), fields(sku = %product.sku), err)]
    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, slug, description, image_url, image_key,
                quantity, price, taxable, is_active, brand_id, created
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(&product.image_key)
        .bind(product.quantity)
        .bind(product.price)
        .bind(product.taxable)
        .bind(product.is_active)
        .bind(product.brand.map(Uuid::from))
        .bind(product.created)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "product"))?;
        Ok(())
    }

    async fn insert_brand(&self, brand: Brand) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO brands (id, name, slug, description, is_active, merchant_id, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(brand.id.as_uuid())
        .bind(&brand.name)
        .bind(&brand.slug)
        .bind(&brand.description)
        .bind(brand.is_active)
        .bind(brand.merchant.map(Uuid::from))
        .bind(brand.created)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "brand"))?;
        Ok(())
    }

    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        let products: Vec<Uuid> = category.products.iter().copied().map(Uuid::from).collect();
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, is_active, product_ids, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.is_active)
        .bind(products)
        .bind(category.created)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "category"))?;
        Ok(())
    }

    async fn insert_review(&self, review: Review) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, user_id, title, rating, review, is_recommended, status, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.product.as_uuid())
        .bind(review.user.map(Uuid::from))
        .bind(&review.title)
        .bind(review.rating)
        .bind(&review.review)
        .bind(review.is_recommended)
        .bind(review.status.as_str())
        .bind(review.created)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_wishlist(&self, entry: WishlistEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO wishlist (id, product_id, user_id, is_liked, updated)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET is_liked = EXCLUDED.is_liked, updated = EXCLUDED.updated
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.product.as_uuid())
        .bind(entry.user.as_uuid())
        .bind(entry.is_liked)
        .bind(entry.updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn brand(&self, id: BrandId) -> StoreResult<Option<Brand>> {
        sqlx::query(&format!("SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(brand_row)
            .transpose()
    }

    async fn category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        sqlx::query(&format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(category_row)
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn set_brand_active(&self, id: BrandId, active: bool) -> StoreResult<Brand> {
        sqlx::query(&format!(
            "UPDATE brands SET is_active = $2 WHERE id = $1 RETURNING {BRAND_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(brand_row)
        .transpose()?
        .ok_or_else(|| StoreError::NotFound(format!("brand {id}")))
    }

    #[instrument(skip(self), err)]
    async fn set_category_active(&self, id: CategoryId, active: bool) -> StoreResult<Category> {
        sqlx::query(&format!(
            "UPDATE categories SET is_active = $2 WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(category_row)
        .transpose()?
        .ok_or_else(|| StoreError::NotFound(format!("category {id}")))
    }

    async fn deactivate_products(&self, ids: &[ProductId]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        sqlx::query("UPDATE products SET is_active = FALSE WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, adjustments), fields(count = adjustments.len()), err)]
    async fn adjust_stock(&self, adjustments: &[StockAdjustment]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for adj in adjustments {
            sqlx::query("UPDATE products SET quantity = quantity + $2 WHERE id = $1")
                .bind(adj.product.as_uuid())
                .bind(adj.delta)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    #[instrument(skip(self, cart), fields(cart_id = %cart.id), err)]
    async fn insert_cart(&self, cart: Cart) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO carts (id, user_id, created, updated) VALUES ($1, $2, $3, $4)")
            .bind(cart.id.as_uuid())
            .bind(cart.user.as_uuid())
            .bind(cart.created)
            .bind(cart.updated)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, cart.id, &cart.products).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn cart(&self, id: CartId) -> StoreResult<Option<Cart>> {
        let row = sqlx::query("SELECT id, user_id, created, updated FROM carts WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.load_cart(&row).await?)),
            None => Ok(None),
        }
    }

    async fn cart_with_item(&self, item: LineItemId) -> StoreResult<Option<Cart>> {
        let row = sqlx::query(
            r#"
            SELECT c.id, c.user_id, c.created, c.updated
            FROM carts c
            JOIN cart_items i ON i.cart_id = c.id
            WHERE i.id = $1
            "#,
        )
        .bind(item.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(self.load_cart(&row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, cart), fields(cart_id = %cart.id), err)]
    async fn save_cart(&self, cart: Cart) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query("UPDATE carts SET updated = $2 WHERE id = $1")
            .bind(cart.id.as_uuid())
            .bind(cart.updated)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("cart {}", cart.id)));
        }
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_uuid())
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, cart.id, &cart.products).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_cart(&self, id: CartId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: Order) -> StoreResult<()> {
        sqlx::query("INSERT INTO orders (id, cart_id, user_id, total, created) VALUES ($1, $2, $3, $4, $5)")
            .bind(order.id.as_uuid())
            .bind(order.cart.as_uuid())
            .bind(order.user.as_uuid())
            .bind(order.total)
            .bind(order.created)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        sqlx::query("SELECT id, cart_id, user_id, total, created FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(order_row)
            .transpose()
    }

    async fn orders(&self, user: Option<UserId>) -> StoreResult<Vec<Order>> {
        sqlx::query(
            "SELECT id, cart_id, user_id, total, created FROM orders WHERE $1::uuid IS NULL OR user_id = $1",
        )
        .bind(user.map(Uuid::from))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(order_row)
        .collect()
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ContactStore for PostgresStore {
    async fn insert_contact(&self, contact: Contact) -> StoreResult<()> {
        sqlx::query("INSERT INTO contacts (id, name, email, message, created) VALUES ($1, $2, $3, $4, $5)")
            .bind(contact.id.as_uuid())
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.message)
            .bind(contact.created)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
