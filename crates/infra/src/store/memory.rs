use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use storefront_catalog::{
    Brand, CatalogSnapshot, Category, Product, Review, ReviewStats, WishlistEntry,
};
use storefront_core::{BrandId, CartId, CategoryId, Entity, LineItemId, OrderId, ProductId, UserId};
use storefront_sales::{Cart, Order, StockAdjustment};

use super::{CartStore, CatalogStore, Contact, ContactStore, OrderStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    brands: HashMap<BrandId, Brand>,
    categories: HashMap<CategoryId, Category>,
    reviews: Vec<Review>,
    wishlist: HashMap<(UserId, ProductId), WishlistEntry>,
    carts: HashMap<CartId, Cart>,
    orders: HashMap<OrderId, Order>,
    contacts: Vec<Contact>,
}

/// Insert or replace a record under its own id.
fn put<E: Entity>(table: &mut HashMap<E::Id, E>, record: E) {
    table.insert(record.id(), record);
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))
    }

    /// Contact messages received so far.
    pub fn contacts(&self) -> StoreResult<Vec<Contact>> {
        Ok(self.read()?.contacts.clone())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn listing_snapshot(
        &self,
        viewer: Option<UserId>,
        category: Option<&str>,
    ) -> StoreResult<CatalogSnapshot> {
        let state = self.read()?;
        let wishlist = match viewer {
            Some(user) => state
                .wishlist
                .values()
                .filter(|entry| entry.user == user)
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let categories: Vec<Category> = match category {
            Some(slug) => state
                .categories
                .values()
                .filter(|c| c.is_active && c.slug == slug)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        let members: Option<HashSet<ProductId>> = category
            .map(|_| categories.iter().flat_map(|c| c.products.iter().copied()).collect());

        let products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.is_active)
            .filter(|p| members.as_ref().is_none_or(|m| m.contains(&p.id)))
            .cloned()
            .collect();
        let listed: HashSet<ProductId> = products.iter().map(|p| p.id).collect();
        let reviews: Vec<Review> = state
            .reviews
            .iter()
            .filter(|r| listed.contains(&r.product))
            .cloned()
            .collect();

        Ok(CatalogSnapshot {
            products,
            brands: state.brands.values().filter(|b| b.is_active).cloned().collect(),
            review_stats: ReviewStats::index(&reviews),
            categories,
            viewer,
            wishlist,
        })
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn brands(&self) -> StoreResult<Vec<Brand>> {
        Ok(self.read()?.brands.values().cloned().collect())
    }

    async fn categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn wishlist_of(&self, user: UserId) -> StoreResult<Vec<WishlistEntry>> {
        Ok(self
            .read()?
            .wishlist
            .values()
            .filter(|entry| entry.user == user)
            .cloned()
            .collect())
    }

    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        let mut state = self.write()?;
        product.ensure_unique(state.products.values())?;
        put(&mut state.products, product);
        Ok(())
    }

    async fn insert_brand(&self, brand: Brand) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.brands.values().any(|b| b.slug == brand.slug && b.id != brand.id) {
            return Err(StoreError::Conflict("a brand with this slug already exists".into()));
        }
        put(&mut state.brands, brand);
        Ok(())
    }

    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        let mut state = self.write()?;
        if state
            .categories
            .values()
            .any(|c| c.slug == category.slug && c.id != category.id)
        {
            return Err(StoreError::Conflict("a category with this slug already exists".into()));
        }
        put(&mut state.categories, category);
        Ok(())
    }

    async fn insert_review(&self, review: Review) -> StoreResult<()> {
        self.write()?.reviews.push(review);
        Ok(())
    }

    async fn upsert_wishlist(&self, entry: WishlistEntry) -> StoreResult<()> {
        self.write()?.wishlist.insert((entry.user, entry.product), entry);
        Ok(())
    }

    async fn brand(&self, id: BrandId) -> StoreResult<Option<Brand>> {
        Ok(self.read()?.brands.get(&id).cloned())
    }

    async fn category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn set_brand_active(&self, id: BrandId, active: bool) -> StoreResult<Brand> {
        let mut state = self.write()?;
        let brand = state
            .brands
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("brand {id}")))?;
        brand.is_active = active;
        Ok(brand.clone())
    }

    async fn set_category_active(&self, id: CategoryId, active: bool) -> StoreResult<Category> {
        let mut state = self.write()?;
        let category = state
            .categories
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("category {id}")))?;
        category.is_active = active;
        Ok(category.clone())
    }

    async fn deactivate_products(&self, ids: &[ProductId]) -> StoreResult<()> {
        let mut state = self.write()?;
        for id in ids {
            if let Some(product) = state.products.get_mut(id) {
                product.is_active = false;
            }
        }
        Ok(())
    }

    async fn adjust_stock(&self, adjustments: &[StockAdjustment]) -> StoreResult<()> {
        let mut state = self.write()?;
        let mut updated: HashMap<ProductId, i64> = HashMap::new();
        for adj in adjustments {
            let Some(product) = state.products.get(&adj.product) else {
                continue;
            };
            let current = updated.get(&adj.product).copied().unwrap_or(product.quantity);
            let next = current
                .checked_add(adj.delta)
                .ok_or_else(|| StoreError::Conflict(format!("stock for product {} is out of range", adj.product)))?;
            updated.insert(adj.product, next);
        }
        for (id, quantity) in updated {
            if let Some(product) = state.products.get_mut(&id) {
                product.quantity = quantity;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn insert_cart(&self, cart: Cart) -> StoreResult<()> {
        put(&mut self.write()?.carts, cart);
        Ok(())
    }

    async fn cart(&self, id: CartId) -> StoreResult<Option<Cart>> {
        Ok(self.read()?.carts.get(&id).cloned())
    }

    async fn cart_with_item(&self, item: LineItemId) -> StoreResult<Option<Cart>> {
        Ok(self
            .read()?
            .carts
            .values()
            .find(|cart| cart.products.iter().any(|line| line.id == item))
            .cloned())
    }

    async fn save_cart(&self, cart: Cart) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.carts.get_mut(&cart.id) {
            Some(slot) => {
                *slot = cart;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("cart {}", cart.id))),
        }
    }

    async fn delete_cart(&self, id: CartId) -> StoreResult<bool> {
        Ok(self.write()?.carts.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: Order) -> StoreResult<()> {
        put(&mut self.write()?.orders, order);
        Ok(())
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn orders(&self, user: Option<UserId>) -> StoreResult<Vec<Order>> {
        Ok(self
            .read()?
            .orders
            .values()
            .filter(|order| user.is_none_or(|u| order.user == u))
            .cloned()
            .collect())
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<bool> {
        Ok(self.write()?.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl ContactStore for InMemoryStore {
    async fn insert_contact(&self, contact: Contact) -> StoreResult<()> {
        self.write()?.contacts.push(contact);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use storefront_catalog::NewProduct;
    use storefront_sales::{price_cart_items, stock_adjustments, CartItemInput, TaxRate};

    use super::*;

    fn product(name: &str, sku: &str, quantity: i64) -> Product {
        NewProduct {
            sku: Some(sku.into()),
            name: Some(name.into()),
            description: Some("desc".into()),
            quantity: Some(quantity),
            price: Some(Decimal::new(1000, 2)),
            ..Default::default()
        }
        .into_product(ProductId::new(), Utc.timestamp_opt(0, 0).single().unwrap())
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_sku_or_slug_is_a_conflict() {
        let store = InMemoryStore::new();
        store.insert_product(product("Trail Shoe", "SKU-1", 3)).await.unwrap();

        let err = store.insert_product(product("Other", "SKU-1", 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        let err = store.insert_product(product("Trail Shoe", "SKU-2", 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn stock_can_go_negative() {
        let store = InMemoryStore::new();
        let p = product("Trail Shoe", "SKU-1", 1);
        store.insert_product(p.clone()).await.unwrap();

        let items = price_cart_items(
            &[CartItemInput {
                product: p.id,
                quantity: 3,
                price: p.price,
                taxable: false,
            }],
            TaxRate::new(Decimal::ZERO).unwrap(),
        )
        .unwrap();
        store.adjust_stock(&stock_adjustments(&items)).await.unwrap();

        let stored = store.products().await.unwrap();
        assert_eq!(stored[0].quantity, -2);
    }

    #[tokio::test]
    async fn stock_overflow_is_rejected_and_leaves_stock_untouched() {
        let store = InMemoryStore::new();
        let low = product("Trail Shoe", "SKU-1", i64::MIN + 1);
        let other = product("Road Shoe", "SKU-2", 10);
        store.insert_product(low.clone()).await.unwrap();
        store.insert_product(other.clone()).await.unwrap();

        let adjustments = [
            StockAdjustment { product: other.id, delta: -4 },
            StockAdjustment { product: low.id, delta: -5 },
        ];
        let err = store.adjust_stock(&adjustments).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let stored: HashMap<_, _> = store
            .products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| (p.id, p.quantity))
            .collect();
        assert_eq!(stored[&low.id], i64::MIN + 1);
        assert_eq!(stored[&other.id], 10);
    }

    #[tokio::test]
    async fn repeated_product_adjustments_accumulate() {
        let store = InMemoryStore::new();
        let p = product("Trail Shoe", "SKU-1", 10);
        store.insert_product(p.clone()).await.unwrap();

        let adjustments = [
            StockAdjustment { product: p.id, delta: -3 },
            StockAdjustment { product: p.id, delta: -2 },
        ];
        store.adjust_stock(&adjustments).await.unwrap();
        assert_eq!(store.products().await.unwrap()[0].quantity, 5);
    }

    #[tokio::test]
    async fn cart_lookup_by_item_and_delete() {
        let store = InMemoryStore::new();
        let items = price_cart_items(
            &[CartItemInput {
                product: ProductId::new(),
                quantity: 1,
                price: Decimal::ONE,
                taxable: true,
            }],
            TaxRate::new(Decimal::new(7, 2)).unwrap(),
        )
        .unwrap();
        let item = items[0].id;
        let cart = Cart::new(CartId::new(), UserId::new(), items, Utc::now());
        store.insert_cart(cart.clone()).await.unwrap();

        let found = store.cart_with_item(item).await.unwrap().unwrap();
        assert_eq!(found.id, cart.id);

        assert!(store.delete_cart(cart.id).await.unwrap());
        assert!(!store.delete_cart(cart.id).await.unwrap());
        assert!(matches!(store.save_cart(cart).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn orders_filter_by_user() {
        let store = InMemoryStore::new();
        let (alice, bob) = (UserId::new(), UserId::new());
        for user in [alice, alice, bob] {
            store
                .insert_order(Order {
                    id: OrderId::new(),
                    cart: CartId::new(),
                    user,
                    total: Decimal::ONE,
                    created: Utc::now(),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.orders(None).await.unwrap().len(), 3);
        assert_eq!(store.orders(Some(alice)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn snapshot_only_carries_the_viewers_wishlist() {
        let store = InMemoryStore::new();
        let p = product("Trail Shoe", "SKU-1", 1);
        store.insert_product(p.clone()).await.unwrap();
        let (viewer, other) = (UserId::new(), UserId::new());
        for user in [viewer, other] {
            store
                .upsert_wishlist(WishlistEntry {
                    id: storefront_core::WishlistId::new(),
                    product: p.id,
                    user,
                    is_liked: true,
                    updated: Utc::now(),
                })
                .await
                .unwrap();
        }

        let snapshot = store.listing_snapshot(Some(viewer), None).await.unwrap();
        assert_eq!(snapshot.wishlist.len(), 1);
        assert_eq!(snapshot.wishlist[0].user, viewer);
        assert!(store.listing_snapshot(None, None).await.unwrap().wishlist.is_empty());
    }

    fn review(product: ProductId, rating: f64) -> Review {
        Review {
            id: storefront_core::ReviewId::new(),
            product,
            user: None,
            title: "t".into(),
            rating,
            review: "r".into(),
            is_recommended: true,
            status: storefront_catalog::ReviewStatus::Approved,
            created: Utc::now(),
        }
    }

    #[tokio::test]
    async fn snapshot_is_narrowed_to_active_category_members() {
        let store = InMemoryStore::new();
        let member = product("Trail Shoe", "SKU-1", 1);
        let outsider = product("Rain Coat", "SKU-2", 1);
        let mut retired = product("Old Shoe", "SKU-3", 1);
        retired.is_active = false;
        for p in [&member, &outsider, &retired] {
            store.insert_product(p.clone()).await.unwrap();
        }
        for (p, rating) in [(member.id, 4.0), (member.id, 2.0), (outsider.id, 5.0), (retired.id, 1.0)] {
            store.insert_review(review(p, rating)).await.unwrap();
        }
        store
            .insert_category(Category {
                id: CategoryId::new(),
                name: "Shoes".into(),
                slug: "shoes".into(),
                description: String::new(),
                is_active: true,
                products: vec![member.id, retired.id],
                created: Utc::now(),
            })
            .await
            .unwrap();

        let snapshot = store.listing_snapshot(None, Some("shoes")).await.unwrap();
        let ids: Vec<_> = snapshot.products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![member.id]);
        assert_eq!(snapshot.categories.len(), 1);
        assert_eq!(snapshot.review_stats.len(), 1);
        assert_eq!(snapshot.review_stats[&member.id].total_reviews, 2);
        assert_eq!(snapshot.review_stats[&member.id].average_rating(), 3.0);

        let everything = store.listing_snapshot(None, None).await.unwrap();
        assert_eq!(everything.products.len(), 2);
        assert_eq!(everything.review_stats[&outsider.id].total_ratings, 5.0);
        assert!(!everything.review_stats.contains_key(&retired.id));

        let unknown = store.listing_snapshot(None, Some("hats")).await.unwrap();
        assert!(unknown.products.is_empty());
        assert!(unknown.review_stats.is_empty());
    }
}
