use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{CartId, DomainError, DomainResult, Entity, LineItemId, ProductId, UserId};

use crate::line_item::{LineItem, LineItemStatus};

/// A shopper's basket of priced line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user: UserId,
    pub products: Vec<LineItem>,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Cart {
    pub fn new(id: CartId, user: UserId, products: Vec<LineItem>, created: DateTime<Utc>) -> Self {
        Self {
            id,
            user,
            products,
            created,
            updated: None,
        }
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user == user
    }

    pub fn push_item(&mut self, item: LineItem, now: DateTime<Utc>) {
        self.products.push(item);
        self.updated = Some(now);
    }

    /// Drop every line for `product`. Returns how many lines were removed.
    pub fn remove_product(&mut self, product: ProductId, now: DateTime<Utc>) -> usize {
        let before = self.products.len();
        self.products.retain(|item| item.product != product);
        let removed = before - self.products.len();
        if removed > 0 {
            self.updated = Some(now);
        }
        removed
    }

    /// Change the status of one line item.
    ///
    /// Admins may set any status. The cart owner may only cancel.
    pub fn update_item_status(
        &mut self,
        item: LineItemId,
        status: LineItemStatus,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<&LineItem> {
        if !is_admin && !status.is_cancelled() {
            return Err(DomainError::forbidden("only an admin can set this status"));
        }

        let line = self
            .products
            .iter_mut()
            .find(|line| line.id == item)
            .ok_or_else(|| DomainError::not_found(format!("line item {item} not found")))?;

        line.status = status;
        self.updated = Some(now);
        Ok(line)
    }
}

impl Entity for Cart {
    type Id = CartId;

    fn id(&self) -> CartId {
        self.id
    }
}

/// Stock change for one product, applied after a cart is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product: ProductId,
    pub delta: i64,
}

/// One decrement per line item. Stock is not checked for availability.
pub fn stock_adjustments(items: &[LineItem]) -> Vec<StockAdjustment> {
    items
        .iter()
        .map(|item| StockAdjustment {
            product: item.product,
            delta: -item.quantity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::pricing::{price_cart_items, CartItemInput, TaxRate};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn cart_with(products: &[(ProductId, i64)]) -> Cart {
        let inputs: Vec<_> = products
            .iter()
            .map(|(product, quantity)| CartItemInput {
                product: *product,
                quantity: *quantity,
                price: Decimal::new(1000, 2),
                taxable: true,
            })
            .collect();
        let rate = TaxRate::new(Decimal::new(7, 2)).unwrap();
        Cart::new(CartId::new(), UserId::new(), price_cart_items(&inputs, rate).unwrap(), at(0))
    }

    #[test]
    fn stock_adjustments_decrement_by_quantity() {
        let (a, b) = (ProductId::new(), ProductId::new());
        let cart = cart_with(&[(a, 2), (b, 5)]);

        let adjustments = stock_adjustments(&cart.products);
        assert_eq!(
            adjustments,
            vec![
                StockAdjustment { product: a, delta: -2 },
                StockAdjustment { product: b, delta: -5 },
            ]
        );
    }

    #[test]
    fn remove_product_drops_all_its_lines() {
        let (a, b) = (ProductId::new(), ProductId::new());
        let mut cart = cart_with(&[(a, 1), (b, 1), (a, 3)]);

        assert_eq!(cart.remove_product(a, at(10)), 2);
        assert_eq!(cart.products.len(), 1);
        assert_eq!(cart.products[0].product, b);
        assert_eq!(cart.updated, Some(at(10)));

        assert_eq!(cart.remove_product(ProductId::new(), at(20)), 0);
        assert_eq!(cart.updated, Some(at(10)));
    }

    #[test]
    fn owner_may_only_cancel() {
        let mut cart = cart_with(&[(ProductId::new(), 1)]);
        let item = cart.products[0].id;

        let err = cart
            .update_item_status(item, LineItemStatus::Shipped, false, at(1))
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let line = cart
            .update_item_status(item, LineItemStatus::Cancelled, false, at(2))
            .unwrap();
        assert_eq!(line.status, LineItemStatus::Cancelled);
    }

    #[test]
    fn admin_sets_any_status_and_unknown_item_is_not_found() {
        let mut cart = cart_with(&[(ProductId::new(), 1)]);
        let item = cart.products[0].id;

        let line = cart
            .update_item_status(item, LineItemStatus::Delivered, true, at(1))
            .unwrap();
        assert_eq!(line.status, LineItemStatus::Delivered);

        let err = cart
            .update_item_status(LineItemId::new(), LineItemStatus::Processing, true, at(2))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
