//! Orders and order-level tax recomputation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{CartId, Entity, OrderId, UserId};

use crate::line_item::LineItem;
use crate::pricing::round2;

/// A placed order. Line items live on the referenced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub cart: CartId,
    pub user: UserId,
    /// Total as submitted by the client. Replaced on read by the recomputed total.
    pub total: Decimal,
    pub created: DateTime<Utc>,
}

impl Order {
    /// Admins see every order; everyone else only their own.
    pub fn visible_to(&self, user: UserId, is_admin: bool) -> bool {
        is_admin || self.user == user
    }

    /// Pair the order with its cart's line items for tax recomputation.
    pub fn with_items(&self, products: Vec<LineItem>) -> OrderTaxInput {
        OrderTaxInput {
            id: self.id,
            total: self.total,
            created: self.created,
            products,
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTaxInput {
    pub id: OrderId,
    pub total: Decimal,
    pub created: DateTime<Utc>,
    pub products: Vec<LineItem>,
}

/// Sums over the non-cancelled line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderTotals {
    pub total: Decimal,
    pub total_tax: Decimal,
    pub price_with_tax: Decimal,
}

impl OrderTotals {
    pub fn from_items(items: &[LineItem]) -> Self {
        let (total, total_tax) = items
            .iter()
            .filter(|item| !item.status.is_cancelled())
            .fold((Decimal::ZERO, Decimal::ZERO), |(total, tax), item| {
                (total + item.total_price, tax + item.total_tax)
            });

        Self {
            total,
            total_tax,
            price_with_tax: total + total_tax,
        }
    }
}

/// Order as returned to clients: amounts are fixed two-decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxedOrder {
    pub id: OrderId,
    pub total: String,
    pub total_tax: String,
    pub price_with_tax: String,
    pub created: DateTime<Utc>,
    pub products: Vec<LineItem>,
}

fn fixed2(value: Decimal) -> String {
    let mut rounded = round2(value);
    rounded.rescale(2);
    rounded.to_string()
}

/// Recompute `total`, `totalTax` and `priceWithTax` from the line items.
///
/// The stored total is ignored.
pub fn compute_order_tax(input: OrderTaxInput) -> TaxedOrder {
    let totals = OrderTotals::from_items(&input.products);

    TaxedOrder {
        id: input.id,
        total: fixed2(totals.total),
        total_tax: fixed2(totals.total_tax),
        price_with_tax: fixed2(totals.price_with_tax),
        created: input.created,
        products: input.products,
    }
}

pub fn sort_newest_first(orders: &mut [TaxedOrder]) {
    orders.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use storefront_core::{LineItemId, ProductId};

    use super::*;
    use crate::line_item::LineItemStatus;

    fn item(total_price: i64, total_tax: i64, status: LineItemStatus) -> LineItem {
        LineItem {
            id: LineItemId::new(),
            product: ProductId::new(),
            quantity: 1,
            purchase_price: Decimal::from(total_price),
            total_price: Decimal::from(total_price),
            total_tax: Decimal::from(total_tax),
            price_with_tax: Decimal::from(total_price + total_tax),
            status,
        }
    }

    fn input(total: Decimal, products: Vec<LineItem>) -> OrderTaxInput {
        OrderTaxInput {
            id: OrderId::new(),
            total,
            created: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap(),
            products,
        }
    }

    #[test]
    fn cancelled_items_are_excluded() {
        let order = compute_order_tax(input(
            Decimal::from(30),
            vec![
                item(10, 1, LineItemStatus::Shipped),
                item(20, 2, LineItemStatus::Cancelled),
            ],
        ));

        assert_eq!(order.total, "10.00");
        assert_eq!(order.total_tax, "1.00");
        assert_eq!(order.price_with_tax, "11.00");
    }

    #[test]
    fn stored_total_is_overwritten() {
        let order = compute_order_tax(input(
            Decimal::from(999),
            vec![item(4, 0, LineItemStatus::NotProcessed)],
        ));
        assert_eq!(order.total, "4.00");
    }

    #[test]
    fn empty_or_fully_cancelled_order_is_zero() {
        let order = compute_order_tax(input(
            Decimal::ZERO,
            vec![item(7, 1, LineItemStatus::Cancelled)],
        ));
        assert_eq!(order.total, "0.00");
        assert_eq!(order.total_tax, "0.00");
        assert_eq!(order.price_with_tax, "0.00");
    }

    #[test]
    fn recomputation_is_idempotent() {
        let products = vec![
            item(12, 1, LineItemStatus::Processing),
            item(3, 0, LineItemStatus::Delivered),
        ];
        let first = compute_order_tax(input(Decimal::ZERO, products));
        let again = compute_order_tax(OrderTaxInput {
            id: first.id,
            total: first.total.parse().unwrap(),
            created: first.created,
            products: first.products.clone(),
        });
        assert_eq!(first, again);
    }

    #[test]
    fn visibility_and_ordering() {
        let owner = UserId::new();
        let order = Order {
            id: OrderId::new(),
            cart: CartId::new(),
            user: owner,
            total: Decimal::ONE,
            created: Utc.timestamp_opt(0, 0).single().unwrap(),
        };
        assert!(order.visible_to(owner, false));
        assert!(!order.visible_to(UserId::new(), false));
        assert!(order.visible_to(UserId::new(), true));

        let mut older = compute_order_tax(order.with_items(vec![]));
        older.created = Utc.timestamp_opt(10, 0).single().unwrap();
        let mut newer = older.clone();
        newer.id = OrderId::new();
        newer.created = Utc.timestamp_opt(20, 0).single().unwrap();

        let mut orders = vec![older.clone(), newer.clone()];
        sort_newest_first(&mut orders);
        assert_eq!(orders[0].id, newer.id);
    }

    #[test]
    fn taxed_order_json_uses_fixed_strings() {
        let order = compute_order_tax(input(
            Decimal::ZERO,
            vec![item(10, 1, LineItemStatus::Shipped)],
        ));
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["total"], "10.00");
        assert_eq!(json["totalTax"], "1.00");
        assert_eq!(json["priceWithTax"], "11.00");
        assert_eq!(json["id"], order.id.to_string());
    }
}
