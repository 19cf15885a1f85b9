//! Cart line-item pricing.
//!
//! Each derived amount is rounded to cents on its own (`price × quantity`,
//! `price × rate × quantity`, then their sum). Rounding the sum once could
//! differ by a cent; the per-field rounding is the contract.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, LineItemId, ProductId};

use crate::line_item::{LineItem, LineItemStatus};

/// Round to 2 decimal places, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Flat jurisdiction tax rate applied to taxable items (e.g. `0.07` for 7%).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TaxRate(Decimal);

impl TaxRate {
    pub fn new(rate: Decimal) -> DomainResult<Self> {
        if rate.is_sign_negative() {
            return Err(DomainError::validation("tax rate cannot be negative"));
        }
        Ok(Self(rate))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

/// Largest quantity accepted on a single line.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest unit price accepted on a single line.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// A product the shopper is buying, as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product: ProductId,
    pub quantity: i64,
    pub price: Decimal,
    #[serde(default)]
    pub taxable: bool,
}

impl CartItemInput {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(DomainError::validation(format!("quantity cannot exceed {MAX_QUANTITY}")));
        }
        if self.price.is_sign_negative() {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if self.price > MAX_UNIT_PRICE {
            return Err(DomainError::validation(format!("price cannot exceed {MAX_UNIT_PRICE}")));
        }
        Ok(())
    }
}

fn out_of_range() -> DomainError {
    DomainError::validation("line total is out of range")
}

/// Price a single item. Fails when an amount does not fit a `Decimal`.
pub fn price_item(id: LineItemId, item: &CartItemInput, rate: TaxRate) -> DomainResult<LineItem> {
    let quantity = Decimal::from(item.quantity);
    let total_price = round2(item.price.checked_mul(quantity).ok_or_else(out_of_range)?);

    let (total_tax, price_with_tax) = if item.taxable {
        let tax = item
            .price
            .checked_mul(rate.as_decimal())
            .and_then(|unit_tax| unit_tax.checked_mul(quantity))
            .ok_or_else(out_of_range)?;
        let total_tax = round2(tax);
        let with_tax = total_price.checked_add(total_tax).ok_or_else(out_of_range)?;
        (total_tax, round2(with_tax))
    } else {
        (Decimal::ZERO, total_price)
    };

    Ok(LineItem {
        id,
        product: item.product,
        quantity: item.quantity,
        purchase_price: item.price,
        total_price,
        total_tax,
        price_with_tax,
        status: LineItemStatus::NotProcessed,
    })
}

/// Price every item, preserving order. Each line gets a fresh id.
pub fn price_cart_items(items: &[CartItemInput], rate: TaxRate) -> DomainResult<Vec<LineItem>> {
    items
        .iter()
        .map(|item| price_item(LineItemId::new(), item, rate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(r: &str) -> TaxRate {
        TaxRate::new(r.parse().unwrap()).unwrap()
    }

    fn input(price: &str, quantity: i64, taxable: bool) -> CartItemInput {
        CartItemInput {
            product: ProductId::new(),
            quantity,
            price: price.parse().unwrap(),
            taxable,
        }
    }

    #[test]
    fn taxable_item_rounds_each_field() {
        let item = price_item(LineItemId::new(), &input("9.99", 3, true), rate("0.07")).unwrap();

        assert_eq!(item.purchase_price, Decimal::new(999, 2));
        assert_eq!(item.total_price, Decimal::new(2997, 2));
        // 9.99 * 0.07 * 3 = 2.0979
        assert_eq!(item.total_tax, Decimal::new(210, 2));
        assert_eq!(item.price_with_tax, Decimal::new(3207, 2));
        assert_eq!(item.status, LineItemStatus::NotProcessed);
    }

    #[test]
    fn non_taxable_item_has_no_tax() {
        let item = price_item(LineItemId::new(), &input("5", 2, false), rate("0.07")).unwrap();

        assert_eq!(item.total_tax, Decimal::ZERO);
        assert_eq!(item.total_price, Decimal::new(1000, 2));
        assert_eq!(item.price_with_tax, item.total_price);
    }

    #[test]
    fn rounding_is_per_field_not_on_the_sum() {
        // total 0.125 -> 0.13, tax 0.125 * 0.04 = 0.005 -> 0.01, so 0.14 with tax,
        // where rounding the exact sum 0.13 once would give 0.13.
        let item = price_item(LineItemId::new(), &input("0.125", 1, true), rate("0.04")).unwrap();
        assert_eq!(item.total_price, Decimal::new(13, 2));
        assert_eq!(item.total_tax, Decimal::new(1, 2));
        assert_eq!(item.price_with_tax, Decimal::new(14, 2));
    }

    #[test]
    fn price_cart_items_preserves_order() {
        let items = vec![input("1", 1, false), input("2", 1, false), input("3", 1, false)];
        let priced = price_cart_items(&items, rate("0.07")).unwrap();
        let products: Vec<_> = priced.iter().map(|p| p.product).collect();
        let expected: Vec<_> = items.iter().map(|i| i.product).collect();
        assert_eq!(products, expected);
    }

    #[test]
    fn validation_rejects_non_positive_quantity_and_negative_price() {
        assert!(input("1", 0, false).validate().is_err());
        assert!(input("-1", 1, false).validate().is_err());
        assert!(input("0", 1, false).validate().is_ok());
        assert!(TaxRate::new(Decimal::new(-1, 2)).is_err());
    }

    #[test]
    fn validation_bounds_quantity_and_unit_price() {
        assert_eq!(MAX_UNIT_PRICE, Decimal::from(1_000_000_000_000i64));
        assert!(input("1", MAX_QUANTITY, false).validate().is_ok());
        assert!(input("1", MAX_QUANTITY + 1, false).validate().is_err());
        assert!(input("1000000000000", 1, false).validate().is_ok());
        assert!(input("1000000000000.01", 1, false).validate().is_err());
        assert!(input("1000000000000", i64::MAX, true).validate().is_err());
    }

    #[test]
    fn oversized_line_is_an_error_not_a_panic() {
        let huge = CartItemInput {
            product: ProductId::new(),
            quantity: i64::MAX,
            price: Decimal::MAX,
            taxable: true,
        };
        let err = price_item(LineItemId::new(), &huge, rate("0.07")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let items = vec![input("1", 1, false), huge];
        assert!(price_cart_items(&items, rate("0.07")).is_err());
    }

    #[test]
    fn largest_accepted_line_prices_cleanly() {
        let item = input("1000000000000", MAX_QUANTITY, true);
        item.validate().unwrap();
        let line = price_item(LineItemId::new(), &item, rate("0.25")).unwrap();
        assert_eq!(line.total_price, Decimal::from(1_000_000_000_000_000_000i128));
        assert_eq!(line.total_tax, Decimal::from(250_000_000_000_000_000i128));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: derived fields are cent-precise and consistent with each other.
            #[test]
            fn priced_fields_are_consistent(
                cents in 0i64..1_000_000,
                quantity in 1i64..100,
                taxable in any::<bool>(),
                rate_bp in 0i64..2_500,
            ) {
                let item = CartItemInput {
                    product: ProductId::new(),
                    quantity,
                    price: Decimal::new(cents, 2),
                    taxable,
                };
                let rate = TaxRate::new(Decimal::new(rate_bp, 4)).unwrap();
                let line = price_item(LineItemId::new(), &item, rate).unwrap();

                prop_assert!(line.total_price.scale() <= 2);
                prop_assert!(line.total_tax.scale() <= 2);
                prop_assert_eq!(line.total_price, Decimal::new(cents * quantity, 2));
                prop_assert_eq!(line.price_with_tax, line.total_price + line.total_tax);
                if !taxable {
                    prop_assert_eq!(line.total_tax, Decimal::ZERO);
                }
            }
        }
    }
}
