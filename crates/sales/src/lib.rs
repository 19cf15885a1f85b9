//! Sales domain module: carts, line-item pricing, and order totals.
//!
//! Pure arithmetic and state rules (no IO). Tax rate is always passed in by the
//! caller.

pub mod cart;
pub mod line_item;
pub mod order;
pub mod pricing;

pub use cart::{stock_adjustments, Cart, StockAdjustment};
pub use line_item::{LineItem, LineItemStatus};
pub use order::{compute_order_tax, sort_newest_first, Order, OrderTaxInput, OrderTotals, TaxedOrder};
pub use pricing::{price_cart_items, price_item, round2, CartItemInput, TaxRate};
