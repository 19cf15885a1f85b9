use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{Entity, LineItemId, ProductId};

/// Fulfilment status of a single line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineItemStatus {
    #[default]
    #[serde(rename = "Not processed")]
    NotProcessed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl LineItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemStatus::NotProcessed => "Not processed",
            LineItemStatus::Processing => "Processing",
            LineItemStatus::Shipped => "Shipped",
            LineItemStatus::Delivered => "Delivered",
            LineItemStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Not processed" => Some(LineItemStatus::NotProcessed),
            "Processing" => Some(LineItemStatus::Processing),
            "Shipped" => Some(LineItemStatus::Shipped),
            "Delivered" => Some(LineItemStatus::Delivered),
            "Cancelled" => Some(LineItemStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LineItemStatus::Cancelled)
    }
}

impl core::fmt::Display for LineItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product + quantity entry of a cart, priced at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub product: ProductId,
    pub quantity: i64,
    /// Unit price at the time of purchase.
    pub purchase_price: Decimal,
    pub total_price: Decimal,
    pub total_tax: Decimal,
    pub price_with_tax: Decimal,
    pub status: LineItemStatus,
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> LineItemId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_match_display() {
        for status in [
            LineItemStatus::NotProcessed,
            LineItemStatus::Processing,
            LineItemStatus::Shipped,
            LineItemStatus::Delivered,
            LineItemStatus::Cancelled,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.to_string()));
            assert_eq!(LineItemStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_does_not_parse() {
        assert_eq!(LineItemStatus::parse("Lost"), None);
    }
}
