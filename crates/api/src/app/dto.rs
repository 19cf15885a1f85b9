use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

use storefront_catalog::{ListingQuery, PriceRange, SortDirection, SortField, SortOrder};
use storefront_core::CartId;
use storefront_sales::{CartItemInput, LineItemStatus};

use crate::app::errors::ApiError;

// -------------------------
// Catalog
// -------------------------

/// Body of `POST /product/list`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    /// `{"<field>": 1 | -1, ...}`, applied in key order.
    #[serde(default)]
    pub sort_order: Option<Map<String, Value>>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page_number: Option<i64>,
}

fn sort_key(field: &str, sign: &Value) -> Result<SortOrder, ApiError> {
    let field = SortField::parse(field)
        .ok_or_else(|| ApiError::bad_request(format!("cannot sort by {field}")))?;
    let direction = sign
        .as_i64()
        .and_then(SortDirection::from_sign)
        .ok_or_else(|| ApiError::bad_request("sort direction must be 1 or -1"))?;
    Ok(SortOrder::new(field, direction))
}

impl ListingRequest {
    pub fn into_query(self) -> Result<ListingQuery, ApiError> {
        let mut sort = match &self.sort_order {
            Some(keys) => keys
                .iter()
                .map(|(field, sign)| sort_key(field, sign))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        if sort.is_empty() {
            sort.push(SortOrder::default());
        }

        let min_rating = self.rating.unwrap_or(0.0);
        if !min_rating.is_finite() || min_rating < 0.0 {
            return Err(ApiError::bad_request("rating must be a non-negative number"));
        }

        let page = self
            .page_number
            .unwrap_or(1)
            .clamp(1, i64::from(u32::MAX));

        Ok(ListingQuery {
            sort,
            min_rating,
            price: PriceRange::from_bounds(self.min_price, self.max_price),
            category: self.category.filter(|c| !c.trim().is_empty()),
            page: page as u32,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFlag {
    pub is_active: bool,
}

/// `{"brand": {"isActive": bool}}`
#[derive(Debug, Deserialize)]
pub struct BrandActiveRequest {
    pub brand: ActiveFlag,
}

/// `{"category": {"isActive": bool}}`
#[derive(Debug, Deserialize)]
pub struct CategoryActiveRequest {
    pub category: ActiveFlag,
}

// -------------------------
// Cart / orders
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCartRequest {
    pub products: Vec<CartItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product: CartItemInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub cart_id: String,
    pub total: Decimal,
}

impl PlaceOrderRequest {
    /// A malformed id is reported the same way as an unknown cart.
    pub fn cart_id(&self) -> Result<CartId, ApiError> {
        self.cart_id
            .trim()
            .parse()
            .map_err(|_| ApiError::not_found("cart not found"))
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderSearchParams {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemStatusRequest {
    pub status: String,
}

impl UpdateItemStatusRequest {
    pub fn status(&self) -> Result<LineItemStatus, ApiError> {
        LineItemStatus::parse(&self.status)
            .ok_or_else(|| ApiError::bad_request(format!("unknown status {}", self.status)))
    }
}

// -------------------------
// Newsletter / contact
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Trimmed, non-empty value of a required text field.
pub fn required(value: Option<String>, msg: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(msg))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(body: serde_json::Value) -> Result<ListingQuery, ApiError> {
        serde_json::from_value::<ListingRequest>(body).unwrap().into_query()
    }

    #[test]
    fn empty_body_uses_defaults() {
        let q = parse(json!({})).unwrap();
        assert_eq!(q, ListingQuery::default());
    }

    #[test]
    fn full_body_maps_every_field() {
        let q = parse(json!({
            "sortOrder": {"price": -1},
            "rating": 3,
            "minPrice": 10,
            "maxPrice": 99.5,
            "category": "shoes",
            "pageNumber": 2
        }))
        .unwrap();

        assert_eq!(q.sort, vec![SortOrder::new(SortField::Price, SortDirection::Descending)]);
        assert_eq!(q.min_rating, 3.0);
        assert_eq!(
            q.price,
            Some(PriceRange {
                min: Decimal::from(10),
                max: Decimal::new(995, 1)
            })
        );
        assert_eq!(q.category.as_deref(), Some("shoes"));
        assert_eq!(q.page, 2);
    }

    #[test]
    fn single_price_bound_is_ignored() {
        let q = parse(json!({"minPrice": 0})).unwrap();
        assert_eq!(q.price, None);
    }

    #[test]
    fn zero_price_bound_still_counts() {
        let q = parse(json!({"minPrice": 0, "maxPrice": 5})).unwrap();
        assert_eq!(
            q.price,
            Some(PriceRange {
                min: Decimal::ZERO,
                max: Decimal::from(5)
            })
        );
    }

    #[test]
    fn page_below_one_is_first_page() {
        assert_eq!(parse(json!({"pageNumber": 0})).unwrap().page, 1);
        assert_eq!(parse(json!({"pageNumber": -4})).unwrap().page, 1);
    }

    #[test]
    fn blank_category_means_no_category() {
        assert_eq!(parse(json!({"category": "  "})).unwrap().category, None);
    }

    #[test]
    fn bad_sort_and_rating_are_rejected() {
        assert!(matches!(
            parse(json!({"sortOrder": {"color": 1}})),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse(json!({"sortOrder": {"price": 2}})),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse(json!({"sortOrder": {"price": "asc"}})),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse(json!({"sortOrder": {"price": 1, "color": -1}})),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(parse(json!({"rating": -1})), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn sort_keys_keep_request_order() {
        let body = r#"{"sortOrder": {"price": 1, "created": -1}}"#;
        let q = serde_json::from_str::<ListingRequest>(body).unwrap().into_query().unwrap();
        assert_eq!(
            q.sort,
            vec![
                SortOrder::new(SortField::Price, SortDirection::Ascending),
                SortOrder::new(SortField::Created, SortDirection::Descending),
            ]
        );

        let body = r#"{"sortOrder": {"totalReviews": -1, "averageRating": -1, "name": 1}}"#;
        let q = serde_json::from_str::<ListingRequest>(body).unwrap().into_query().unwrap();
        let fields: Vec<_> = q.sort.iter().map(|k| k.field).collect();
        assert_eq!(fields, vec![SortField::TotalReviews, SortField::AverageRating, SortField::Name]);
    }

    #[test]
    fn empty_sort_object_is_newest_first() {
        let q = parse(json!({"sortOrder": {}})).unwrap();
        assert_eq!(q.sort, vec![SortOrder::default()]);
    }

    #[test]
    fn malformed_cart_id_reads_as_missing_cart() {
        let req: PlaceOrderRequest =
            serde_json::from_value(json!({"cartId": "not-a-uuid", "total": 10})).unwrap();
        assert!(matches!(req.cart_id(), Err(ApiError::NotFound(_))));

        let id = CartId::new();
        let req: PlaceOrderRequest =
            serde_json::from_value(json!({"cartId": id.to_string(), "total": 10})).unwrap();
        assert_eq!(req.cart_id().unwrap(), id);
    }

    #[test]
    fn status_names_parse() {
        let req = UpdateItemStatusRequest {
            status: "Cancelled".into(),
        };
        assert_eq!(req.status().unwrap(), LineItemStatus::Cancelled);

        let req = UpdateItemStatusRequest { status: "Lost".into() };
        assert!(req.status().is_err());
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required(Some(" a ".into()), "x").unwrap(), "a");
        assert!(required(Some("  ".into()), "x").is_err());
        assert!(required(None, "x").is_err());
    }
}
