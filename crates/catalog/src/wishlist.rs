use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Entity, ProductId, UserId, WishlistId};

/// A user's like/unlike mark on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: WishlistId,
    pub product: ProductId,
    pub user: UserId,
    pub is_liked: bool,
    pub updated: DateTime<Utc>,
}

impl Entity for WishlistEntry {
    type Id = WishlistId;

    fn id(&self) -> WishlistId {
        self.id
    }
}
