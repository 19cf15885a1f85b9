use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Entity, ProductId, ReviewId, UserId};

/// Moderation status of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReviewStatus {
    #[default]
    #[serde(rename = "Waiting Approval")]
    WaitingApproval,
    Rejected,
    Approved,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::WaitingApproval => "Waiting Approval",
            ReviewStatus::Rejected => "Rejected",
            ReviewStatus::Approved => "Approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Waiting Approval" => Some(ReviewStatus::WaitingApproval),
            "Rejected" => Some(ReviewStatus::Rejected),
            "Approved" => Some(ReviewStatus::Approved),
            _ => None,
        }
    }
}

/// Product review. Ratings are on a 0–5 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product: ProductId,
    pub user: Option<UserId>,
    pub title: String,
    pub rating: f64,
    pub review: String,
    pub is_recommended: bool,
    pub status: ReviewStatus,
    pub created: DateTime<Utc>,
}

impl Entity for Review {
    type Id = ReviewId;

    fn id(&self) -> ReviewId {
        self.id
    }
}
