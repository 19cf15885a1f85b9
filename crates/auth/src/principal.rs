use storefront_core::{MerchantId, UserId};

use crate::{JwtClaims, Role};

/// An authenticated caller, derived from verified claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user: UserId,
    pub email: String,
    pub role: Role,
    /// Set for merchant accounts.
    pub merchant: Option<MerchantId>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<JwtClaims> for Principal {
    fn from(claims: JwtClaims) -> Self {
        Self {
            user: claims.sub,
            email: claims.email,
            role: claims.role,
            merchant: claims.merchant,
        }
    }
}
