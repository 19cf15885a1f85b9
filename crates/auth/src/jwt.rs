use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::{validate_claims, JwtClaims, TokenValidationError};

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HMAC-SHA256 signed tokens with a shared secret.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry lives in `expires_at`, checked by `validate_claims`.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};
    use storefront_core::UserId;

    use super::*;
    use crate::Role;

    fn mint(secret: &str, issued_at: DateTime<Utc>, ttl: Duration) -> String {
        let claims = JwtClaims {
            sub: UserId::new(),
            email: "a@example.com".into(),
            role: Role::Admin,
            merchant: None,
            issued_at,
            expires_at: issued_at + ttl,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let now = Utc::now();
        let validator = Hs256JwtValidator::new("secret");
        let claims = validator.validate(&mint("secret", now, Duration::minutes(10)), now).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn rejects_wrong_secret_expired_and_garbage() {
        let now = Utc::now();
        let validator = Hs256JwtValidator::new("secret");

        assert!(matches!(
            validator.validate(&mint("other", now, Duration::minutes(10)), now),
            Err(TokenValidationError::Malformed(_))
        ));
        assert_eq!(
            validator.validate(&mint("secret", now - Duration::hours(2), Duration::hours(1)), now),
            Err(TokenValidationError::Expired)
        );
        assert!(matches!(
            validator.validate("not-a-jwt", now),
            Err(TokenValidationError::Malformed(_))
        ));
    }
}
