use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden: role '{0}' may not perform this action")]
    Forbidden(Role),
}

/// Require an authenticated principal holding one of `allowed`.
///
/// Pure policy check: no IO.
pub fn authorize<'a>(principal: Option<&'a Principal>, allowed: &[Role]) -> Result<&'a Principal, AuthzError> {
    let principal = principal.ok_or(AuthzError::Unauthorized)?;
    if allowed.contains(&principal.role) {
        Ok(principal)
    } else {
        Err(AuthzError::Forbidden(principal.role))
    }
}
