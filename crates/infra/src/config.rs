//! Process configuration from environment variables (and an optional `.env`).

use std::env;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

pub const DEFAULT_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailchimpConfig {
    pub api_key: String,
    pub list_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Prefix for every API route, e.g. `/api`.
    pub api_base_url: String,
    /// `None` runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub tax_rate: Decimal,
    pub mailgun: Option<MailgunConfig>,
    pub mailchimp: Option<MailchimpConfig>,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| invalid("PORT", e))?,
            None => 3001,
        };

        let api_base_url = normalize_base(get("API_BASE_URL").as_deref().unwrap_or("/api"));

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using the development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        let tax_rate = match get("TAX_RATE") {
            Some(raw) => raw.parse::<Decimal>().map_err(|e| invalid("TAX_RATE", e))?,
            None => Decimal::new(7, 2),
        };
        if tax_rate.is_sign_negative() {
            return Err(invalid("TAX_RATE", "must not be negative"));
        }

        let mailgun = match (get("MAILGUN_API_KEY"), get("MAILGUN_DOMAIN"), get("MAILGUN_EMAIL_SENDER")) {
            (Some(api_key), Some(domain), Some(sender)) => Some(MailgunConfig { api_key, domain, sender }),
            _ => None,
        };

        let mailchimp = match (get("MAILCHIMP_API_KEY"), get("MAILCHIMP_LIST_ID")) {
            (Some(api_key), Some(list_id)) => Some(MailchimpConfig { api_key, list_id }),
            _ => None,
        };

        Ok(Self {
            host,
            port,
            api_base_url,
            database_url: get("DATABASE_URL"),
            jwt_secret,
            tax_rate,
            mailgun,
            mailchimp,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `api`, `/api/` and `/api` all become `/api`; an empty prefix becomes `""`.
fn normalize_base(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3001");
        assert_eq!(cfg.api_base_url, "/api");
        assert_eq!(cfg.tax_rate, Decimal::new(7, 2));
        assert_eq!(cfg.jwt_secret, DEFAULT_JWT_SECRET);
        assert!(cfg.database_url.is_none());
        assert!(cfg.mailgun.is_none());
        assert!(cfg.mailchimp.is_none());
    }

    #[test]
    fn overrides_and_partial_mail_config() {
        let cfg = load(&[
            ("PORT", "8080"),
            ("API_BASE_URL", "v1/"),
            ("TAX_RATE", "0.0825"),
            ("MAILGUN_API_KEY", "key"),
            ("MAILGUN_DOMAIN", "mg.example.com"),
            ("MAILCHIMP_API_KEY", "abc-us6"),
            ("MAILCHIMP_LIST_ID", "list"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.api_base_url, "/v1");
        assert_eq!(cfg.tax_rate, Decimal::new(825, 4));
        // sender missing
        assert!(cfg.mailgun.is_none());
        assert_eq!(cfg.mailchimp.unwrap().list_id, "list");
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(load(&[("PORT", "http")]), Err(ConfigError::Invalid { var: "PORT", .. })));
        assert!(matches!(load(&[("TAX_RATE", "-0.1")]), Err(ConfigError::Invalid { var: "TAX_RATE", .. })));
        assert!(matches!(load(&[("TAX_RATE", "seven")]), Err(ConfigError::Invalid { var: "TAX_RATE", .. })));
    }
}
