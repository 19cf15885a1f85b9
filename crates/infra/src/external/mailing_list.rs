use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{ExternalError, HTTP_TIMEOUT};
use crate::config::MailchimpConfig;

#[async_trait]
pub trait MailingList: Send + Sync {
    async fn subscribe(&self, email: &str) -> Result<(), ExternalError>;
}

#[derive(Debug, Serialize)]
struct MemberRequest<'a> {
    email_address: &'a str,
    status: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: String,
}

/// Mailchimp marketing API: adds members to one audience list.
pub struct MailchimpClient {
    client: Client,
    api_key: String,
    list_id: String,
    base_url: String,
}

/// The data center is the suffix of the API key (`<key>-us6` → `us6`).
fn data_center(api_key: &str) -> Option<&str> {
    api_key.rsplit_once('-').map(|(_, dc)| dc).filter(|dc| !dc.is_empty())
}

impl MailchimpClient {
    pub fn new(config: MailchimpConfig) -> Result<Self, ExternalError> {
        let dc = data_center(&config.api_key)
            .ok_or_else(|| ExternalError::Config("MAILCHIMP_API_KEY has no data center suffix".into()))?;
        let base_url = format!("https://{dc}.api.mailchimp.com");
        Self::with_base_url(config, base_url)
    }

    pub fn with_base_url(config: MailchimpConfig, base_url: impl Into<String>) -> Result<Self, ExternalError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: config.api_key,
            list_id: config.list_id,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MailingList for MailchimpClient {
    #[instrument(skip(self), err)]
    async fn subscribe(&self, email: &str) -> Result<(), ExternalError> {
        let url = format!("{}/3.0/lists/{}/members", self.base_url, self.list_id);
        let res = self
            .client
            .post(url)
            .basic_auth("storefront", Some(&self.api_key))
            .json(&MemberRequest {
                email_address: email,
                status: "subscribed",
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body: ErrorBody = res.json().await.unwrap_or_default();
            return Err(ExternalError::Rejected {
                service: "mailchimp",
                status: status.as_u16(),
                detail: body.detail,
            });
        }
        Ok(())
    }
}

/// Logs instead of subscribing. Used when Mailchimp is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailingList;

#[async_trait]
impl MailingList for LogMailingList {
    async fn subscribe(&self, email: &str) -> Result<(), ExternalError> {
        info!(email, "newsletter subscription recorded locally (mailing list disabled)");
        Ok(())
    }
}
