use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};

use storefront_core::OrderId;

use super::{ExternalError, HTTP_TIMEOUT};
use crate::config::MailgunConfig;

const STORE_NAME: &str = "Elliot Store";

/// Transactional messages the store sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    OrderConfirmation { order: OrderId, name: Option<String> },
    NewsletterSubscription,
    Contact,
}

impl EmailTemplate {
    pub fn kind(&self) -> &'static str {
        match self {
            EmailTemplate::OrderConfirmation { .. } => "order-confirmation",
            EmailTemplate::NewsletterSubscription => "newsletter-subscription",
            EmailTemplate::Contact => "contact",
        }
    }

    /// Subject and plain-text body.
    pub fn render(&self) -> (String, String) {
        match self {
            EmailTemplate::OrderConfirmation { order, name } => {
                let greeting = match name {
                    Some(name) => format!("Hi {name},"),
                    None => "Hi,".to_string(),
                };
                (
                    format!("Order Confirmation {order}"),
                    format!(
                        "{greeting}\n\nThank you for your order! We've received order {order} \
                         and will let you know when it ships.\n"
                    ),
                )
            }
            EmailTemplate::NewsletterSubscription => (
                "Newsletter Subscription".to_string(),
                format!("You are receiving this email because you subscribed to the {STORE_NAME} newsletter.\n"),
            ),
            EmailTemplate::Contact => (
                "Contact Us".to_string(),
                "We received your message! Our team will contact you soon.\n".to_string(),
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, template: EmailTemplate) -> Result<(), ExternalError>;
}

/// Sends through the Mailgun messages API.
pub struct MailgunMailer {
    client: Client,
    config: MailgunConfig,
    base_url: String,
}

impl MailgunMailer {
    pub fn new(config: MailgunConfig) -> Result<Self, ExternalError> {
        Self::with_base_url(config, "https://api.mailgun.net")
    }

    pub fn with_base_url(config: MailgunConfig, base_url: impl Into<String>) -> Result<Self, ExternalError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            config,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    #[instrument(skip(self, template), fields(kind = template.kind()), err)]
    async fn send(&self, to: &str, template: EmailTemplate) -> Result<(), ExternalError> {
        let (subject, text) = template.render();
        let from = format!("{STORE_NAME} <{}>", self.config.sender);
        let url = format!("{}/v3/{}/messages", self.base_url, self.config.domain);

        let res = self
            .client
            .post(url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&[("from", from.as_str()), ("to", to), ("subject", subject.as_str()), ("text", text.as_str())])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(ExternalError::Rejected {
                service: "mailgun",
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }
}

/// Logs instead of sending. Used when Mailgun is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, template: EmailTemplate) -> Result<(), ExternalError> {
        let (subject, _) = template.render();
        info!(to, kind = template.kind(), subject = %subject, "email not sent (mail delivery disabled)");
        Ok(())
    }
}
