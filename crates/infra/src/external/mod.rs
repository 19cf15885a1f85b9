//! Outbound services: transactional mail and the newsletter list.

use std::time::Duration;

use thiserror::Error;

pub mod mailer;
pub mod mailing_list;

pub use mailer::{EmailTemplate, LogMailer, Mailer, MailgunMailer};
pub use mailing_list::{LogMailingList, MailchimpClient, MailingList};

pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{service} rejected the request ({status}): {detail}")]
    Rejected {
        service: &'static str,
        status: u16,
        detail: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}
