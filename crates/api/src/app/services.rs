use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use storefront_infra::external::{
    LogMailer, LogMailingList, MailchimpClient, Mailer, MailgunMailer, MailingList,
};
use storefront_infra::{
    AppConfig, CartStore, CatalogStore, ContactStore, InMemoryStore, OrderStore, PostgresStore,
};
use storefront_sales::TaxRate;

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<dyn CatalogStore>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub mailer: Arc<dyn Mailer>,
    pub mailing_list: Arc<dyn MailingList>,
    pub tax_rate: TaxRate,
}

impl AppServices {
    /// In-memory stores with logging mail clients.
    pub fn in_memory(tax_rate: TaxRate) -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()), tax_rate)
    }

    /// All four repositories backed by one store value.
    pub fn from_store<S>(store: Arc<S>, tax_rate: TaxRate) -> Self
    where
        S: CatalogStore + CartStore + OrderStore + ContactStore + 'static,
    {
        Self {
            catalog: store.clone(),
            carts: store.clone(),
            orders: store.clone(),
            contacts: store,
            mailer: Arc::new(LogMailer),
            mailing_list: Arc::new(LogMailingList),
            tax_rate,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_mailing_list(mut self, mailing_list: Arc<dyn MailingList>) -> Self {
        self.mailing_list = mailing_list;
        self
    }
}

/// Wire stores and mail clients from configuration.
///
/// Postgres when `DATABASE_URL` is set, in-memory otherwise. Mail clients fall
/// back to logging implementations when their credentials are missing.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let tax_rate = TaxRate::new(config.tax_rate).context("invalid TAX_RATE")?;

    let services = match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresStore::connect(url)
                .await
                .context("failed to connect to postgres")?;
            store
                .ensure_schema()
                .await
                .context("failed to apply storefront schema")?;
            info!("using postgres store");
            AppServices::from_store(Arc::new(store), tax_rate)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory store");
            AppServices::in_memory(tax_rate)
        }
    };

    let services = match config.mailgun.clone() {
        Some(cfg) => {
            let mailer = MailgunMailer::new(cfg).context("failed to build mailgun client")?;
            services.with_mailer(Arc::new(mailer))
        }
        None => services,
    };

    let services = match config.mailchimp.clone() {
        Some(cfg) => {
            let list = MailchimpClient::new(cfg).context("failed to build mailchimp client")?;
            services.with_mailing_list(Arc::new(list))
        }
        None => services,
    };

    Ok(services)
}
