use std::sync::Arc;

use anyhow::Context;

use storefront_api::app::{build_app, build_services};
use storefront_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = Arc::new(build_services(&config).await?);

    let app = build_app(services, &config.jwt_secret, &config.api_base_url);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        base = %config.api_base_url,
        tax_rate = %config.tax_rate,
        "storefront api listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
