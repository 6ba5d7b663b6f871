use std::sync::Arc;

use anyhow::Context;

use warehouse_api::app::{self, AppServices};
use warehouse_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warehouse_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let services = AppServices::build(&config)
        .await
        .context("failed to connect to the database")?;
    services
        .ensure_schema()
        .await
        .context("failed to provision the catalog schema")?;

    let app = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
