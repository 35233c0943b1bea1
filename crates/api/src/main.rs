use std::sync::Arc;

use anyhow::Context;

use lostfound_api::app::{build_app, services::build_services};
use lostfound_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lostfound_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let services = build_services(&config).await?;

    if let Some((email, password)) = &config.bootstrap_admin {
        services
            .bootstrap_admin(email, password)
            .await
            .context("failed to create bootstrap admin")?;
    }

    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
