use anyhow::Context;

use carshop_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    carshop_observability::init();

    let config = ApiConfig::from_env();
    let app = carshop_api::app::build_app(&config)
        .await
        .context("failed to wire application services")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
