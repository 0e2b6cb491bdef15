use tracing::info;
use tracing_subscriber::EnvFilter;

use vg_service::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServiceConfig::from_env()?;
    info!(
        addr = %config.bind_addr(),
        origins = ?config.allowed_origins,
        rate_limit = config.rate_limit_max_requests,
        "Starting Vigil risk service"
    );

    vg_service::run(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    })
    .await?;

    info!("Vigil risk service stopped");
    Ok(())
}
