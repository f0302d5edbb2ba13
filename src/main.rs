use std::sync::Arc;

use artschool_admin::config::ServerConfig;
use artschool_admin::gateway::{PgGateway, SharedGateway};
use artschool_admin::handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = ServerConfig::load();

    let gateway = match PgGateway::connect(
        &config.database_url,
        config.max_connections,
        config.acquire_timeout(),
    )
    .await
    {
        Ok(gateway) => gateway,
        Err(err) => {
            log::error!("Failed to connect to the database: {}", err);
            std::process::exit(1);
        }
    };
    log::info!("Connected to the database");

    let gateway: SharedGateway = Arc::new(gateway);
    let app = handlers::router(gateway, config.schedule_policy());

    log::info!("Starting Artschool Admin HTTP Server on http://{}", config.bind);
    axum::Server::bind(&config.bind)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", err);
    }
}
