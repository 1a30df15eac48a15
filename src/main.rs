use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};

use homefinder::{config, logger::setup_logger, web};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logger
    setup_logger()?;

    let config = config::read_config();
    let state = web::AppState::from_config(config).await;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(err) => {
                // Keep serving without graceful shutdown
                error!("Failed to listen for shutdown signal: {:?}", err);
                std::future::pending::<()>().await;
            }
        }
    });

    web::start_http_server(state, shutdown_rx).await
}
