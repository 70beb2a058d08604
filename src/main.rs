//! Lobby relay - Entry Point
//!
//! Pairs two WebSocket peers under a shared six-digit code and relays their messages.

use log::{error, info};
use std::process;

use lobby_relay::Server;
use lobby_relay::config::ServerConfig;
use lobby_relay::error::RelayServerError;
use lobby_relay::utils::logging::setup_logging;

#[tokio::main]
async fn main() {
    setup_logging();

    if let Err(e) = run().await {
        error!("Lobby relay stopped: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), RelayServerError> {
    let config = ServerConfig::load()?;

    info!("Launching lobby relay...");
    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.start() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
