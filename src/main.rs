//! FileShelf - Entry Point
//!
//! A browser-based personal file manager with per-user storage roots.

use env_logger;
use log::{error, info};

use fileshelf::config::AppConfig;
use fileshelf::server::Server;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching FileShelf...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            panic!("Server startup failed on configuration: {}", e);
        }
    };

    let server = Server::new(config).await;
    server.start().await;
}
