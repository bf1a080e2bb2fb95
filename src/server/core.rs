use log::{error, info, warn};
use rusqlite::Connection;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::auth::credentials;
use crate::config::AppConfig;
use crate::server::state::AppState;
use crate::web;

/// How often expired sessions are swept from the registry.
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(600);

pub struct Server {
    state: Arc<AppState>,
    listener: TcpListener,
}

impl Server {
    pub async fn new(config: AppConfig) -> Self {
        if let Err(e) = std::fs::create_dir_all(config.user_files_path()) {
            warn!("Failed to create storage root directory: {}", e);
        } else {
            info!("Storage root directory: {}", config.user_files_dir);
        }

        let db = match Connection::open(&config.database_path) {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to open database {}: {}", config.database_path, e);
                panic!(
                    "Server startup failed on database {}: {}",
                    config.database_path, e
                );
            }
        };
        if let Err(e) = credentials::run_migrations(&db) {
            error!("Failed to run database migrations: {}", e);
            panic!("Server startup failed on migrations: {}", e);
        }

        let addr = config.listen_addr();
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => {
                info!("Server bound to {}", addr);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", addr, e);
                panic!("Server startup failed on socket {}: {}", addr, e);
            }
        };

        Self {
            state: Arc::new(AppState::new(config, db)),
            listener,
        }
    }

    /// Serves requests until the process is stopped.
    pub async fn start(self) {
        info!(
            "Starting FileShelf on {}",
            self.state.config.listen_addr()
        );

        // Sweep expired sessions in the background
        let registry = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                registry.sessions.prune_expired();
            }
        });

        let router = web::build_router(Arc::clone(&self.state));
        if let Err(e) = axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        {
            error!("Server error: {}", e);
        }
    }
}
