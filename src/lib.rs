pub mod api;
pub mod config;
pub mod identity;
pub mod middleware;
pub mod movie;
pub mod pages;
pub mod server;
pub mod storage;
pub mod swipe;
pub mod util;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::identity::UserIdProvider;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::swipe::SwipeSession;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Movie API error: {0}")]
    Api(#[from] api::ApiError),
    #[error("Server error: {0}")]
    Server(String),
}

pub async fn run(config_path: &str, debug_logs: bool) -> Result<(), ServerError> {
    let mut config = config::Config::from_file(config_path)?;
    config.debug_logs = debug_logs;

    info!("Using config file: {}", config_path);
    info!("Movie source: {:?}", config.api.source);
    if debug_logs {
        info!("Debug logging enabled");
    }

    let data_path = config.get_data_path();
    let store: Arc<dyn KeyValueStore> = match FileStore::open(&data_path) {
        Ok(store) => {
            info!("Storing session data in {}", data_path.display());
            Arc::new(store)
        }
        Err(e) => {
            warn!(error = %e, "Local storage unavailable, session data will not persist");
            Arc::new(MemoryStore::new())
        }
    };

    let identity = Arc::new(UserIdProvider::new(Some(store.clone())));
    info!("User id: {}", identity.user_id());

    let api = api::build_client(&config.api)?;
    let session = SwipeSession::new(api.clone(), store, identity.clone(), config.swipe.clone());

    // Fetch the first batch while the listener comes up.
    let initial = session.clone();
    tokio::spawn(async move { initial.start().await });

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = &config.listen.port;
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let tls = match (&config.listen.tlscert, &config.listen.tlskey) {
        (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
        _ => None,
    };

    let state = server::AppState::new(config, api, identity, session);
    let app = server::build_app(state);

    match tls {
        Some((cert_path, key_path)) => {
            info!("Loading TLS certificate from {}", cert_path);
            info!("Loading TLS key from {}", key_path);

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert_path, &key_path)
                .await
                .map_err(|e| ServerError::Server(format!("Failed to load TLS config: {}", e)))?;

            info!("Serving HTTPS on {}", addr);

            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await
                .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
        }
        None => {
            info!("Serving HTTP on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

            axum::serve(listener, app.into_make_service())
                .await
                .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
        }
    }

    Ok(())
}
