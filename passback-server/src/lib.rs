//! passback-server - HTTP surface for the grade passback core
//!
//! This crate owns the [`AppState`] wrapping the reconciliation
//! [`Orchestrator`](passback_core::Orchestrator) and exposes it over
//! axum: the update endpoint the embedded exercise calls, the trusted
//! launch intake, and a small admin/debug surface.

mod error;
pub mod http;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use passback_core::{AgsClient, PassbackConfig};

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;

/// The main passback server
pub struct PassbackServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl PassbackServer {
    /// Create a new server around a fresh reconciliation core
    pub fn new(config: ServerConfig, core: PassbackConfig, client: Arc<dyn AgsClient>) -> Self {
        Self {
            config,
            state: Arc::new(AppState::new(core, client)),
        }
    }

    /// Create a server with custom state (embedding, testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("passback server listening on {}", addr);

        let state = Arc::clone(&self.state);
        let router = create_router(state.clone());
        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| ServerError::Internal(e.to_string()));

        // Clear sessions and cancel TTL timers on the way out.
        state.orchestrator.shutdown().await;
        result
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7435,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "0.0.0.0:7435")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
