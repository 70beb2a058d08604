use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{ConnectInfo, State};
use axum::response::{IntoResponse, Response};
use log::{error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::client::handle_client;
use crate::config::ServerConfig;
use crate::error::RelayServerError;
use crate::session::{SessionRegistry, SharedRegistry};

/// Body of the liveness response served to plain HTTP requests.
pub const LIVENESS_BODY: &str = "WebSocket server is running";

/// State shared with every request handler.
#[derive(Clone)]
struct AppState {
    registry: SharedRegistry,
    config: Arc<ServerConfig>,
}

pub struct Server {
    registry: SharedRegistry,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listening socket described by `config`.
    pub async fn bind(config: ServerConfig) -> Result<Self, RelayServerError> {
        let socket = config.listen_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            registry: SessionRegistry::shared(),
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Serves WebSocket upgrades and liveness requests until the listener fails.
    pub async fn start(self) -> Result<(), RelayServerError> {
        info!("Starting lobby relay on {}", self.local_addr()?);

        let app = build_router(self.registry, self.config);
        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}

/// Every path answers: upgrade requests become relay connections, anything
/// else gets the liveness text.
fn build_router(registry: SharedRegistry, config: Arc<ServerConfig>) -> Router {
    Router::new()
        .fallback(serve_request)
        .with_state(AppState { registry, config })
}

async fn serve_request(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Ok(ws) = upgrade else {
        return LIVENESS_BODY.into_response();
    };

    let limit = state.config.max_message_bytes;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| handle_client(socket, client_addr, state.registry, state.config))
        .into_response()
}
