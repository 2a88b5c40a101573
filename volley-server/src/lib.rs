use axum::{
    body::Bytes,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;

/// Body returned for requests that carry no payload of their own.
pub const GREETING: &str = "Hello from volley-server!";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

/// Echo target for load runs: requests with a body get the body back,
/// everything else gets a fixed greeting. Any method, any path.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Create the application router
    pub fn create_router() -> Router {
        Router::new()
            .route("/", any(handle_echo))
            .fallback(handle_echo)
    }

    /// Run the server, signalling `ready_tx` with the bound address once
    /// accepting connections
    pub async fn run(
        self,
        ready_tx: tokio::sync::oneshot::Sender<SocketAddr>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app = Self::create_router();
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Handler for every route: echo a non-empty body, greet otherwise.
pub async fn handle_echo(body: Bytes) -> Response {
    if body.is_empty() {
        GREETING.into_response()
    } else {
        body.into_response()
    }
}
