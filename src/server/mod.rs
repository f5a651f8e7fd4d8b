//! # HTTP Server
//!
//! A thin axum shell around [`TileService`](crate::service::TileService).

pub mod config;
pub mod response;
pub mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::Error;
use crate::service::{ConnectionSource, TileService};

pub use config::ServerConfig;
pub use response::MVT_CONTENT_TYPE;

pub struct TileServer {
    config: ServerConfig,
    router: Router,
}

impl TileServer {
    pub fn new<P>(config: ServerConfig, service: TileService<P>) -> Self
    where
        P: ConnectionSource + 'static,
    {
        let router = routes::tile_routes(Arc::new(service))
            .layer(cors_layer(&config))
            .layer(TraceLayer::new_for_http());

        Self { config, router }
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serves requests until `shutdown` resolves, then waits for in-flight
    /// requests to finish.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|_| {
            Error::InvalidConfig(format!("invalid listen address {}", self.config.socket_addr()))
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "serving vector tiles");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
