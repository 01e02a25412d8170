//! Web layer module
//!
//! HTTP interface to the content filter, for hosts that render pages in
//! another process. Also serves the browser module the placeholders need.

use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, filter::ContentFilter, repositories::PlaylistRepository};

pub mod handlers;
pub mod responses;

pub use responses::{handle_error, handle_result, ApiResponse};

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(state: AppState) -> Result<Self> {
        let addr: SocketAddr =
            format!("{}:{}", state.config.web.host, state.config.web.port).parse()?;
        Ok(Self {
            app: Self::create_router(state),
            addr,
        })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health_check))
            .nest("/api/v1", Self::api_v1_routes())
            .route("/static/*path", get(handlers::serve_static_asset))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    fn api_v1_routes() -> Router<AppState> {
        Router::new()
            .route("/filter", post(handlers::filter_text))
            .route("/resolve", post(handlers::resolve_href))
            .route(
                "/playlists/:scope",
                get(handlers::list_playlists).put(handlers::upsert_playlist),
            )
            .route("/playlists/:scope/:name", delete(handlers::delete_playlist))
    }

    /// Start the web server
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub filter: Arc<ContentFilter>,
    /// `None` when running without playlist storage
    pub playlists: Option<PlaylistRepository>,
}

impl AppState {
    pub fn new(
        config: Config,
        filter: ContentFilter,
        playlists: Option<PlaylistRepository>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            filter: Arc::new(filter),
            playlists,
        }
    }
}
