//! API server initialization

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use super::middleware::{self, AllowedOrigins};
use super::routes::{ack, groups, health, pending, streams, subscribe};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Binds the listener, serves the router, and returns `CoreApp`
    /// for graceful shutdown once the listener has stopped accepting
    /// connections.
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(host.parse()?, port);

        let router = Router::new()
            .route("/healthz", get(health::health))
            .route("/streams", get(streams::list_streams))
            .route(
                "/streams/{name}",
                put(streams::create_stream)
                    .delete(streams::delete_stream)
                    .post(streams::publish),
            )
            .route("/streams/{name}/messages", get(subscribe::subscribe))
            .route(
                "/streams/{name}/messages/pending",
                get(pending::list_pending),
            )
            .route(
                "/groups/{name}",
                put(groups::create_group)
                    .get(groups::get_group)
                    .delete(groups::delete_group),
            )
            .route("/ack", post(ack::ack))
            .with_state(app.broker.clone())
            .fallback(middleware::handle_404)
            .layer(CompressionLayer::new())
            .layer(middleware::cors(&allowed_origins))
            .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT));

        let listener = TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}
