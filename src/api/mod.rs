mod error;
mod handlers;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::core::TabulaError;
use crate::service::TabulaService;

pub struct TabulaApi {
    service: Arc<TabulaService>,
}

impl TabulaApi {
    pub fn new(service: TabulaService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/v1/schemas", get(handlers::list_schemas))
            .route(
                "/api/v1/schemas/{schema}/tables",
                get(handlers::list_tables),
            )
            .route("/api/v1/session", get(handlers::render))
            .route("/api/v1/session/table", put(handlers::select_table))
            .route(
                "/api/v1/session/filter",
                post(handlers::apply_filter).delete(handlers::clear_filter),
            )
            .route("/api/v1/session/rollback", post(handlers::rollback))
            .route("/api/v1/session/commit", post(handlers::commit))
            .route("/api/v1/session/import", post(handlers::import))
            .route("/api/v1/session/export", get(handlers::export))
            .layer(TraceLayer::new_for_http())
            .with_state(self.service.clone())
    }

    pub async fn serve(self, addr: &str) -> Result<(), TabulaError> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| TabulaError::IoError(format!("binding to {addr}: {e}")))?;
        axum::serve(listener, self.router())
            .await
            .map_err(|e| TabulaError::IoError(format!("serving: {e}")))?;
        Ok(())
    }
}
