use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;

use common::types::Health;

use crate::cors::{cors_middleware, CorsSettings, ALLOW_METHODS};
use crate::routes::entries::{create_entry, list_entries};
use crate::state::ServerState;

pub mod entries;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// 405 with an `Allow` header for any unsupported method on /entries.
async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOW_METHODS)],
        Json(serde_json::json!({"error": "Method not allowed"})),
    )
        .into_response()
}

/// Only literal GET and POST reach the entries handlers. axum would serve
/// HEAD through the GET handler, so the gate has to be explicit; OPTIONS is
/// short-circuited before this layer.
async fn allowed_methods(req: Request, next: Next) -> Response {
    if req.method() == Method::GET || req.method() == Method::POST {
        return next.run(req).await;
    }
    method_not_allowed().await
}

/// Build the full application router: health, the entries endpoint, CORS
/// handling, and request tracing.
pub fn build_router(cors: CorsSettings, state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/entries",
            get(list_entries)
                .post(create_entry)
                .layer(middleware::from_fn(allowed_methods)),
        )
        .with_state(state)
        // OPTIONS short-circuits inside the middleware, before routing
        .layer(middleware::from_fn_with_state(
            Arc::new(cors),
            cors_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
