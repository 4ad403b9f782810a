use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use store::StoreError;
use thiserror::Error;
use tracing::error;

/// Request-level failures, all rendered as a `{"error": msg}` JSON body at
/// the single top-level boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing STORE_URL or SERVICE_ROLE_KEY")]
    MissingStoreConfig,
    #[error("Invalid payload: 'title' is required")]
    TitleRequired,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::TitleRequired => StatusCode::BAD_REQUEST,
            Self::MissingStoreConfig | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.to_string();
        if status.is_server_error() {
            error!(error = %msg, "request failed");
        }
        (status, Json(serde_json::json!({"error": msg}))).into_response()
    }
}
