use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// CORS header set computed once from config at startup and stamped on every
/// response.
#[derive(Debug, Clone)]
pub struct CorsSettings {
    allow_origin: HeaderValue,
}

impl CorsSettings {
    pub fn new(origin: &str) -> Self {
        let allow_origin =
            HeaderValue::from_str(origin).unwrap_or_else(|_| HeaderValue::from_static("*"));
        Self { allow_origin }
    }

    fn apply(&self, response: &mut Response) {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
    }
}

/// Answer OPTIONS directly, on any path, before any credential or store
/// access; stamp CORS headers on everything else.
pub async fn cors_middleware(
    State(cors): State<Arc<CorsSettings>>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = (StatusCode::OK, "ok").into_response();
        cors.apply(&mut response);
        return response;
    }
    let mut response = next.run(req).await;
    cors.apply(&mut response);
    response
}
