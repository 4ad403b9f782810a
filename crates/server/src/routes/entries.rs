use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::state::ServerState;

/// GET /entries: every entry, newest first. Ordering comes from the store.
pub async fn list_entries(State(state): State<ServerState>) -> Result<Json<Value>, ApiError> {
    let store = state.require_store()?;
    let entries = store.list_all().await?;
    Ok(Json(json!({ "data": entries })))
}

/// POST /entries: validate, insert, fan out, answer 201 with the persisted
/// row.
pub async fn create_entry(
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let store = state.require_store()?;

    let payload = parse_payload(&body);
    let (title, description) = extract_fields(&payload);
    if title.is_empty() {
        return Err(ApiError::TitleRequired);
    }

    let entry = store.insert_one(&title, description.as_deref()).await?;

    // Detached on purpose: the response must not wait on the webhooks.
    let _ = state.notifier.spawn_notify(&entry);

    Ok((StatusCode::CREATED, Json(json!({ "data": entry }))))
}

/// A body that is not valid JSON counts as absent, never as a parse error;
/// validation then reports the missing title.
fn parse_payload(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// Duck-typed field extraction: a field only counts when it is a JSON
/// string. `title` is trimmed; any other shape of `description` (missing,
/// null, number, object) uniformly becomes null.
fn extract_fields(payload: &Value) -> (String, Option<String>) {
    let title = payload
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let description = payload
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    (title, description)
}
