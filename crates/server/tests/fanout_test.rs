use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use configs::{AppConfig, StoreConfig, WebhooksConfig};
use serde_json::{json, Value};
use server::cors::CorsSettings;
use server::routes::build_router;
use server::state::ServerState;
use tokio::net::TcpListener;

/// Minimal datastore stub: every insert succeeds (or fails) uniformly.
#[derive(Clone)]
struct StubStore {
    fail_inserts: bool,
}

async fn stub_insert(State(s): State<StubStore>, Json(body): Json<Value>) -> Response {
    if s.fail_inserts {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "insert exploded"})),
        )
            .into_response();
    }
    let row = json!({
        "id": 1,
        "title": body["title"],
        "description": body["description"],
        "timestamp": "2026-08-30T10:00:00Z",
    });
    (StatusCode::CREATED, Json(json!([row]))).into_response()
}

/// Downstream webhook receiver recording every hit it takes.
#[derive(Clone)]
struct Recorder {
    hits: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
    status: StatusCode,
    delay: Duration,
}

impl Recorder {
    fn new() -> Self {
        Self { hits: Arc::new(Mutex::new(Vec::new())), status: StatusCode::OK, delay: Duration::ZERO }
    }

    fn with_status(status: StatusCode) -> Self {
        Self { status, ..Self::new() }
    }

    fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Self::new() }
    }

    fn hit_count(&self) -> usize {
        self.hits.lock().unwrap().len()
    }
}

async fn record(State(r): State<Recorder>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !r.delay.is_zero() {
        tokio::time::sleep(r.delay).await;
    }
    r.hits.lock().unwrap().push((headers, body));
    r.status.into_response()
}

async fn serve(app: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server error: {e}");
        }
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_stub_store(fail_inserts: bool) -> anyhow::Result<String> {
    let app = Router::new()
        .route("/rest/v1/entries", post(stub_insert))
        .with_state(StubStore { fail_inserts });
    serve(app).await
}

async fn spawn_recorder(rec: Recorder) -> anyhow::Result<String> {
    let app = Router::new().route("/", post(record)).with_state(rec);
    serve(app).await
}

async fn spawn_app(store_base: &str, webhooks: WebhooksConfig) -> anyhow::Result<String> {
    let mut cfg = AppConfig::default();
    cfg.store = StoreConfig {
        url: Some(store_base.to_string()),
        service_role_key: Some("test-svc-key".into()),
    };
    cfg.webhooks = webhooks;
    let state = ServerState::from_config(&cfg)?;
    let app = build_router(CorsSettings::new(&cfg.cors.origin), state);
    serve(app).await
}

/// Poll until the recorder has seen `want` hits; the fan-out is detached so
/// there is nothing to await directly.
async fn wait_for_hits(rec: &Recorder, want: usize) -> bool {
    for _ in 0..120 {
        if rec.hit_count() >= want {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

async fn create_entry(base: &str, body: Value) -> anyhow::Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .post(format!("{base}/entries"))
        .json(&body)
        .send()
        .await?)
}

#[tokio::test]
async fn create_notifies_both_webhooks_exactly_once() -> anyhow::Result<()> {
    let sync_rec = Recorder::new();
    let reval_rec = Recorder::new();
    let sync_base = spawn_recorder(sync_rec.clone()).await?;
    let reval_base = spawn_recorder(reval_rec.clone()).await?;
    let store_base = spawn_stub_store(false).await?;

    let base = spawn_app(
        &store_base,
        WebhooksConfig {
            sync_url: Some(format!("{sync_base}/")),
            sync_secret: Some("sync-secret".into()),
            revalidate_url: Some(format!("{reval_base}/")),
            revalidate_secret: Some("reval-secret".into()),
        },
    )
    .await?;

    let res = create_entry(&base, json!({"title": "hello", "description": "world"})).await?;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    assert!(wait_for_hits(&sync_rec, 1).await, "sync webhook never called");
    assert!(wait_for_hits(&reval_rec, 1).await, "revalidate webhook never called");

    // Settle, then confirm exactly one call each.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(sync_rec.hit_count(), 1);
    assert_eq!(reval_rec.hit_count(), 1);

    let (headers, body) = sync_rec.hits.lock().unwrap()[0].clone();
    assert_eq!(headers.get("x-webhook-secret").unwrap(), "sync-secret");
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(body["title"], "hello");
    assert_eq!(body["description"], "world");
    assert!(body["timestamp"].is_string());

    let (headers, body) = reval_rec.hits.lock().unwrap()[0].clone();
    assert_eq!(headers.get("x-revalidate-secret").unwrap(), "reval-secret");
    assert_eq!(body, json!({"path": "/"}));
    Ok(())
}

#[tokio::test]
async fn half_configured_webhook_pair_sends_nothing() -> anyhow::Result<()> {
    let sync_rec = Recorder::new();
    let sync_base = spawn_recorder(sync_rec.clone()).await?;
    let store_base = spawn_stub_store(false).await?;

    // URL without secret: the pair never activates.
    let base = spawn_app(
        &store_base,
        WebhooksConfig {
            sync_url: Some(format!("{sync_base}/")),
            sync_secret: None,
            revalidate_url: None,
            revalidate_secret: None,
        },
    )
    .await?;

    let res = create_entry(&base, json!({"title": "quiet"})).await?;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(sync_rec.hit_count(), 0);
    Ok(())
}

#[tokio::test]
async fn failed_insert_triggers_no_notifications() -> anyhow::Result<()> {
    let sync_rec = Recorder::new();
    let reval_rec = Recorder::new();
    let sync_base = spawn_recorder(sync_rec.clone()).await?;
    let reval_base = spawn_recorder(reval_rec.clone()).await?;
    let store_base = spawn_stub_store(true).await?;

    let base = spawn_app(
        &store_base,
        WebhooksConfig {
            sync_url: Some(format!("{sync_base}/")),
            sync_secret: Some("sync-secret".into()),
            revalidate_url: Some(format!("{reval_base}/")),
            revalidate_secret: Some("reval-secret".into()),
        },
    )
    .await?;

    let res = create_entry(&base, json!({"title": "doomed"})).await?;
    assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "insert exploded");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(sync_rec.hit_count(), 0);
    assert_eq!(reval_rec.hit_count(), 0);
    Ok(())
}

#[tokio::test]
async fn slow_webhook_does_not_delay_the_create_response() -> anyhow::Result<()> {
    let slow_rec = Recorder::with_delay(Duration::from_secs(1));
    let slow_base = spawn_recorder(slow_rec.clone()).await?;
    let store_base = spawn_stub_store(false).await?;

    let base = spawn_app(
        &store_base,
        WebhooksConfig {
            sync_url: Some(format!("{slow_base}/")),
            sync_secret: Some("sync-secret".into()),
            revalidate_url: None,
            revalidate_secret: None,
        },
    )
    .await?;

    let started = Instant::now();
    let res = create_entry(&base, json!({"title": "fast"})).await?;
    let elapsed = started.elapsed();

    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    assert!(
        elapsed < Duration::from_millis(700),
        "create waited on the webhook: {elapsed:?}"
    );

    // The detached task still completes after the response.
    assert!(wait_for_hits(&slow_rec, 1).await, "slow webhook never called");
    Ok(())
}

#[tokio::test]
async fn webhook_server_errors_are_swallowed() -> anyhow::Result<()> {
    let sync_rec = Recorder::with_status(StatusCode::INTERNAL_SERVER_ERROR);
    let sync_base = spawn_recorder(sync_rec.clone()).await?;
    let store_base = spawn_stub_store(false).await?;

    let base = spawn_app(
        &store_base,
        WebhooksConfig {
            sync_url: Some(format!("{sync_base}/")),
            sync_secret: Some("sync-secret".into()),
            revalidate_url: None,
            revalidate_secret: None,
        },
    )
    .await?;

    for title in ["one", "two"] {
        let res = create_entry(&base, json!({"title": title})).await?;
        assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    }

    assert!(wait_for_hits(&sync_rec, 2).await, "second create did not notify");
    Ok(())
}
