use std::time::Duration;

use chrono::Utc;
use configs::WebhooksConfig;
use serde_json::{json, Value};
use store::Entry;
use tracing::{debug, warn};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct WebhookTarget {
    url: String,
    secret: String,
}

/// Best-effort fan-out to the content-sync and page-revalidation webhooks.
///
/// Runs on a detached task so the Create response never waits on, or fails
/// with, a downstream call. Tokio keeps spawned tasks alive after the
/// handler returns; the request timeout bounds how long one can linger.
/// Delivery is at-most-once: any error or non-success status is logged and
/// dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    sync: Option<WebhookTarget>,
    revalidate: Option<WebhookTarget>,
}

impl Notifier {
    /// A target is only active when both its URL and secret are configured.
    pub fn from_config(cfg: &WebhooksConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        let sync = cfg
            .sync_pair()
            .map(|(url, secret)| WebhookTarget { url, secret });
        let revalidate = cfg
            .revalidate_pair()
            .map(|(url, secret)| WebhookTarget { url, secret });
        Ok(Self { http, sync, revalidate })
    }

    /// Fire both notifications for a newly created entry on one detached
    /// task. The two targets are independent of each other.
    pub fn spawn_notify(&self, entry: &Entry) -> tokio::task::JoinHandle<()> {
        let notifier = self.clone();
        let title = entry.title.clone();
        let description = entry.description.clone();
        tokio::spawn(async move {
            tokio::join!(
                notifier.notify_sync(&title, description.as_deref()),
                notifier.notify_revalidate(),
            );
        })
    }

    async fn notify_sync(&self, title: &str, description: Option<&str>) {
        let Some(target) = &self.sync else { return };
        let payload = json!({
            "title": title,
            "description": description,
            "timestamp": Utc::now().to_rfc3339(),
        });
        self.post(target, "x-webhook-secret", &payload, "sync").await;
    }

    async fn notify_revalidate(&self) {
        let Some(target) = &self.revalidate else { return };
        let payload = json!({ "path": "/" });
        self.post(target, "x-revalidate-secret", &payload, "revalidate")
            .await;
    }

    async fn post(&self, target: &WebhookTarget, secret_header: &str, payload: &Value, kind: &str) {
        let result = self
            .http
            .post(&target.url)
            .header(secret_header, &target.secret)
            .json(payload)
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!(kind, status = %resp.status(), "webhook delivered");
            }
            Ok(resp) => {
                warn!(kind, status = %resp.status(), "webhook rejected; notification dropped");
            }
            Err(e) => {
                warn!(kind, error = %e, "webhook call failed; notification dropped");
            }
        }
    }
}
