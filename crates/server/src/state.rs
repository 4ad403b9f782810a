use configs::AppConfig;
use store::StoreClient;

use crate::errors::ApiError;
use crate::fanout::Notifier;

/// Per-process state injected into every handler. Built once at startup from
/// the explicit config struct; no ambient globals.
#[derive(Clone)]
pub struct ServerState {
    pub store: Option<StoreClient>,
    pub notifier: Notifier,
}

impl ServerState {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        // The store client only exists when both settings are present; the
        // per-request guard reports the gap, not startup.
        let store = match (&cfg.store.url, &cfg.store.service_role_key) {
            (Some(url), Some(key)) => Some(
                StoreClient::new(url, key)
                    .map_err(|e| anyhow::anyhow!("building store client: {e}"))?,
            ),
            _ => None,
        };
        let notifier = Notifier::from_config(&cfg.webhooks)?;
        Ok(Self { store, notifier })
    }

    /// Request-time configuration guard, checked before any store access.
    pub fn require_store(&self) -> Result<&StoreClient, ApiError> {
        self.store.as_ref().ok_or(ApiError::MissingStoreConfig)
    }
}
