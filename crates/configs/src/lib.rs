use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8081, worker_threads: None }
    }
}

/// Connection settings for the external entries datastore.
///
/// Both fields stay optional here: a missing value is reported per-request
/// by the HTTP layer, not at startup.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub service_role_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { origin: "*".into() }
    }
}

/// Downstream webhook targets. Each URL/secret pair only activates the
/// fan-out when both members are present.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebhooksConfig {
    #[serde(default)]
    pub sync_url: Option<String>,
    #[serde(default)]
    pub sync_secret: Option<String>,
    #[serde(default)]
    pub revalidate_url: Option<String>,
    #[serde(default)]
    pub revalidate_secret: Option<String>,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load from config.toml when present, otherwise start from defaults and
    /// let the environment fill everything in.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.normalize_from_env();
        self.cors.normalize_from_env();
        self.webhooks.normalize_from_env();
        self.webhooks.collapse_partial_pairs();
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn normalize_from_env(&mut self) {
        fill_from_env(&mut self.url, "STORE_URL");
        fill_from_env(&mut self.service_role_key, "SERVICE_ROLE_KEY");
    }
}

impl CorsConfig {
    pub fn normalize_from_env(&mut self) {
        if self.origin.trim().is_empty() {
            self.origin = "*".to_string();
        }
        if let Ok(origin) = std::env::var("CORS_ORIGIN") {
            if !origin.trim().is_empty() {
                self.origin = origin;
            }
        }
    }
}

impl WebhooksConfig {
    pub fn normalize_from_env(&mut self) {
        fill_from_env(&mut self.sync_url, "SYNC_WEBHOOK_URL");
        fill_from_env(&mut self.sync_secret, "SYNC_WEBHOOK_SECRET");
        fill_from_env(&mut self.revalidate_url, "REVALIDATE_URL");
        fill_from_env(&mut self.revalidate_secret, "REVALIDATE_SECRET");
    }

    /// A pair with only one member set cannot be used; switch it off rather
    /// than failing startup.
    pub fn collapse_partial_pairs(&mut self) {
        if self.sync_url.is_some() != self.sync_secret.is_some() {
            warn!("sync webhook half-configured (url/secret); disabling sync notifications");
            self.sync_url = None;
            self.sync_secret = None;
        }
        if self.revalidate_url.is_some() != self.revalidate_secret.is_some() {
            warn!("revalidate webhook half-configured (url/secret); disabling revalidate notifications");
            self.revalidate_url = None;
            self.revalidate_secret = None;
        }
    }

    pub fn sync_pair(&self) -> Option<(String, String)> {
        match (&self.sync_url, &self.sync_secret) {
            (Some(url), Some(secret)) => Some((url.clone(), secret.clone())),
            _ => None,
        }
    }

    pub fn revalidate_pair(&self) -> Option<(String, String)> {
        match (&self.revalidate_url, &self.revalidate_secret) {
            (Some(url), Some(secret)) => Some((url.clone(), secret.clone())),
            _ => None,
        }
    }
}

/// Fill an unset or blank optional field from an environment variable.
fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.as_deref().map_or(false, |v| !v.trim().is_empty()) {
        return;
    }
    *slot = None;
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            *slot = Some(value);
        }
    }
}
