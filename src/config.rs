//! Configuration loader and validator for the outreach tracker client.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub health: HealthSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

/// Remote backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendSettings {
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Identity material used to build the authenticated and admin-token actors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSettings {
    #[serde(default)]
    pub identity: Option<IdentitySettings>,
    #[serde(default)]
    pub admin_token: Option<String>,
}

/// A signed-in identity: its principal and the bearer token proving it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentitySettings {
    pub principal: String,
    pub token: String,
}

/// Liveness probe tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthSettings {
    pub stale_after_ms: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSettings {
    pub page_size: u64,
}

fn default_user_agent() -> String {
    "outreach-tracker/0.1".to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            stale_after_ms: 10_000,
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 5_000,
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}

impl HealthSettings {
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    /// Delay before retry number `attempt` (0-based): `min(base * 2^attempt, max)`.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

impl Config {
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.backend.base_url)
            .map_err(|_| ConfigError::Invalid("backend.base_url must be an absolute URL"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.backend.timeout_ms)
    }

    /// Apply `OUTREACH_BACKEND_URL` / `OUTREACH_ADMIN_TOKEN` overrides, then revalidate.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("OUTREACH_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Ok(token) = std::env::var("OUTREACH_ADMIN_TOKEN") {
            if !token.trim().is_empty() {
                self.session.admin_token = Some(token);
            }
        }
        validate(self)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `outreach.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("outreach.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.backend.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.base_url must be non-empty"));
    }
    cfg.base_url()?;
    if cfg.backend.timeout_ms == 0 {
        return Err(ConfigError::Invalid("backend.timeout_ms must be > 0"));
    }

    if let Some(identity) = &cfg.session.identity {
        if identity.principal.trim().is_empty() {
            return Err(ConfigError::Invalid("session.identity.principal must be non-empty"));
        }
        if identity.token.trim().is_empty() {
            return Err(ConfigError::Invalid("session.identity.token must be non-empty"));
        }
    }
    if let Some(token) = &cfg.session.admin_token {
        if token.trim().is_empty() {
            return Err(ConfigError::Invalid("session.admin_token must be non-empty when set"));
        }
    }

    if cfg.health.stale_after_ms == 0 {
        return Err(ConfigError::Invalid("health.stale_after_ms must be > 0"));
    }
    if cfg.health.max_delay_ms < cfg.health.base_delay_ms {
        return Err(ConfigError::Invalid("health.max_delay_ms must be >= health.base_delay_ms"));
    }

    if cfg.dashboard.page_size == 0 {
        return Err(ConfigError::Invalid("dashboard.page_size must be > 0"));
    }

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"backend:
  base_url: "http://127.0.0.1:4943/"
  user_agent: "outreach-tracker/0.1"
  timeout_ms: 15000

session:
  # identity:
  #   principal: "aaaaa-aa"
  #   token: "YOUR_IDENTITY_TOKEN"
  admin_token: null

health:
  stale_after_ms: 10000
  max_retries: 3
  base_delay_ms: 1000
  max_delay_ms: 5000

dashboard:
  page_size: 100
"#
}
