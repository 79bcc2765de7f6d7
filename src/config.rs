//! Gate configuration: limit policy, persistence location, completion endpoint.
//!
//! Settings come from a JSON document ([`GateConfig::from_json`]) or from the
//! environment ([`GateConfig::from_env`]); anything unset falls back to the defaults.

use crate::error::ConfigError;
use crate::rate_limit::LimitPolicy;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub window_secs: u64,
    pub window_limit: u32,
    /// Where a durable backend keeps the limit state. `None` means in-memory only.
    pub storage_path: Option<PathBuf>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_endpoint: String,
    pub request_timeout_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        let policy = LimitPolicy::default();
        Self {
            window_secs: policy.window().as_secs(),
            window_limit: policy.limit(),
            storage_path: None,
            openrouter_api_key: None,
            openrouter_endpoint: DEFAULT_OPENROUTER_ENDPOINT.to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl GateConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read `TUTORGATE_*` and `OPENROUTER_*` variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup("TUTORGATE_WINDOW_SECS") {
            cfg.window_secs = parse("TUTORGATE_WINDOW_SECS", &v)?;
        }
        if let Some(v) = lookup("TUTORGATE_WINDOW_LIMIT") {
            cfg.window_limit = parse("TUTORGATE_WINDOW_LIMIT", &v)?;
        }
        if let Some(v) = lookup("TUTORGATE_STORAGE_PATH").filter(|v| !v.is_empty()) {
            cfg.storage_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("OPENROUTER_API_KEY").filter(|v| !v.is_empty()) {
            cfg.openrouter_api_key = Some(v);
        }
        if let Some(v) = lookup("OPENROUTER_ENDPOINT").filter(|v| !v.is_empty()) {
            cfg.openrouter_endpoint = v;
        }
        if let Some(v) = lookup("TUTORGATE_REQUEST_TIMEOUT_SECS") {
            cfg.request_timeout_secs = parse("TUTORGATE_REQUEST_TIMEOUT_SECS", &v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "window_secs",
                reason: "window must be at least one second".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "timeout must be at least one second".into(),
            });
        }
        Ok(())
    }

    pub fn policy(&self) -> LimitPolicy {
        LimitPolicy::new(Duration::from_secs(self.window_secs), self.window_limit)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The API key, or an error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.openrouter_api_key.as_deref().ok_or(ConfigError::Missing("OPENROUTER_API_KEY"))
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid { key, reason: e.to_string() })
}
