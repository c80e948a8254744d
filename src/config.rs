//! # config — service configuration from environment variables
//!
//! Resolved once at startup and injected into the clients. Nothing reads the
//! environment after [`Config::from_env`] returns.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Used when `BASKET_API_URL` is unset or blank.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

/// Delay between settled polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

const BASKETS_RESOURCE: &str = "baskets";
const STREAM_RESOURCE: &str = "baskets/stream";

// ─── ServiceUrl ───────────────────────────────────────────────────────────────

/// Base URL of the pricing service. Always ends with exactly one `/` added
/// when missing, so resources can be appended directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrl(String);

impl ServiceUrl {
    /// Trimmed candidate, or [`DEFAULT_BASE_URL`] when absent / blank.
    pub fn resolve(candidate: Option<&str>) -> Self {
        match candidate.map(str::trim) {
            Some(url) if !url.is_empty() => Self(ensure_trailing_slash(url)),
            _ => Self(DEFAULT_BASE_URL.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `{base}baskets`: create (POST) and poll (GET).
    pub fn baskets(&self) -> String {
        format!("{}{BASKETS_RESOURCE}", self.0)
    }

    /// `{base}baskets/stream`: server push.
    pub fn stream(&self) -> String {
        format!("{}{STREAM_RESOURCE}", self.0)
    }
}

impl Default for ServiceUrl {
    fn default() -> Self {
        Self::resolve(None)
    }
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn ensure_trailing_slash(value: &str) -> String {
    if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    }
}

// ─── SyncMode ─────────────────────────────────────────────────────────────────

/// How the live basket view is kept current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// `GET /baskets` on a fixed delay.
    #[default]
    Poll,
    /// Server-sent events from `/baskets/stream`.
    Push,
}

impl std::str::FromStr for SyncMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poll" | "polling" => Ok(SyncMode::Poll),
            "push" | "stream" | "sse" => Ok(SyncMode::Push),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Poll => write!(f, "poll"),
            SyncMode::Push => write!(f, "push"),
        }
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// Pricing service base URL (`BASKET_API_URL`)
    pub base_url: ServiceUrl,
    /// `BASKET_SYNC_MODE`: "poll" or "push"
    pub sync_mode: SyncMode,
    /// `BASKET_POLL_INTERVAL_MS`
    pub poll_interval: Duration,
    /// `BASKET_DRAFT_PATH`: draft JSON for the runner; sample basket if unset
    pub draft_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sync_mode = match lookup("BASKET_SYNC_MODE") {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => SyncMode::default(),
        };

        let poll_interval = match lookup("BASKET_POLL_INTERVAL_MS") {
            Some(raw) if !raw.trim().is_empty() => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidInterval(raw.clone()))?;
                if ms == 0 {
                    return Err(ConfigError::InvalidInterval(raw));
                }
                Duration::from_millis(ms)
            }
            _ => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            base_url: ServiceUrl::resolve(lookup("BASKET_API_URL").as_deref()),
            sync_mode,
            poll_interval,
            draft_path: lookup("BASKET_DRAFT_PATH").filter(|p| !p.trim().is_empty()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: ServiceUrl::default(),
            sync_mode: SyncMode::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            draft_path: None,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
