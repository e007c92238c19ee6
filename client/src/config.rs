use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_STREAM_PATH: &str = "/copilot/chat/stream";
pub const DEFAULT_UPLOAD_PATH: &str = "/chat/upload";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024;

/// Variables baked into the browser build.
static BUILD_ENV: [(&str, Option<&str>); 3] = [
    ("LABADAIN_API_BASE", option_env!("LABADAIN_API_BASE")),
    ("LABADAIN_GOOGLE_CLIENT_ID", option_env!("LABADAIN_GOOGLE_CLIENT_ID")),
    ("LABADAIN_APPLE_CLIENT_ID", option_env!("LABADAIN_APPLE_CLIENT_ID")),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub stream_path: String,
    pub upload_path: String,
    pub max_upload_bytes: u64,
    /// Delay between revealed characters. `0` publishes each fragment at once.
    pub reveal_delay_ms: u64,
    pub force_search: bool,
    /// OAuth client ids. Each sign-in button is only offered when its id is set.
    pub google_client_id: Option<String>,
    pub apple_client_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: DEFAULT_API_BASE.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            reveal_delay_ms: 0,
            force_search: false,
            google_client_id: None,
            apple_client_id: None,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }

    /// Reads a TOML file, falling back to the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        Config::from_toml(&content)
    }

    /// Config for the browser build, where only compile time variables exist.
    pub fn from_build_env() -> Self {
        Config::default().apply_env(|key| {
            BUILD_ENV
                .iter()
                .find(|(name, _)| *name == key)
                .and_then(|(_, value)| value.map(str::to_string))
        })
    }

    pub fn with_env(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup("LABADAIN_API_BASE") {
            self.api_base = base;
        }
        if let Some(path) = lookup("LABADAIN_STREAM_PATH") {
            self.stream_path = path;
        }
        if let Some(path) = lookup("LABADAIN_UPLOAD_PATH") {
            self.upload_path = path;
        }
        if let Some(value) = lookup("LABADAIN_MAX_UPLOAD_BYTES") {
            match value.parse() {
                Ok(bytes) => self.max_upload_bytes = bytes,
                Err(err) => warn!("Ignored LABADAIN_MAX_UPLOAD_BYTES={value:?}: {err}"),
            }
        }
        if let Some(value) = lookup("LABADAIN_REVEAL_DELAY_MS") {
            match value.parse() {
                Ok(ms) => self.reveal_delay_ms = ms,
                Err(err) => warn!("Ignored LABADAIN_REVEAL_DELAY_MS={value:?}: {err}"),
            }
        }
        if let Some(value) = lookup("LABADAIN_FORCE_SEARCH") {
            self.force_search = matches!(value.as_str(), "1" | "true" | "yes");
        }
        if let Some(id) = lookup("LABADAIN_GOOGLE_CLIENT_ID") {
            self.google_client_id = non_empty(id);
        }
        if let Some(id) = lookup("LABADAIN_APPLE_CLIENT_ID") {
            self.apple_client_id = non_empty(id);
        }
        self
    }

    pub fn reveal_delay(&self) -> Option<Duration> {
        (self.reveal_delay_ms > 0).then(|| Duration::from_millis(self.reveal_delay_ms))
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.api_base.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
