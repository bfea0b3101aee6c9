use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::error::ConfigError;
use super::state::CollectionKind;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const ENV_BASE_URL: &str = "FARMWARE_BASE_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "FARMWARE_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub farmers_path: String,
    pub advisories_path: String,
    pub dispatch_path: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            farmers_path: "/api/farmers".to_string(),
            advisories_path: "/api/advisories".to_string(),
            dispatch_path: "/send-advisory".to_string(),
            request_timeout_secs: 20,
        }
    }
}

impl BackendConfig {
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    pub fn collection_url(&self, kind: CollectionKind) -> String {
        match kind {
            CollectionKind::Farmers => self.endpoint(&self.farmers_path),
            CollectionKind::Advisories => self.endpoint(&self.advisories_path),
        }
    }

    pub fn dispatch_url(&self) -> String {
        self.endpoint(&self.dispatch_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    pub clock_interval_secs: u64,
    pub refresh_on_start: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            clock_interval_secs: 30,
            refresh_on_start: true,
        }
    }
}

impl UiConfig {
    pub fn clock_interval(&self) -> Duration {
        Duration::from_secs(self.clock_interval_secs)
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Loads `explicit` if given (it must exist), otherwise `fallback` if
    /// present on disk, otherwise defaults.
    pub fn load(explicit: Option<&Path>, fallback: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }
        match fallback {
            Some(path) => match Self::load_file(path) {
                Ok(config) => Ok(config),
                Err(ConfigError::NotFound { .. }) => Ok(Self::default()),
                Err(e) => Err(e),
            },
            None => Ok(Self::default()),
        }
    }

    /// Applies environment overrides. `lookup` is `std::env::var` in
    /// production.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|value| !value.trim().is_empty()) {
            self.backend.base_url = base_url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            self.backend.request_timeout_secs =
                raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    message: format!("{ENV_REQUEST_TIMEOUT} must be a whole number, got '{raw}'"),
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.backend.base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::Invalid {
                message: "backend.base_url must not be empty".to_string(),
            });
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                message: format!("backend.base_url must start with http:// or https://, got '{base}'"),
            });
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.ui.clock_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "clock_interval_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
