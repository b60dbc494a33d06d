use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TOKEN_ENV: &str = "NOTEHUB_TOKEN";
pub const CONFIG_PATH_ENV: &str = "NOTEHUB_CONFIG";
const DEFAULT_BASE_URL: &str = "https://notehub-public.goit.study/api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub base_url: String,
    pub per_page: u32,
    pub debounce_ms: u64,
    pub request_timeout_ms: u64,
    pub cache_capacity: usize,
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            per_page: 12,
            debounce_ms: 500,
            request_timeout_ms: 10_000,
            cache_capacity: 32,
            log_dir: None,
        }
    }
}

impl ClientSettings {
    /// Defaults, then the optional JSON file named by `NOTEHUB_CONFIG`, then
    /// individual `NOTEHUB_*` overrides.
    pub fn load() -> AppResult<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(&vars)
    }

    pub fn load_from(vars: &HashMap<String, String>) -> AppResult<Self> {
        let mut settings = match vars.get(CONFIG_PATH_ENV).filter(|path| !path.trim().is_empty()) {
            Some(path) => Self::from_file(Path::new(path))?,
            None => Self::default(),
        };
        settings.apply_overrides(vars)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            AppError::Config(format!("cannot read settings file {}: {}", path.display(), error))
        })?;
        serde_json::from_str(&raw).map_err(|error| {
            AppError::Config(format!("invalid settings file {}: {}", path.display(), error))
        })
    }

    fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> AppResult<()> {
        if let Some(value) = vars.get("NOTEHUB_BASE_URL") {
            self.base_url = value.trim().to_string();
        }
        if let Some(value) = vars.get("NOTEHUB_PER_PAGE") {
            self.per_page = parse_number("NOTEHUB_PER_PAGE", value)?;
        }
        if let Some(value) = vars.get("NOTEHUB_DEBOUNCE_MS") {
            self.debounce_ms = parse_number("NOTEHUB_DEBOUNCE_MS", value)?;
        }
        if let Some(value) = vars.get("NOTEHUB_TIMEOUT_MS") {
            self.request_timeout_ms = parse_number("NOTEHUB_TIMEOUT_MS", value)?;
        }
        if let Some(value) = vars.get("NOTEHUB_LOG_DIR").filter(|value| !value.trim().is_empty()) {
            self.log_dir = Some(PathBuf::from(value.trim()));
        }
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "baseUrl must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.per_page == 0 {
            return Err(AppError::Config("perPage must be at least 1".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::Config("requestTimeoutMs must be greater than 0".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(AppError::Config("cacheCapacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("notehub-client").join("logs"))
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", name, value)))
}

/// Bearer token for the NoteHub API. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> AppResult<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(AppError::Config(format!(
                "{} is empty. Set it in the environment and restart.",
                TOKEN_ENV
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn from_env() -> AppResult<Self> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) => Self::new(token),
            Err(_) => Err(AppError::Config(format!(
                "{} is missing. Set it in the environment and restart.",
                TOKEN_ENV
            ))),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}
