use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use campus_nav::{CampusApiConfig, RecalculationConfig, TravelMode};
use serde::Deserialize;

pub const BASE_URL_ENV_VAR: &str = "CAMPUS_NAV_BASE_URL";
pub const CONFIG_PATH_ENV_VAR: &str = "CAMPUS_NAV_CONFIG_PATH";
pub const LOG_ENV_VAR: &str = "CAMPUS_NAV_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Optional JSON config file. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_sec: Option<u64>,
    #[serde(default)]
    pub recalc_interval_ms: Option<u64>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl FileConfig {
    fn validate(self) -> Result<Self, String> {
        if self.timeout_sec == Some(0) {
            return Err("timeout_sec must be > 0 when provided".to_string());
        }
        if self.recalc_interval_ms == Some(0) {
            return Err("recalc_interval_ms must be > 0 when provided".to_string());
        }
        if self
            .base_url
            .as_deref()
            .is_some_and(|base_url| base_url.trim().is_empty())
        {
            return Err("base_url must not be empty when provided".to_string());
        }
        Ok(self)
    }
}

/// Configuration after merging flags, environment, and the config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api: CampusApiConfig,
    pub recalculation: RecalculationConfig,
}

/// Command-line values that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub config_path: Option<PathBuf>,
    pub mode: TravelMode,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|error| format!("failed to read config '{}': {error}", path.display()))?;
    let parsed: FileConfig = serde_json::from_str(&raw)
        .map_err(|error| format!("invalid config '{}': {error}", path.display()))?;
    parsed
        .validate()
        .map_err(|error| format!("invalid config '{}': {error}", path.display()))
}

pub fn resolve_from_env(overrides: ConfigOverrides) -> Result<ResolvedConfig, String> {
    resolve(overrides, |key| std::env::var(key).ok())
}

/// Precedence, highest first: flags, environment, config file, defaults.
pub fn resolve(
    overrides: ConfigOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, String> {
    let env = |key: &str| {
        env(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let config_path = overrides
        .config_path
        .or_else(|| env(CONFIG_PATH_ENV_VAR).map(PathBuf::from));
    let file = match config_path {
        Some(path) => load_file_config(&path)?,
        None => FileConfig::default(),
    };

    let mut api = CampusApiConfig::default();
    if let Some(base_url) = overrides
        .base_url
        .or_else(|| env(BASE_URL_ENV_VAR))
        .or(file.base_url)
    {
        api.base_url = base_url;
    }
    if let Some(timeout_sec) = file.timeout_sec {
        api = api.with_timeout(Duration::from_secs(timeout_sec));
    }
    api = api.with_headers(file.headers);

    let mut recalculation = RecalculationConfig {
        mode: overrides.mode,
        ..RecalculationConfig::default()
    };
    if let Some(interval_ms) = file.recalc_interval_ms {
        recalculation.min_interval = Duration::from_millis(interval_ms);
    }

    Ok(ResolvedConfig { api, recalculation })
}
