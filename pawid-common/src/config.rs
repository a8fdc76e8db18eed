//! Bootstrap configuration loading
//!
//! Configuration sources, highest priority first:
//! 1. Explicit path passed by the host (e.g. a command-line flag)
//! 2. `PAWID_CONFIG` environment variable
//! 3. `<config_dir>/pawid/config.toml` (platform config directory)
//! 4. Built-in defaults
//!
//! A missing file at priority 2-4 is not fatal: a warning is logged and defaults are used.
//! Secrets are then overlaid from the environment (`ROBOFLOW_API_KEY`, `ROBOFLOW_MODEL_ID`).
//!
//! Nothing here is validated beyond TOML syntax. Semantic validation happens where the
//! values are consumed, so a bad threshold fails at engine construction with a named error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PAWID_CONFIG";

/// Environment variable overriding `roboflow.api_key`
pub const API_KEY_ENV_VAR: &str = "ROBOFLOW_API_KEY";

/// Environment variable registering a single model when no categories are configured
pub const MODEL_ID_ENV_VAR: &str = "ROBOFLOW_MODEL_ID";

/// Category registered for `ROBOFLOW_MODEL_ID` when the file lists none
pub const ENV_MODEL_CATEGORY: &str = "dog";

/// Root of the TOML configuration file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Roboflow classification backend settings
    #[serde(default)]
    pub roboflow: RoboflowConfig,

    /// Ordered list of categories to query. Order is the ensemble tie-break priority.
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,

    /// Decision policy thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Input image limits
    #[serde(default)]
    pub image: ImageConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Roboflow REST backend settings
#[derive(Debug, Clone, Deserialize)]
pub struct RoboflowConfig {
    /// API key (usually supplied through `ROBOFLOW_API_KEY` instead of the file)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Classification endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side rate limit shared by all categories
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for RoboflowConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// One category → model binding
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CategoryEntry {
    /// Category name ("dog", "cat", ...)
    pub category: String,
    /// Upstream model identifier, e.g. `dog-breeds/3`
    pub model_id: String,
}

/// Decision policy thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdConfig {
    /// Minimum top confidence for a decided verdict
    #[serde(default = "default_top_min")]
    pub top_min: f64,

    /// Minimum gap between best and second-best confidence
    #[serde(default = "default_gap_min")]
    pub gap_min: f64,

    /// Confidence floor a breed must clear to count towards a mix
    #[serde(default = "default_mix")]
    pub mix: f64,

    /// Maximum number of predictions returned
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            top_min: default_top_min(),
            gap_min: default_gap_min(),
            mix: default_mix(),
            top_n: default_top_n(),
        }
    }
}

/// Input image limits
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_min_bytes")]
    pub min_bytes: usize,

    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            min_bytes: default_min_bytes(),
            max_bytes: default_max_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_base_url() -> String {
    "https://classify.roboflow.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_requests_per_second() -> u32 {
    3
}

fn default_top_min() -> f64 {
    0.35
}

fn default_gap_min() -> f64 {
    0.12
}

fn default_mix() -> f64 {
    0.20
}

fn default_top_n() -> usize {
    5
}

fn default_min_bytes() -> usize {
    1024
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration following the documented priority order, then apply
    /// environment overrides.
    ///
    /// An explicit path that cannot be read is an error; anything else falls back
    /// to defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => match discover_config_file() {
                Some(path) => match Self::from_file(&path) {
                    Ok(config) => {
                        info!("Loaded configuration from {}", path.display());
                        config
                    }
                    Err(Error::Io(e)) => {
                        warn!(
                            "Config file {} unreadable ({}), using defaults",
                            path.display(),
                            e
                        );
                        Self::default()
                    }
                    Err(e) => return Err(e),
                },
                None => {
                    warn!("No config file found, using built-in defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay secrets and the single-model shortcut from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_env(API_KEY_ENV_VAR) {
            debug!("Using Roboflow API key from {}", API_KEY_ENV_VAR);
            self.roboflow.api_key = Some(key);
        }

        if self.categories.is_empty() {
            if let Some(model_id) = non_empty_env(MODEL_ID_ENV_VAR) {
                info!(
                    "No categories configured, registering '{}' for {}={}",
                    ENV_MODEL_CATEGORY, MODEL_ID_ENV_VAR, model_id
                );
                self.categories.push(CategoryEntry {
                    category: ENV_MODEL_CATEGORY.to_string(),
                    model_id,
                });
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Locate a config file from `PAWID_CONFIG` or the platform config directory
fn discover_config_file() -> Option<PathBuf> {
    if let Some(path) = non_empty_env(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    default_config_path().filter(|p| p.exists())
}

/// Platform default config file location (`~/.config/pawid/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pawid").join("config.toml"))
}
