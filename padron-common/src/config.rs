//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority, clap also maps these to env vars)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error; the service starts on defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5730";
pub const DEFAULT_OCR_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;

pub const ENV_OCR_URL: &str = "PADRON_OCR_URL";
pub const ENV_OCR_API_KEY: &str = "PADRON_OCR_API_KEY";
pub const ENV_OCR_TIMEOUT_SECS: &str = "PADRON_OCR_TIMEOUT_SECS";

/// On-disk TOML configuration; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub bind_addr: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ocr: OcrSection,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[ocr]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Resolved OCR service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Base URL; `/v1/ine/extract` is appended
    pub url: String,
    /// Sent as `X-Api-Key` when present
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OCR_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_OCR_TIMEOUT_SECS),
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct PadronConfig {
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub log_level: String,
    pub ocr: OcrConfig,
}

impl PadronConfig {
    /// Resolve configuration from overrides, environment, TOML and defaults
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let toml_config = match &overrides.config_file {
            // An explicitly requested file must exist and parse
            Some(path) => read_toml_config(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_toml_config(&path)?,
                _ => {
                    warn!("No config file found, using defaults");
                    TomlConfig::default()
                }
            },
        };

        Ok(Self::resolve(overrides, toml_config))
    }

    /// Apply the priority order to an already-parsed TOML config
    pub fn resolve(overrides: &ConfigOverrides, toml_config: TomlConfig) -> Self {
        let database_path = overrides
            .database_path
            .clone()
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        let bind_addr = overrides
            .bind_addr
            .clone()
            .or(toml_config.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let ocr = resolve_ocr(toml_config.ocr);

        Self {
            database_path,
            bind_addr,
            log_level: toml_config.logging.level,
            ocr,
        }
    }
}

fn resolve_ocr(section: OcrSection) -> OcrConfig {
    let url = env_non_empty(ENV_OCR_URL)
        .or(section.url)
        .unwrap_or_else(|| DEFAULT_OCR_URL.to_string());

    let api_key = env_non_empty(ENV_OCR_API_KEY)
        .or(section.api_key)
        .filter(|k| !k.trim().is_empty());

    let timeout_secs = match env_non_empty(ENV_OCR_TIMEOUT_SECS) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) => Some(secs),
            Err(_) => {
                warn!("Ignoring invalid {}={:?}", ENV_OCR_TIMEOUT_SECS, raw);
                None
            }
        },
        None => None,
    }
    .or(section.timeout_secs)
    .unwrap_or(DEFAULT_OCR_TIMEOUT_SECS);

    OcrConfig {
        url,
        api_key,
        timeout: Duration::from_secs(timeout_secs),
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// `<config_dir>/padron/config.toml`, falling back to `/etc/padron/config.toml` on Linux
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("padron").join("config.toml"));
    if cfg!(target_os = "linux") {
        if let Some(path) = &user_config {
            if path.exists() {
                return user_config;
            }
        }
        return Some(PathBuf::from("/etc/padron/config.toml"));
    }
    user_config
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("padron"))
        .unwrap_or_else(|| PathBuf::from("./padron_data"))
        .join("padron.db")
}
