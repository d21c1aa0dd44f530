//! Configuration management for mali-memtrack.
//!
//! This module handles loading and validating configuration files. It supports
//! YAML, JSON, and TOML formats; the CLI layers its overrides on top.

use crate::collector::{CollectorConfig, DEFAULT_PROC_ROOT};
use crate::collectors::{DEFAULT_CLIENT_DIR, DEFAULT_HEAP_TABLE};
use crate::limits::{
    ScanLimits, DEFAULT_CMDLINE_LIMIT, DEFAULT_LINE_LIMIT, DEFAULT_PATH_LIMIT,
    DEFAULT_TAIL_WINDOW_BYTES,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default config file locations, tried in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/mali-memtrack/config.yaml",
    "/etc/mali-memtrack/config.yml",
    "/etc/mali-memtrack/config.json",
    "./mali-memtrack.yaml",
    "./mali-memtrack.yml",
    "./mali-memtrack.json",
];

/// Configuration validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be at least {min}, got {value}")]
    LimitTooSmall {
        name: &'static str,
        min: u64,
        value: u64,
    },

    #[error("{name} must not be empty")]
    EmptyPath { name: &'static str },

    #[error("Invalid log_level '{0}', expected off, error, warn, info, debug or trace")]
    InvalidLogLevel(String),
}

/// Collector configuration as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Data sources
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "client-dir")]
    pub client_dir: Option<PathBuf>,
    #[serde(alias = "heap-table")]
    pub heap_table: Option<PathBuf>,

    // Buffer limits
    #[serde(alias = "tail-window-bytes")]
    pub tail_window_bytes: Option<u64>,
    #[serde(alias = "line-limit")]
    pub line_limit: Option<usize>,
    #[serde(alias = "cmdline-limit")]
    pub cmdline_limit: Option<usize>,
    #[serde(alias = "path-limit")]
    pub path_limit: Option<usize>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            client_dir: Some(PathBuf::from(DEFAULT_CLIENT_DIR)),
            heap_table: Some(PathBuf::from(DEFAULT_HEAP_TABLE)),
            tail_window_bytes: Some(DEFAULT_TAIL_WINDOW_BYTES),
            line_limit: Some(DEFAULT_LINE_LIMIT),
            cmdline_limit: Some(DEFAULT_CMDLINE_LIMIT),
            path_limit: Some(DEFAULT_PATH_LIMIT),
            log_level: Some("warn".into()),
        }
    }
}

impl Config {
    /// Effective collector settings, falling back to defaults for unset fields.
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            proc_root: self
                .proc_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
            client_dir: self
                .client_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT_DIR)),
            heap_table: self
                .heap_table
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HEAP_TABLE)),
            limits: ScanLimits {
                line: self.line_limit.unwrap_or(DEFAULT_LINE_LIMIT),
                cmdline: self.cmdline_limit.unwrap_or(DEFAULT_CMDLINE_LIMIT),
                path: self.path_limit.unwrap_or(DEFAULT_PATH_LIMIT),
                tail_window: self.tail_window_bytes.unwrap_or(DEFAULT_TAIL_WINDOW_BYTES),
            },
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    // A line buffer needs room for at least one byte plus its terminator.
    let limits = [
        ("line_limit", cfg.line_limit.map(|v| v as u64), 2),
        ("cmdline_limit", cfg.cmdline_limit.map(|v| v as u64), 2),
        ("path_limit", cfg.path_limit.map(|v| v as u64), 2),
        ("tail_window_bytes", cfg.tail_window_bytes, 1),
    ];
    for (name, value, min) in limits {
        if let Some(value) = value {
            if value < min {
                return Err(ConfigError::LimitTooSmall { name, min, value });
            }
        }
    }

    let paths = [
        ("proc_root", &cfg.proc_root),
        ("client_dir", &cfg.client_dir),
        ("heap_table", &cfg.heap_table),
    ];
    for (name, path) in paths {
        if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::EmptyPath { name });
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        match level.to_ascii_lowercase().as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => return Err(ConfigError::InvalidLogLevel(level.to_string())),
        }
    }

    Ok(())
}

/// Loads configuration from `path`, or from the first default location that exists.
///
/// Without any config file the defaults are returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}
