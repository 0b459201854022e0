//! # Service Configuration
//!
//! Settings for `addsvc serve`, resolved in this order (later wins):
//!
//! 1. built-in defaults
//! 2. an optional YAML file (`--config`)
//! 3. environment variables
//! 4. CLI flags
//!
//! ## Environment Variables
//!
//! | Variable                | Field            | Format                              |
//! |-------------------------|------------------|-------------------------------------|
//! | `ADDSVC_HTTP_ADDR`      | `http_addr`      | `host:port`                         |
//! | `ADDSVC_STACK_SIZE`     | `stack_size`     | decimal (`32768`) or hex (`0x8000`) |
//! | `ADDSVC_MAX_CONCAT_LEN` | `max_concat_len` | decimal                             |
//! | `ADDSVC_METRICS`        | `metrics_enabled`| `true`/`false`/`1`/`0`              |
//!
//! Unparseable values are ignored with a warning.
//!
//! ## Example file
//!
//! ```yaml
//! http_addr: "0.0.0.0:8081"
//! stack_size: 0x8000
//! max_concat_len: 10
//! metrics_enabled: true
//! ```

use crate::service::DEFAULT_MAX_CONCAT_LEN;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8081";
/// 32 KB coroutine stacks.
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Listen address
    pub http_addr: String,
    /// Coroutine stack size in bytes
    pub stack_size: usize,
    /// Longest concatenation result the service accepts
    pub max_concat_len: usize,
    /// Enables the metrics middleware and `GET /metrics`
    pub metrics_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
            max_concat_len: DEFAULT_MAX_CONCAT_LEN,
            metrics_enabled: true,
        }
    }
}

impl ServiceConfig {
    /// Defaults, overlaid with `path` when given, then with the environment.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid configuration YAML.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Parse a YAML file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply `ADDSVC_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("ADDSVC_HTTP_ADDR") {
            self.http_addr = addr;
        }
        if let Some(val) = lookup("ADDSVC_STACK_SIZE") {
            match parse_size(&val) {
                Some(size) => self.stack_size = size,
                None => warn!(value = %val, "Ignoring invalid ADDSVC_STACK_SIZE"),
            }
        }
        if let Some(val) = lookup("ADDSVC_MAX_CONCAT_LEN") {
            match val.trim().parse() {
                Ok(len) => self.max_concat_len = len,
                Err(_) => warn!(value = %val, "Ignoring invalid ADDSVC_MAX_CONCAT_LEN"),
            }
        }
        if let Some(val) = lookup("ADDSVC_METRICS") {
            match parse_bool(&val) {
                Some(enabled) => self.metrics_enabled = enabled,
                None => warn!(value = %val, "Ignoring invalid ADDSVC_METRICS"),
            }
        }
    }
}

/// Parse a byte count written in decimal or `0x` hex.
#[must_use]
pub fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
