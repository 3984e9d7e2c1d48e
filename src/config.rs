//! # Application Configuration
//!
//! [`AppConfig`] is read from an optional YAML file, then overridden by
//! environment variables:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `BFRAME_STATIC_URL` | `static_url` | `static` |
//! | `BFRAME_STATIC_FOLDER` | `static_folder` | `static` |
//! | `BFRAME_ADDRESS` | `address` | `127.0.0.1` |
//! | `BFRAME_PORT` | `port` | `7256` |
//! | `BFRAME_STACK_SIZE` | `stack_size` | `0x8000` |
//!
//! `stack_size` is the coroutine stack size handed to `may`. It accepts decimal
//! (`32768`) or hex (`0x8000`), in the file and in the environment.
//!
//! ```yaml
//! static_url: /assets/
//! static_folder: ./public
//! port: 8080
//! stack_size: 0x10000
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// URL prefix of the static route, without surrounding `/`.
    pub static_url: String,
    /// Directory the static route serves from.
    pub static_folder: String,
    pub address: String,
    pub port: u16,
    /// Coroutine stack size in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub stack_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            static_url: "static".to_string(),
            static_folder: "static".to_string(),
            address: "127.0.0.1".to_string(),
            port: 7256,
            stack_size: 0x8000,
        }
    }
}

impl AppConfig {
    /// Load `path` (when given) and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed YAML, or an environment value that does not parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| env::var(key).ok())
    }

    /// # Errors
    ///
    /// Unreadable or malformed YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// # Errors
    ///
    /// Malformed YAML or a field of the wrong type.
    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping.
        if text.trim().is_empty() {
            return Ok(Self::default().normalized());
        }
        let config: Self = serde_yaml::from_str(text).context("failed to parse YAML")?;
        Ok(config.normalized())
    }

    /// Apply `BFRAME_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// A port or stack size that does not parse.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BFRAME_STATIC_URL") {
            self.static_url = v;
        }
        if let Some(v) = lookup("BFRAME_STATIC_FOLDER") {
            self.static_folder = v;
        }
        if let Some(v) = lookup("BFRAME_ADDRESS") {
            self.address = v;
        }
        if let Some(v) = lookup("BFRAME_PORT") {
            self.port = v
                .trim()
                .parse()
                .with_context(|| format!("invalid BFRAME_PORT `{v}`"))?;
        }
        if let Some(v) = lookup("BFRAME_STACK_SIZE") {
            self.stack_size =
                parse_size(&v).with_context(|| format!("invalid BFRAME_STACK_SIZE `{v}`"))?;
        }
        Ok(self.normalized())
    }

    fn normalized(mut self) -> Self {
        self.static_url = self.static_url.trim_matches('/').to_string();
        self
    }
}

/// Parse `32768` or `0x8000`.
pub fn parse_size(value: &str) -> Result<usize, std::num::ParseIntError> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(usize),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}
