//! Configuration file handling.
//!
//! This module provides loading and saving of layerscan configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/layerscan/config.toml`
//! - macOS: `~/Library/Application Support/layerscan/config.toml`
//! - Windows: `%APPDATA%\layerscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! cache_ttl_hours = 24
//! default_vuln_types = ["os", "library"]
//! osv_api_url = "https://api.osv.dev"
//! layer_store_dir = "/var/lib/layerscan/layers"
//!
//! [ignore]
//! packages = ["busybox", "@types/*"]
//! vulnerabilities = ["CVE-2021-12345"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::applier::LayerStore;
use crate::detector::DEFAULT_OSV_URL;
use crate::model::{DetectedVulnerability, ScanOptions, VULN_TYPE_LIBRARY, VULN_TYPE_OS};

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use layerscan::Config;
///
/// let config = Config::load().unwrap();
///
/// println!("Cache TTL: {} hours", config.cache_ttl_hours);
/// println!("Vulnerability types: {:?}", config.default_vuln_types);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long to cache detector responses, in hours.
    ///
    /// Default: 24 hours
    pub cache_ttl_hours: u64,

    /// Where layer blobs are read from.
    ///
    /// Default: `<cache_dir>/layerscan/layers`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_store_dir: Option<PathBuf>,

    /// Detectors to run when no `--vuln-type` flag is provided.
    ///
    /// Default: `["os", "library"]`
    pub default_vuln_types: Vec<String>,

    /// Base URL of the OSV API.
    pub osv_api_url: String,

    /// Ignore list configuration for suppressing known issues.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Configuration for ignoring specific packages or vulnerabilities.
///
/// Applied to a finished report; it never changes which detectors run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Package or library names whose findings are dropped.
    ///
    /// Supports glob patterns (e.g., "lodash*", "@types/*").
    pub packages: Vec<String>,

    /// Vulnerability IDs to ignore (e.g., "CVE-2021-12345", "GHSA-xxxx").
    pub vulnerabilities: Vec<String>,
}

impl IgnoreConfig {
    pub fn should_ignore_package(&self, name: &str) -> bool {
        self.packages.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }

    pub fn should_ignore_vulnerability(&self, vuln_id: &str) -> bool {
        self.vulnerabilities.iter().any(|id| id == vuln_id)
    }

    /// Whether a finding is suppressed by either list.
    pub fn should_ignore(&self, vuln: &DetectedVulnerability) -> bool {
        self.should_ignore_vulnerability(&vuln.vulnerability_id)
            || self.should_ignore_package(&vuln.pkg_name)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.vulnerabilities.is_empty()
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    // Prefix (before first *)
    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    // Suffix (after last *)
    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_hours: 24,
            layer_store_dir: None,
            default_vuln_types: vec![VULN_TYPE_OS.to_string(), VULN_TYPE_LIBRARY.to_string()],
            osv_api_url: DEFAULT_OSV_URL.to_string(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("layerscan")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(self.default_vuln_types.iter().cloned())
    }

    pub fn layer_store(&self) -> LayerStore {
        match &self.layer_store_dir {
            Some(dir) => LayerStore::new(dir),
            None => LayerStore::default_location(),
        }
    }
}
