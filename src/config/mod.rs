// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Keyveve

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::classifier::ClassificationStrategy;
use crate::KeyveveError;

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "KEYVEVE_API_URL";

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Portal REST API
    #[serde(default)]
    pub api: ApiConfig,

    /// Analysis animation timings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Background refresh settings
    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Local mutation journal
    #[serde(default)]
    pub journal: JournalConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnalysisConfig {
    /// Offsets from start, in milliseconds, of the scanning, classifying,
    /// organizing and renaming stages followed by completion
    #[serde(default = "default_stage_offsets")]
    pub stage_offsets_ms: Vec<u64>,
    /// Service label used when a project does not carry one
    #[serde(default = "default_service")]
    pub default_service: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_notification_limit")]
    pub notification_limit: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub strategy: ClassificationStrategy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JournalConfig {
    #[serde(default = "default_journal_path")]
    pub path: String,
}

// Default value functions
fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_stage_offsets() -> Vec<u64> { vec![1200, 3800, 6800, 8800, 10800] }
fn default_service() -> String { "General".to_string() }
fn default_poll_interval() -> u64 { 30 }
fn default_notification_limit() -> u32 { 20 }
fn default_journal_path() -> String { "keyveve_journal.jsonl".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stage_offsets_ms: default_stage_offsets(),
            default_service: default_service(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            notification_limit: default_notification_limit(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: default_journal_path(),
        }
    }
}

impl AnalysisConfig {
    pub fn stage_offsets(&self) -> Vec<Duration> {
        self.stage_offsets_ms.iter().map(|ms| Duration::from_millis(*ms)).collect()
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, then apply environment overrides
    pub fn load(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| KeyveveError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!("Using API URL from {}", API_URL_ENV);
                config.api.base_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(KeyveveError::Config(format!(
                "api.base_url must be an http(s) URL, got '{}'", self.api.base_url
            )));
        }

        let offsets = &self.analysis.stage_offsets_ms;
        if offsets.len() != 5 {
            return Err(KeyveveError::Config(format!(
                "analysis.stage_offsets_ms needs 5 entries, got {}", offsets.len()
            )));
        }
        if offsets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(KeyveveError::Config(
                "analysis.stage_offsets_ms must be strictly increasing".to_string()
            ));
        }

        if self.polling.interval_secs == 0 {
            return Err(KeyveveError::Config("polling.interval_secs must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.analysis.stage_offsets().len(), 5);
        assert_eq!(config.polling.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.api.base_url = "https://portal.example.com".to_string();
        config.classifier.strategy = ClassificationStrategy::Scored;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.classifier.strategy, ClassificationStrategy::Scored);
        assert_eq!(loaded.analysis.stage_offsets_ms, config.analysis.stage_offsets_ms);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"polling": {"interval_secs": 5}}"#).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.polling.interval_secs, 5);
        assert_eq!(loaded.polling.notification_limit, 20);
        assert_eq!(loaded.journal.path, "keyveve_journal.jsonl");
    }

    #[test]
    fn test_rejects_non_monotonic_offsets() {
        let mut config = AppConfig::default();
        config.analysis.stage_offsets_ms = vec![1200, 1000, 6800, 8800, 10800];
        assert!(matches!(config.validate(), Err(KeyveveError::Config(_))));

        config.analysis.stage_offsets_ms = vec![1200, 3800];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut config = AppConfig::default();
        config.api.base_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(KeyveveError::Config(_))));
    }
}
