use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::core::dimension::Dimension;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    WriteError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_format() -> String {
    "text".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            color: default_color(),
        }
    }
}

/// Report defaults a CLI flag can override per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefaults {
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_group_by")]
    pub group_by: String,
    #[serde(default)]
    pub tag_key: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}
fn default_group_by() -> String {
    "service".to_string()
}

impl Default for ReportDefaults {
    fn default() -> Self {
        Self {
            profile: None,
            region: default_region(),
            group_by: default_group_by(),
            tag_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub report: ReportDefaults,
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("costrep").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Collect human-readable problems with this config. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !matches!(self.settings.default_format.as_str(), "text" | "json" | "csv") {
            issues.push(format!(
                "settings.default_format must be text, json, or csv (got '{}')",
                self.settings.default_format
            ));
        }
        if !matches!(self.settings.color.as_str(), "auto" | "always" | "never") {
            issues.push(format!(
                "settings.color must be auto, always, or never (got '{}')",
                self.settings.color
            ));
        }
        if self.report.region.is_empty() {
            issues.push("report.region must not be empty".to_string());
        }
        if let Err(err) = Dimension::parse(&self.report.group_by, self.report.tag_key.clone()) {
            issues.push(format!("report.group_by: {}", err));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_empty());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [report]
            profile = "billing"
            "#,
        )
        .unwrap();
        assert_eq!(config.report.profile.as_deref(), Some("billing"));
        assert_eq!(config.report.region, "us-east-1");
        assert_eq!(config.report.group_by, "service");
        assert_eq!(config.settings.default_format, "text");
    }

    #[test]
    fn validate_flags_bad_group_by() {
        let mut config = AppConfig::default();
        config.report.group_by = "cost_category".to_string();
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("report.group_by"));
    }

    #[test]
    fn validate_flags_tag_without_key() {
        let mut config = AppConfig::default();
        config.report.group_by = "tag".to_string();
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("--tag-key"));
    }

    #[test]
    fn validate_flags_unknown_format_and_color() {
        let mut config = AppConfig::default();
        config.settings.default_format = "xml".to_string();
        config.settings.color = "sometimes".to_string();
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn tag_group_by_with_key_is_valid() {
        let mut config = AppConfig::default();
        config.report.group_by = "tag".to_string();
        config.report.tag_key = Some("Team".to_string());
        assert!(config.validate().is_empty());
    }
}
