use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::source::export::ExportColumns;

/// Main configuration structure for signoff
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SignoffConfig {
    /// Tracker API access
    pub tracker: TrackerConfig,
    /// Report shape defaults
    pub report: ReportConfig,
    /// Export dump layout
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// API token (can be set via env var)
    pub token: Option<String>,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Page size for paged queries
    pub page_size: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Only events dated in this year make it into the report
    pub target_year: i32,
    /// Emit the rework classification columns by default
    pub include_rework: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Column positions of the semantic fields in the dump
    pub columns: ExportColumns,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            token: None, // Will be read from env var or signoff.toml
            owner: "ops-reporting".to_string(),
            repo: "spec-reviews".to_string(),
            page_size: 100,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            target_year: 2022,
            include_rework: false,
        }
    }
}

impl SignoffConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (signoff.toml)
    /// 3. Environment variables (prefixed with SIGNOFF_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("signoff.toml").exists() {
            builder = builder.add_source(File::with_name("signoff"));
        }

        builder = builder.add_source(
            Environment::with_prefix("SIGNOFF")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;

        let mut signoff_config: SignoffConfig = config.try_deserialize()?;

        // Special handling for the tracker token - check multiple sources
        if signoff_config.tracker.token.is_none() {
            if let Ok(token) = std::env::var("SIGNOFF_GITHUB_TOKEN") {
                signoff_config.tracker.token = Some(token);
            } else if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                signoff_config.tracker.token = Some(token);
            }
        }

        Ok(signoff_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<SignoffConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = SignoffConfig::load_env_file();
        SignoffConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static SignoffConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = SignoffConfig::default();
        assert_eq!(config.tracker.page_size, 100);
        assert_eq!(config.report.target_year, 2022);
        assert!(!config.report.include_rework);
        assert_eq!(config.export.columns.issue, 1);
        assert_eq!(config.export.columns.spec_type, 1096);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = SignoffConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: SignoffConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.report.target_year, config.report.target_year);
        assert_eq!(parsed.export.columns.product, config.export.columns.product);
    }
}
