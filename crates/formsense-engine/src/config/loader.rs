use super::schema::FormSenseConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./formsense.yaml
    /// 2. ~/.formsense/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<FormSenseConfig, ConfigError> {
        let candidates = std::iter::once(PathBuf::from("./formsense.yaml")).chain(
            dirs::home_dir().map(|home| home.join(".formsense").join("config.yaml")),
        );
        for path in candidates {
            if path.exists() {
                return Self::load_from(&path).await;
            }
        }
        Ok(FormSenseConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<FormSenseConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<FormSenseConfig, ConfigError> {
        if content.trim().is_empty() {
            return Ok(FormSenseConfig::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}
