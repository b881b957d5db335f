//! Container configuration

use crate::error::{Error, Result};
use crate::mode::ServiceMode;
use serde::{Deserialize, Serialize};

/// Service container configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Container name, used in logs
    #[serde(default = "default_name")]
    pub name: String,
    /// Mode given to services whose builder never sets one
    #[serde(default)]
    pub default_mode: ServiceMode,
    /// Starts a single controller may initiate within one transaction
    /// before further starts are suppressed
    ///
    /// A suppressed service is left DOWN with nothing scheduled and stays
    /// there after commit until a later operation re-evaluates it, such as
    /// [`ServiceContainer::enable_service`](crate::ServiceContainer::enable_service)
    /// or a change in its demand or dependencies.
    #[serde(default = "default_max_transitions")]
    pub max_transitions_per_transaction: usize,
}

fn default_name() -> String {
    "default".to_string()
}

fn default_max_transitions() -> usize {
    32
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            default_mode: ServiceMode::default(),
            max_transitions_per_transaction: default_max_transitions(),
        }
    }
}

impl ContainerConfig {
    /// Load configuration from file
    pub async fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use async_fs::File;
        use futures::io::AsyncReadExt;

        let mut file = File::open(path.as_ref()).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: Self = match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_transitions_per_transaction == 0 {
            return Err(Error::Config(
                "max_transitions_per_transaction must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = ContainerConfig::from_yaml_str("name: edge").unwrap();
        assert_eq!(config.name, "edge");
        assert_eq!(config.default_mode, ServiceMode::Active);
        assert_eq!(config.max_transitions_per_transaction, 32);
    }

    #[test]
    fn test_config_serialization() {
        let config = ContainerConfig {
            default_mode: ServiceMode::Lazy,
            ..ContainerConfig::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = ContainerConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_zero_transition_limit_rejected() {
        let result = ContainerConfig::from_yaml_str("max_transitions_per_transaction: 0");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
