//! Hub configuration loading for the command line.

use std::path::Path;

use anyhow::{Context, Result};
use wedo_hub::HubConfig;

/// Flag overrides applied on top of a loaded configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub port_debounce_threshold: Option<u32>,
    pub tilt_debounce_threshold: Option<u32>,
    pub write_retry_limit: Option<u8>,
}

/// Load a configuration from YAML, or start from defaults, then apply
/// overrides and validate.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the final
/// configuration does not validate.
pub fn load_config(path: Option<&Path>, overrides: ConfigOverrides) -> Result<HubConfig> {
    let mut config = match path {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config '{}'", path.display()))?;
            serde_yaml::from_str(&yaml)
                .with_context(|| format!("Failed to parse config '{}'", path.display()))?
        }
        None => HubConfig::default(),
    };

    if let Some(threshold) = overrides.port_debounce_threshold {
        config.port_debounce_threshold = threshold;
    }
    if let Some(threshold) = overrides.tilt_debounce_threshold {
        config.tilt_debounce_threshold = threshold;
    }
    if let Some(limit) = overrides.write_retry_limit {
        config.write_retry_limit = limit;
    }

    config.validate().context("Invalid hub configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() -> Result<()> {
        let config = load_config(None, ConfigOverrides::default())?;
        assert_eq!(config, HubConfig::default());
        Ok(())
    }

    #[test]
    fn test_yaml_then_overrides() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("hub.yaml");
        std::fs::write(&path, "port_debounce_threshold: 20\ntilt_debounce_threshold: 2\n")?;

        let overrides = ConfigOverrides {
            tilt_debounce_threshold: Some(6),
            ..ConfigOverrides::default()
        };
        let config = load_config(Some(&path), overrides)?;
        assert_eq!(config.port_debounce_threshold, 20);
        assert_eq!(config.tilt_debounce_threshold, 6);
        assert_eq!(config.write_retry_limit, 1);
        Ok(())
    }

    #[test]
    fn test_zero_override_is_rejected() {
        let overrides = ConfigOverrides {
            port_debounce_threshold: Some(0),
            ..ConfigOverrides::default()
        };
        assert!(load_config(None, overrides).is_err());
    }
}
