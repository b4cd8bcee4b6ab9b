//! Hub configuration.

use serde::{Deserialize, Serialize};

use crate::error::{HubError, HubResult};

/// Consecutive identical identity classifications needed to rebind a port.
pub const DEFAULT_PORT_DEBOUNCE: u32 = 100;

/// Consecutive identical tilt classifications needed to change tilt status.
pub const DEFAULT_TILT_DEBOUNCE: u32 = 4;

/// Immediate resubmissions of a faulted output write.
pub const DEFAULT_WRITE_RETRY_LIMIT: u8 = 1;

/// Largest accepted debounce threshold. The debounce count runs one past it.
pub const MAX_DEBOUNCE_THRESHOLD: u32 = u32::MAX - 1;

/// Per-hub tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Identity debounce threshold.
    pub port_debounce_threshold: u32,
    /// Tilt status debounce threshold.
    pub tilt_debounce_threshold: u32,
    /// Resubmissions allowed for a faulted output write before it is dropped.
    pub write_retry_limit: u8,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            port_debounce_threshold: DEFAULT_PORT_DEBOUNCE,
            tilt_debounce_threshold: DEFAULT_TILT_DEBOUNCE,
            write_retry_limit: DEFAULT_WRITE_RETRY_LIMIT,
        }
    }
}

impl HubConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either debounce threshold is zero or above
    /// [`MAX_DEBOUNCE_THRESHOLD`].
    pub fn validate(&self) -> HubResult<()> {
        for (field, threshold) in [
            ("port_debounce_threshold", self.port_debounce_threshold),
            ("tilt_debounce_threshold", self.tilt_debounce_threshold),
        ] {
            if threshold == 0 {
                return Err(HubError::invalid_configuration(format!(
                    "{field} must be greater than 0"
                )));
            }
            if threshold > MAX_DEBOUNCE_THRESHOLD {
                return Err(HubError::invalid_configuration(format!(
                    "{field} must be at most {MAX_DEBOUNCE_THRESHOLD}"
                )));
            }
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> HubConfigBuilder {
        HubConfigBuilder::default()
    }
}

/// Builder for `HubConfig`.
#[derive(Debug, Default)]
pub struct HubConfigBuilder {
    config: HubConfig,
}

impl HubConfigBuilder {
    #[must_use]
    pub fn port_debounce_threshold(mut self, threshold: u32) -> Self {
        self.config.port_debounce_threshold = threshold;
        self
    }

    #[must_use]
    pub fn tilt_debounce_threshold(mut self, threshold: u32) -> Self {
        self.config.tilt_debounce_threshold = threshold;
        self
    }

    #[must_use]
    pub fn write_retry_limit(mut self, limit: u8) -> Self {
        self.config.write_retry_limit = limit;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> HubResult<HubConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
