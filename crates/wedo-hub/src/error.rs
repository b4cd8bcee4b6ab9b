//! Error types for hub operations.
//!
//! Nothing here is fatal to the telemetry loop. Transport faults and
//! malformed reports are absorbed by the completion handlers; the variants
//! below surface at the capability surface and at the transport/registry
//! seams.

use thiserror::Error;
use wedo_hid_protocol::DeviceCategory;

use crate::port::PortId;

/// Errors reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// A transfer completed with a nonzero status.
    #[error("transfer failed with status {0}")]
    Failed(i32),

    /// A write completed with fewer bytes than a full report.
    #[error("short write: sent {sent} of {expected} bytes")]
    ShortWrite {
        /// Bytes actually sent.
        sent: usize,
        /// Bytes expected.
        expected: usize,
    },

    /// The device went away.
    #[error("device disconnected")]
    Disconnected,

    /// The transport no longer accepts submissions.
    #[error("transport closed")]
    Closed,
}

/// Errors reported by the device-registration collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("failed to bind {category} on {port}: {reason}")]
    BindFailed {
        port: PortId,
        category: DeviceCategory,
        reason: String,
    },
}

impl RegistryError {
    #[must_use]
    pub fn bind_failed(port: PortId, category: DeviceCategory, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            port,
            category,
            reason: reason.into(),
        }
    }
}

/// Errors returned by hub operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// An argument was rejected at the capability surface; no state changed.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidArgument {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// The handle's port no longer carries the device it was obtained for.
    #[error("no {expected} bound to {port}")]
    NotBound {
        port: PortId,
        expected: &'static str,
    },

    /// The hub has been halted.
    #[error("hub {0} is halted")]
    Halted(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl HubError {
    #[must_use]
    pub fn invalid_argument(
        field: &'static str,
        value: impl ToString,
        reason: &'static str,
    ) -> Self {
        Self::InvalidArgument {
            field,
            value: value.to_string(),
            reason,
        }
    }

    #[must_use]
    pub fn not_bound(port: PortId, expected: &'static str) -> Self {
        Self::NotBound { port, expected }
    }

    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Check if this error rejected a caller-supplied value.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, HubError::InvalidArgument { .. })
    }
}

/// A specialized `Result` type for hub operations.
pub type HubResult<T> = std::result::Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HubError::invalid_argument("duty_cycle", 101, "must be within -100..=100");
        assert!(err.to_string().contains("duty_cycle"));
        assert!(err.to_string().contains("101"));
        assert!(err.is_invalid_argument());

        let err = HubError::not_bound(PortId::Port2, "motor");
        assert_eq!(err.to_string(), "no motor bound to port2");
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_transport_error_converts() {
        let err: HubError = TransportError::Failed(-32).into();
        assert!(matches!(err, HubError::Transport(TransportError::Failed(-32))));
        assert_eq!(err.to_string(), "transfer failed with status -32");
    }

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::bind_failed(PortId::Port1, DeviceCategory::Tilt, "no slot");
        assert_eq!(err.to_string(), "failed to bind tilt on port1: no slot");
    }
}
