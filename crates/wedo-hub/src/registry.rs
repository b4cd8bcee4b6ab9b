//! Device registration seam and hub construction.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::info;
use wedo_hid_protocol::DeviceCategory;

use crate::config::HubConfig;
use crate::error::{HubResult, RegistryError};
use crate::hub::Hub;
use crate::port::PortId;
use crate::transport::Transport;

/// External collaborator told about port bindings.
///
/// Called only for categories that carry a binding (tilt, motion, motor),
/// and always with the hub's telemetry lock held, so implementations must
/// not call back into the hub.
pub trait DeviceRegistry: Send + Sync {
    /// Expose a newly bound device.
    ///
    /// # Errors
    ///
    /// Returning an error leaves the port unbound; the hub retries after
    /// the next full debounce run.
    fn bind(&self, port: PortId, category: DeviceCategory) -> Result<(), RegistryError>;

    /// Withdraw a device previously accepted by [`bind`](Self::bind).
    fn unbind(&self, port: PortId, category: DeviceCategory);
}

/// Registry that accepts every binding and records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRegistry;

impl DeviceRegistry for NullRegistry {
    fn bind(&self, _port: PortId, _category: DeviceCategory) -> Result<(), RegistryError> {
        Ok(())
    }

    fn unbind(&self, _port: PortId, _category: DeviceCategory) {}
}

/// Creates hubs with sequential names `hub0`, `hub1`, ...
#[derive(Debug)]
pub struct HubFactory {
    next_id: AtomicU32,
    config: HubConfig,
}

impl HubFactory {
    /// # Errors
    ///
    /// Returns an error if `config` does not validate.
    pub fn new(config: HubConfig) -> HubResult<Self> {
        config.validate()?;
        Ok(Self {
            next_id: AtomicU32::new(0),
            config,
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Build a hub for a newly attached device. The hub is not started.
    pub fn create(
        &self,
        transport: Arc<dyn Transport>,
        registry: Arc<dyn DeviceRegistry>,
    ) -> HubResult<Hub> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = format!("hub{id}");
        info!(hub = %name, "Creating hub");
        Hub::new(name, self.config.clone(), transport, registry)
    }
}

impl Default for HubFactory {
    fn default() -> Self {
        Self {
            next_id: AtomicU32::new(0),
            config: HubConfig::default(),
        }
    }
}
