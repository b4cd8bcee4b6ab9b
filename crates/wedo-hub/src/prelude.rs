//! Prelude for wedo-hub.
//!
//! Re-exports the types most callers need to build a hub and use its ports.

pub use crate::capability::{MotorHandle, SensorHandle};
pub use crate::config::HubConfig;
pub use crate::error::{HubError, HubResult, RegistryError, TransportError};
pub use crate::hub::Hub;
pub use crate::port::{PortId, PortSnapshot};
pub use crate::registry::{DeviceRegistry, HubFactory, NullRegistry};
pub use crate::sensor::{SensorKind, SensorReading};
pub use crate::transport::Transport;

pub use wedo_hid_protocol::{DeviceCategory, MotorCommand, MotorPolarity, TiltStatus};
