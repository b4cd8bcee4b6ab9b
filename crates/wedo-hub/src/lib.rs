//! # wedo-hub
//!
//! Telemetry and output engine for the LEGO WeDo USB hub.
//!
//! A [`Hub`] consumes 8-byte input reports from a [`Transport`], keeps the
//! hub's status and voltage current, classifies what is plugged into each of
//! its two ports and binds a sensor decoder or motor encoder once a reading
//! has been stable for long enough. Changes to hub flags or motor drive are
//! coalesced into single-flight output writes.
//!
//! ## Architecture
//!
//! - [`hub`] - read/write completion handlers and hub-level state
//! - [`scheduler`] - dirty-bit output scheduling and the drain barrier
//! - [`port`] / [`debounce`] - per-port debounced classification
//! - [`sensor`] - tilt and motion decode modes
//! - [`capability`] - sensor and motor handles exposed per bound port
//! - [`transport`] / [`registry`] - collaborator seams and the hub factory
//! - [`link`] - tokio driver for asynchronous HID links
//! - [`mock`] - in-memory collaborators
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wedo_hub::mock::{MockRegistry, MockTransport};
//! use wedo_hub::prelude::*;
//!
//! let factory = HubFactory::new(HubConfig::builder().port_debounce_threshold(2).build()?)?;
//! let transport = Arc::new(MockTransport::new());
//! let hub = factory.create(transport.clone(), Arc::new(MockRegistry::new()))?;
//! hub.start()?;
//!
//! // Two identical readings of a motor identity bind port 1.
//! for _ in 0..2 {
//!     hub.on_read_complete(Ok(&[0x00, 150, 0, 240, 0, 0, 0, 0]));
//! }
//!
//! let motor = hub.motor(PortId::Port1)?;
//! motor.set_command(MotorCommand::Run)?;
//! motor.set_duty_cycle(100)?;
//! hub.service_output();
//! assert_eq!(transport.last_write(), Some([0x20, 127, 0, 0, 0, 0, 0, 0]));
//! # Ok::<(), wedo_hub::HubError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]

pub mod capability;
pub mod config;
pub mod counters;
pub mod debounce;
pub mod error;
pub mod hub;
pub mod link;
pub mod mock;
pub mod port;
pub mod registry;
pub mod scheduler;
pub mod sensor;
pub mod transport;

pub mod prelude;

pub use capability::{MOTOR_NAME, MotorHandle, SensorHandle, parse_command, parse_polarity};
pub use config::{HubConfig, HubConfigBuilder};
pub use counters::{CounterSnapshot, HubCounters};
pub use debounce::Debouncer;
pub use error::{HubError, HubResult, RegistryError, TransportError};
pub use hub::Hub;
pub use link::{AsyncHidLink, TokioTransport, TransportDriver, channel};
pub use port::{BindingKind, PortId, PortSnapshot};
pub use registry::{DeviceRegistry, HubFactory, NullRegistry};
pub use scheduler::{MotorDrive, OutputFrame, OutputScheduler, WriteCompletion};
pub use sensor::{DataType, ModeInfo, SensorDecoder, SensorKind, SensorReading, TiltClassifier};
pub use transport::Transport;

pub use wedo_hid_protocol::{DeviceCategory, MotorCommand, MotorPolarity, TiltStatus};
