//! LEGO WeDo USB hub HID protocol implementation.
//!
//! This crate is intentionally I/O-free and allocation-free.
//! It provides pure functions and types that can be tested without hardware:
//! the fixed 8-byte input/output report codec, the motor output encoder, and
//! the identity and tilt threshold tables.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod ids;
pub mod motor;
pub mod output;
pub mod report;
pub mod types;

pub use ids::{PRODUCT_WEDO_HUB, VENDOR_ID, is_wedo, product_name};
pub use motor::{
    MAX_DUTY_CYCLE, MotorCommand, MotorPolarity, OUTPUT_BRAKE, OUTPUT_STOP, encode_motor_output,
    is_valid_duty_cycle,
};
pub use output::{HubCommandFlags, WedoOutputReport, encode_output};
pub use report::{
    HubStatusFlags, MILLIVOLTS_PER_COUNT, PORT_COUNT, PortSample, REPORT_LEN, ReportError,
    WedoInputReport, parse,
};
pub use types::{CATEGORY_COUNT, DeviceCategory, IDENTITY_TABLE, TILT_TABLE, TiltStatus};
