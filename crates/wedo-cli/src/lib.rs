//! Library half of `wedo-replay`: trace files, configuration loading and the
//! replay engine.

#![deny(static_mut_refs)]

pub mod config;
pub mod replay;
pub mod trace;

pub use config::{ConfigOverrides, load_config};
pub use replay::{MotorSettings, ReplayEvent, ReplayOptions, ReplaySummary, replay};
pub use trace::{CaptureFile, CaptureReport, format_hex, parse_hex_bytes, parse_hex_u16};
