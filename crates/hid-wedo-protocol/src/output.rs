//! WeDo output report encoding.
//!
//! # Output report layout (8 bytes)
//! | Offset | Field          | Value                                     |
//! |--------|----------------|-------------------------------------------|
//! | 0      | command flags  | see below                                 |
//! | 1      | port 1 output  | motor byte, see [`crate::motor`]          |
//! | 2      | port 2 output  | motor byte, see [`crate::motor`]          |
//! | 3–7    | reserved       | 0x00                                      |
//!
//! Command flag bits: bit7 clear error, bit6 high power on, bit5 high power
//! off, bit4 shut down, bit3 reset, bit0 echo. Exactly one of bit6/bit5 is
//! always set.

use serde::{Deserialize, Serialize};

use crate::report::{PORT_COUNT, REPORT_LEN};

const CMD_CLEAR_ERROR: u8 = 0x80;
const CMD_HIGH_POWER_ON: u8 = 0x40;
const CMD_HIGH_POWER_OFF: u8 = 0x20;
const CMD_SHUT_DOWN: u8 = 0x10;
const CMD_RESET: u8 = 0x08;
const CMD_ECHO: u8 = 0x01;

/// Command flags sent to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HubCommandFlags {
    pub clear_error: bool,
    pub high_power: bool,
    pub shut_down: bool,
    pub reset: bool,
    pub echo_out: bool,
}

impl HubCommandFlags {
    pub fn to_byte(self) -> u8 {
        let mut byte = if self.high_power {
            CMD_HIGH_POWER_ON
        } else {
            CMD_HIGH_POWER_OFF
        };
        if self.clear_error {
            byte |= CMD_CLEAR_ERROR;
        }
        if self.shut_down {
            byte |= CMD_SHUT_DOWN;
        }
        if self.reset {
            byte |= CMD_RESET;
        }
        if self.echo_out {
            byte |= CMD_ECHO;
        }
        byte
    }
}

/// One complete output report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WedoOutputReport {
    pub flags: HubCommandFlags,
    /// Encoded motor bytes for port 1 and port 2.
    pub port_outputs: [u8; PORT_COUNT],
}

impl WedoOutputReport {
    pub fn new(flags: HubCommandFlags, port_outputs: [u8; PORT_COUNT]) -> Self {
        Self {
            flags,
            port_outputs,
        }
    }

    /// Encode to the 8-byte wire layout.
    pub fn encode(&self) -> [u8; REPORT_LEN] {
        let [p1, p2] = self.port_outputs;
        [self.flags.to_byte(), p1, p2, 0x00, 0x00, 0x00, 0x00, 0x00]
    }
}

/// Encode an output report from its parts.
pub fn encode_output(flags: HubCommandFlags, port_outputs: [u8; PORT_COUNT]) -> [u8; REPORT_LEN] {
    WedoOutputReport::new(flags, port_outputs).encode()
}
