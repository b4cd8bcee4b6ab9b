//! WeDo input report parsing.
//!
//! # Report layout (8 bytes)
//! | Offset | Field         | Encoding                                  |
//! |--------|---------------|-------------------------------------------|
//! | 0      | status        | bit7 error, bit6 high power, bit0 echo    |
//! | 1      | voltage       | raw, ×49 = millivolts                     |
//! | 2      | port 1 input  | raw analog reading                        |
//! | 3      | port 1 id     | raw analog identity value                 |
//! | 4      | port 2 input  | raw analog reading                        |
//! | 5      | port 2 id     | raw analog identity value                 |
//! | 6–7    | reserved      | ignored                                   |

use serde::{Deserialize, Serialize};

/// Input and output report length in bytes. The link carries no framing.
pub const REPORT_LEN: usize = 8;

/// Millivolts per raw voltage count.
pub const MILLIVOLTS_PER_COUNT: u32 = 49;

/// Number of ports on a hub.
pub const PORT_COUNT: usize = 2;

const STATUS_ERROR: u8 = 0x80;
const STATUS_HIGH_POWER: u8 = 0x40;
const STATUS_ECHO: u8 = 0x01;

/// Errors returned by [`parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// The report was not exactly [`REPORT_LEN`] bytes.
    #[error("wrong report length: got {got} bytes, need {need}")]
    WrongLength { got: usize, need: usize },
}

/// Status flags reported by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HubStatusFlags {
    pub error: bool,
    pub high_power: bool,
    pub echo_in: bool,
}

impl HubStatusFlags {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            error: byte & STATUS_ERROR != 0,
            high_power: byte & STATUS_HIGH_POWER != 0,
            echo_in: byte & STATUS_ECHO != 0,
        }
    }

    /// Status byte with only the decoded bits set.
    pub fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.error {
            byte |= STATUS_ERROR;
        }
        if self.high_power {
            byte |= STATUS_HIGH_POWER;
        }
        if self.echo_in {
            byte |= STATUS_ECHO;
        }
        byte
    }
}

/// Raw per-port sample from one input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortSample {
    /// Raw analog reading.
    pub input: u8,
    /// Raw analog identity value.
    pub id: u8,
}

/// Parsed WeDo input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WedoInputReport {
    pub status: HubStatusFlags,
    /// Status byte as received, reserved bits included.
    pub raw_status: u8,
    pub voltage: u8,
    pub ports: [PortSample; PORT_COUNT],
}

impl WedoInputReport {
    /// Supply voltage in millivolts.
    pub fn voltage_millivolts(&self) -> u32 {
        u32::from(self.voltage) * MILLIVOLTS_PER_COUNT
    }

    /// Build the wire bytes for this report. Reserved bytes are zero.
    pub fn to_bytes(&self) -> [u8; REPORT_LEN] {
        let [p1, p2] = self.ports;
        [
            self.raw_status,
            self.voltage,
            p1.input,
            p1.id,
            p2.input,
            p2.id,
            0x00,
            0x00,
        ]
    }
}

/// Parse a raw input report.
///
/// Anything other than exactly [`REPORT_LEN`] bytes is rejected; callers keep
/// their previous state when that happens.
pub fn parse(data: &[u8]) -> Result<WedoInputReport, ReportError> {
    let Ok(bytes) = <[u8; REPORT_LEN]>::try_from(data) else {
        return Err(ReportError::WrongLength {
            got: data.len(),
            need: REPORT_LEN,
        });
    };
    let [status, voltage, in1, id1, in2, id2, _, _] = bytes;

    Ok(WedoInputReport {
        status: HubStatusFlags::from_byte(status),
        raw_status: status,
        voltage,
        ports: [
            PortSample { input: in1, id: id1 },
            PortSample { input: in2, id: id2 },
        ],
    })
}
