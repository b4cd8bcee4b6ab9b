//! Capture trace files.
//!
//! Traces use the same JSON layout as the HID capture tool: a vendor and
//! product id in hex and a list of timestamped reports whose bytes are
//! written as space-separated `0xNN` tokens.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use wedo_hid_protocol::is_wedo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureReport {
    pub timestamp_us: u64,
    pub report_id: u8,
    pub data: String,
}

impl CaptureReport {
    pub fn from_bytes(timestamp_us: u64, bytes: &[u8]) -> Self {
        Self {
            timestamp_us,
            report_id: bytes.first().copied().unwrap_or_default(),
            data: format_hex(bytes),
        }
    }

    /// Raw report bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not a list of hex bytes.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        parse_hex_bytes(&self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFile {
    pub vendor_id: String,
    pub product_id: String,
    #[serde(default)]
    pub captures: Vec<CaptureReport>,
}

impl CaptureFile {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a trace.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse trace '{}'", path.display()))
    }

    /// Returns `true` if the trace was captured from a WeDo hub. Unparseable
    /// ids count as foreign.
    pub fn is_wedo(&self) -> bool {
        match (parse_hex_u16(&self.vendor_id), parse_hex_u16(&self.product_id)) {
            (Ok(vid), Ok(pid)) => is_wedo(vid, pid),
            _ => false,
        }
    }
}

/// Parse `0x0694`, `0X0694` or `0694`.
///
/// # Errors
///
/// Returns a message naming the rejected value.
pub fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(s, 16).map_err(|e| format!("invalid hex value '{s}': {e}"))
}

/// Parse whitespace-separated hex bytes, with or without `0x` prefixes.
///
/// # Errors
///
/// Returns an error naming the first token that is not a byte.
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    s.split_whitespace()
        .map(|token| {
            let digits = token.trim_start_matches("0x").trim_start_matches("0X");
            if digits.is_empty() || digits.len() > 2 {
                bail!("invalid hex byte '{token}'");
            }
            u8::from_str_radix(digits, 16).with_context(|| format!("invalid hex byte '{token}'"))
        })
        .collect()
}

pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_bytes_accept_both_spellings() -> Result<()> {
        assert_eq!(parse_hex_bytes("0x00 A0 0x1f")?, vec![0x00, 0xA0, 0x1F]);
        assert_eq!(parse_hex_bytes("")?, Vec::<u8>::new());
        Ok(())
    }

    #[test]
    fn test_hex_bytes_reject_garbage() {
        assert!(parse_hex_bytes("0x100").is_err());
        assert!(parse_hex_bytes("0xZZ").is_err());
        assert!(parse_hex_bytes("0x").is_err());
    }

    #[test]
    fn test_capture_report_keeps_capture_tool_layout() -> Result<()> {
        let report = CaptureReport::from_bytes(42, &[0x40, 0x96, 0, 38, 0, 0, 0, 0]);
        assert_eq!(report.report_id, 0x40);
        assert_eq!(report.data, "0x40 0x96 0x00 0x26 0x00 0x00 0x00 0x00");

        let value = serde_json::to_value(&report)?;
        assert_eq!(value["timestamp_us"], 42);
        assert_eq!(report.bytes()?.len(), 8);
        Ok(())
    }

    #[test]
    fn test_trace_identity() {
        let file = CaptureFile {
            vendor_id: "0x0694".into(),
            product_id: "0x0003".into(),
            captures: Vec::new(),
        };
        assert!(file.is_wedo());

        let foreign = CaptureFile {
            product_id: "0x0001".into(),
            ..file
        };
        assert!(!foreign.is_wedo());
    }

    #[test]
    fn test_missing_captures_default_to_empty() -> Result<()> {
        let file: CaptureFile =
            serde_json::from_str(r#"{"vendor_id": "0x0694", "product_id": "0x0003"}"#)?;
        assert!(file.captures.is_empty());
        Ok(())
    }
}
