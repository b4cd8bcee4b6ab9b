//! WeDo USB identity and transfer constants.
//!
//! ## Transfer notes
//!
//! The hub exposes a single HID interface. Input reports arrive on the first
//! interrupt IN endpoint (endpoint 1) every [`INPUT_POLL_INTERVAL`] frames.
//! Output reports are not sent on an interrupt OUT endpoint; they go through
//! endpoint 0 as a HID class `SET_REPORT` control request.
//!
//! | Field           | Value    | Meaning                              |
//! |-----------------|----------|--------------------------------------|
//! | `bmRequestType` | `0x21`   | class, interface recipient, host→dev |
//! | `bRequest`      | `0x09`   | `SET_REPORT`                         |
//! | `wValue`        | `0x0200` | output report, report ID 0           |
//! | `wIndex`        | `0x0000` | interface 0                          |
//! | `wLength`       | `0x0008` | one 8-byte output report             |

/// LEGO Group USB vendor ID.
pub const VENDOR_ID: u16 = 0x0694;

/// WeDo USB hub product ID.
pub const PRODUCT_WEDO_HUB: u16 = 0x0003;

/// Interrupt IN endpoint carrying input reports.
pub const INPUT_ENDPOINT: u8 = 0x81;

/// Polling interval requested for the interrupt IN endpoint.
pub const INPUT_POLL_INTERVAL: u8 = 32;

/// `bmRequestType` for the output report control transfer.
pub const SET_REPORT_REQUEST_TYPE: u8 = 0x21;

/// HID class `SET_REPORT` request code.
pub const SET_REPORT_REQUEST: u8 = 0x09;

/// `wValue` for the output report control transfer (report type 2, ID 0).
pub const SET_REPORT_VALUE: u16 = 0x0200;

/// `wIndex` for the output report control transfer.
pub const SET_REPORT_INDEX: u16 = 0x0000;

/// Returns `true` if the VID/PID pair identifies a WeDo hub.
pub fn is_wedo(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && pid == PRODUCT_WEDO_HUB
}

/// Returns the product name for a known WeDo PID, or `None` for unknown PIDs.
pub fn product_name(pid: u16) -> Option<&'static str> {
    match pid {
        PRODUCT_WEDO_HUB => Some("LEGO WeDo USB Hub"),
        _ => None,
    }
}
