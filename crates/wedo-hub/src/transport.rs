//! Transport seam.
//!
//! A transport accepts asynchronous transfer submissions and later reports
//! each one's outcome by calling back into the hub:
//! [`Hub::on_read_complete`](crate::Hub::on_read_complete) for reads and
//! [`Hub::on_write_complete`](crate::Hub::on_write_complete) for writes.
//! Completions may arrive on any thread, concurrently with each other and
//! with capability calls.

use wedo_hid_protocol::REPORT_LEN;

use crate::error::TransportError;

pub trait Transport: Send + Sync {
    /// Queue a read of the next interrupt-in report.
    fn submit_read(&self) -> Result<(), TransportError>;

    /// Queue a SET_REPORT control transfer carrying `frame`.
    fn submit_write(&self, frame: [u8; REPORT_LEN]) -> Result<(), TransportError>;

    /// Stop accepting submissions. Called once, after the hub has drained.
    fn close(&self) {}
}
