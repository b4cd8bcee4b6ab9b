//! In-memory collaborators for tests and offline replay.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};
use wedo_hid_protocol::{DeviceCategory, REPORT_LEN};

use crate::error::{RegistryError, TransportError};
use crate::link::AsyncHidLink;
use crate::port::PortId;
use crate::registry::DeviceRegistry;
use crate::transport::Transport;

/// Transport that records submissions without completing them. Tests drive
/// completions by calling the hub's handlers directly.
#[derive(Debug, Default)]
pub struct MockTransport {
    reads: Mutex<usize>,
    writes: Mutex<Vec<[u8; REPORT_LEN]>>,
    refuse_writes: Mutex<usize>,
    closed: Mutex<bool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads_submitted(&self) -> usize {
        *self.reads.lock()
    }

    /// Every frame submitted so far, oldest first.
    pub fn writes(&self) -> Vec<[u8; REPORT_LEN]> {
        self.writes.lock().clone()
    }

    pub fn writes_submitted(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn last_write(&self) -> Option<[u8; REPORT_LEN]> {
        self.writes.lock().last().copied()
    }

    /// Refuse the next `count` write submissions.
    pub fn refuse_writes(&self, count: usize) {
        *self.refuse_writes.lock() = count;
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}

impl Transport for MockTransport {
    fn submit_read(&self) -> Result<(), TransportError> {
        if *self.closed.lock() {
            return Err(TransportError::Closed);
        }
        *self.reads.lock() += 1;
        Ok(())
    }

    fn submit_write(&self, frame: [u8; REPORT_LEN]) -> Result<(), TransportError> {
        if *self.closed.lock() {
            return Err(TransportError::Closed);
        }
        let mut refuse = self.refuse_writes.lock();
        if *refuse > 0 {
            *refuse -= 1;
            return Err(TransportError::Disconnected);
        }
        self.writes.lock().push(frame);
        Ok(())
    }

    fn close(&self) {
        *self.closed.lock() = true;
    }
}

/// A call made against [`MockRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    Bind(PortId, DeviceCategory),
    Unbind(PortId, DeviceCategory),
}

/// Registry that records every call and can be told to fail binds.
#[derive(Debug, Default)]
pub struct MockRegistry {
    events: Mutex<Vec<RegistryEvent>>,
    failing_binds: Mutex<usize>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls that succeeded, oldest first. Failed binds are not recorded.
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.lock().clone()
    }

    /// Fail the next `count` bind calls.
    pub fn fail_binds(&self, count: usize) {
        *self.failing_binds.lock() = count;
    }
}

impl DeviceRegistry for MockRegistry {
    fn bind(&self, port: PortId, category: DeviceCategory) -> Result<(), RegistryError> {
        let mut failing = self.failing_binds.lock();
        if *failing > 0 {
            *failing -= 1;
            return Err(RegistryError::bind_failed(port, category, "injected failure"));
        }
        self.events.lock().push(RegistryEvent::Bind(port, category));
        Ok(())
    }

    fn unbind(&self, port: PortId, category: DeviceCategory) {
        self.events.lock().push(RegistryEvent::Unbind(port, category));
    }
}

/// Async link fed from a queue of raw reports.
///
/// `read_report` waits until a report is pushed and fails with
/// [`TransportError::Disconnected`] once the link is disconnected and the
/// queue is empty.
#[derive(Debug)]
pub struct MockHidLink {
    reports: mpsc::UnboundedSender<Vec<u8>>,
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    written: Mutex<Vec<Vec<u8>>>,
    write_faults: Mutex<VecDeque<TransportError>>,
    wrote: Notify,
}

impl MockHidLink {
    pub fn new() -> Self {
        let (reports, incoming) = mpsc::unbounded_channel();
        Self {
            reports,
            incoming: tokio::sync::Mutex::new(incoming),
            written: Mutex::new(Vec::new()),
            write_faults: Mutex::new(VecDeque::new()),
            wrote: Notify::new(),
        }
    }

    /// Queue a raw report for a future read.
    pub fn push_report(&self, report: impl Into<Vec<u8>>) {
        // The receiver lives as long as `self`.
        let _ = self.reports.send(report.into());
    }

    /// Fail the next write with `error`.
    pub fn inject_write_fault(&self, error: TransportError) {
        self.write_faults.lock().push_back(error);
    }

    /// Every frame written so far, oldest first. Faulted writes included.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().clone()
    }

    /// Wait until at least `count` frames have been written.
    pub async fn wait_for_writes(&self, count: usize) {
        loop {
            let notified = self.wrote.notified();
            if self.written.lock().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

impl Default for MockHidLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AsyncHidLink for MockHidLink {
    async fn read_report(&self) -> Result<Vec<u8>, TransportError> {
        let mut incoming = self.incoming.lock().await;
        incoming.recv().await.ok_or(TransportError::Disconnected)
    }

    async fn write_report(&self, frame: &[u8]) -> Result<usize, TransportError> {
        self.written.lock().push(frame.to_vec());
        self.wrote.notify_waiters();
        match self.write_faults.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(frame.len()),
        }
    }
}
