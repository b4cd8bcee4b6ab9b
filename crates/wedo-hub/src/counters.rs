//! Atomic counters for hub activity.
//!
//! All counters use `Ordering::Relaxed`: they are statistics, not
//! synchronization, and are safe to bump from either completion context.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counter snapshot returned by [`HubCounters::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CounterSnapshot {
    /// Input reports decoded and applied
    pub reports_received: u64,
    /// Input reports discarded for having the wrong length
    pub reports_malformed: u64,
    /// Read completions with a transport fault
    pub read_faults: u64,
    /// Output frames handed to the transport, retries included
    pub writes_submitted: u64,
    /// Write completions with a transport fault
    pub write_faults: u64,
    /// Faulted writes that were resubmitted
    pub write_retries: u64,
    /// Port classifications committed
    pub classifications: u64,
    /// Commits whose external binding failed
    pub bind_failures: u64,
}

#[derive(Debug, Default)]
pub struct HubCounters {
    reports_received: AtomicU64,
    reports_malformed: AtomicU64,
    read_faults: AtomicU64,
    writes_submitted: AtomicU64,
    write_faults: AtomicU64,
    write_retries: AtomicU64,
    classifications: AtomicU64,
    bind_failures: AtomicU64,
}

impl HubCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc_report(&self) {
        self.reports_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_malformed(&self) {
        self.reports_malformed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_read_fault(&self) {
        self.read_faults.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_write_submitted(&self) {
        self.writes_submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_write_fault(&self) {
        self.write_faults.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_write_retry(&self) {
        self.write_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_classification(&self) {
        self.classifications.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_bind_failure(&self) {
        self.bind_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            reports_received: self.reports_received.load(Ordering::Relaxed),
            reports_malformed: self.reports_malformed.load(Ordering::Relaxed),
            read_faults: self.read_faults.load(Ordering::Relaxed),
            writes_submitted: self.writes_submitted.load(Ordering::Relaxed),
            write_faults: self.write_faults.load(Ordering::Relaxed),
            write_retries: self.write_retries.load(Ordering::Relaxed),
            classifications: self.classifications.load(Ordering::Relaxed),
            bind_failures: self.bind_failures.load(Ordering::Relaxed),
        }
    }
}
