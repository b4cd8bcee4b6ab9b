//! Single-flight output scheduling.
//!
//! Every mutation that changes the output frame raises a dirty bit. The
//! telemetry loop checks it once per cycle and, if no write is outstanding,
//! clears it, marks a write in flight and builds a frame from the current
//! state. Mutations that land while a write is outstanding collapse into the
//! next frame: this is coalescing, not a queue.
//!
//! # Locking
//!
//! One mutex covers the dirty and in-flight bits, the halt flag, the hub
//! command flags and both ports' motor drive parameters. Methods here return
//! the frame to submit; callers hand it to the transport after the lock is
//! released.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use wedo_hid_protocol::{
    HubCommandFlags, MotorCommand, MotorPolarity, PORT_COUNT, REPORT_LEN, WedoOutputReport,
    encode_motor_output,
};

use crate::error::{HubError, HubResult};
use crate::port::PortId;

/// An encoded output frame.
pub type OutputFrame = [u8; REPORT_LEN];

/// Motor drive parameters of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotorDrive {
    pub command: MotorCommand,
    pub polarity: MotorPolarity,
    /// Always within −100..=100.
    pub duty_cycle: i8,
}

impl MotorDrive {
    /// Encoded output byte for this drive state.
    pub fn output(&self) -> u8 {
        encode_motor_output(self.command, self.polarity, self.duty_cycle)
    }
}

/// What the write-completion path must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCompletion {
    /// Nothing further to submit.
    Done,
    /// Resubmit the faulted frame.
    Retry(OutputFrame),
    /// Submit a frame whose mutation predates the halt.
    Flush(OutputFrame),
}

#[derive(Debug, Default)]
struct OutputState {
    dirty: bool,
    in_flight: bool,
    halted: bool,
    flags: HubCommandFlags,
    drives: [MotorDrive; PORT_COUNT],
    /// `Some(epoch)` while a motor is bound to the port.
    motor_epochs: [Option<u64>; PORT_COUNT],
    pending: Option<OutputFrame>,
    retries_left: u8,
}

impl OutputState {
    fn mark_dirty(&mut self) {
        if !self.halted {
            self.dirty = true;
        }
    }

    fn is_drained(&self) -> bool {
        !self.dirty && !self.in_flight
    }

    fn build_frame(&self) -> OutputFrame {
        let [d1, d2] = self.drives;
        WedoOutputReport::new(self.flags, [d1.output(), d2.output()]).encode()
    }

    fn begin(&mut self, retry_limit: u8) -> Option<OutputFrame> {
        if !self.dirty || self.in_flight {
            return None;
        }
        self.dirty = false;
        self.in_flight = true;
        let frame = self.build_frame();
        self.pending = Some(frame);
        self.retries_left = retry_limit;
        Some(frame)
    }

    fn reset_drive(&mut self, port: PortId) {
        let slot = &mut self.drives[port.index()];
        if *slot != MotorDrive::default() {
            *slot = MotorDrive::default();
            self.mark_dirty();
        }
    }
}

/// Dirty-bit output scheduler with an at-most-one in-flight write.
#[derive(Debug)]
pub struct OutputScheduler {
    state: Mutex<OutputState>,
    drained: Condvar,
    retry_limit: u8,
}

impl OutputScheduler {
    pub fn new(retry_limit: u8) -> Self {
        Self {
            state: Mutex::new(OutputState::default()),
            drained: Condvar::new(),
            retry_limit,
        }
    }

    /// Apply a change to the hub command flags. Returns `true` if they
    /// changed, in which case the scheduler is marked dirty.
    pub fn update_flags(&self, change: impl FnOnce(&mut HubCommandFlags)) -> bool {
        let mut state = self.state.lock();
        let before = state.flags;
        change(&mut state.flags);
        let changed = state.flags != before;
        if changed {
            state.mark_dirty();
        }
        changed
    }

    pub fn flags(&self) -> HubCommandFlags {
        self.state.lock().flags
    }

    /// Bind a motor to `port` with default drive parameters.
    pub fn attach_motor(&self, port: PortId, epoch: u64) {
        let mut state = self.state.lock();
        state.reset_drive(port);
        state.motor_epochs[port.index()] = Some(epoch);
    }

    /// Unbind the motor on `port`. A port that was still driving is stopped.
    pub fn detach_motor(&self, port: PortId) {
        let mut state = self.state.lock();
        state.motor_epochs[port.index()] = None;
        state.reset_drive(port);
    }

    /// Drive of the motor bound to `port` under `epoch`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotBound`] if `epoch` no longer identifies the
    /// motor bound to `port`.
    pub fn drive_for(&self, port: PortId, epoch: u64) -> HubResult<MotorDrive> {
        let state = self.state.lock();
        if state.motor_epochs[port.index()] != Some(epoch) {
            return Err(HubError::not_bound(port, "motor"));
        }
        Ok(state.drives[port.index()])
    }

    pub fn drive(&self, port: PortId) -> MotorDrive {
        self.state.lock().drives[port.index()]
    }

    /// Duty cycles of both ports, in port order.
    pub fn duty_cycles(&self) -> [i8; PORT_COUNT] {
        let state = self.state.lock();
        let [d1, d2] = state.drives;
        [d1.duty_cycle, d2.duty_cycle]
    }

    /// Change a bound motor's drive. Returns `true` if anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotBound`] if `epoch` no longer identifies the
    /// motor bound to `port`.
    pub fn update_drive(
        &self,
        port: PortId,
        epoch: u64,
        change: impl FnOnce(&mut MotorDrive),
    ) -> HubResult<bool> {
        let mut state = self.state.lock();
        if state.motor_epochs[port.index()] != Some(epoch) {
            return Err(HubError::not_bound(port, "motor"));
        }
        let slot = &mut state.drives[port.index()];
        let before = *slot;
        change(slot);
        let changed = *slot != before;
        if changed {
            state.mark_dirty();
        }
        Ok(changed)
    }

    /// Start a write if one is due. The returned frame must be submitted.
    pub fn begin_write(&self) -> Option<OutputFrame> {
        self.state.lock().begin(self.retry_limit)
    }

    /// Record the outcome of the in-flight write.
    pub fn complete_write(&self, succeeded: bool) -> WriteCompletion {
        let mut state = self.state.lock();

        if !succeeded && state.retries_left > 0 {
            if let Some(frame) = state.pending {
                state.retries_left -= 1;
                return WriteCompletion::Retry(frame);
            }
        }

        state.in_flight = false;
        state.pending = None;

        // Mutations that predate the halt are flushed from here, since the
        // read loop no longer runs.
        if state.halted {
            if let Some(frame) = state.begin(self.retry_limit) {
                return WriteCompletion::Flush(frame);
            }
        }

        if state.is_drained() {
            self.drained.notify_all();
        }
        WriteCompletion::Done
    }

    /// Undo [`begin_write`](Self::begin_write) after the transport refused
    /// the frame. The change is re-marked dirty unless the hub is halted.
    pub fn abort_write(&self) {
        let mut state = self.state.lock();
        state.in_flight = false;
        state.pending = None;
        state.mark_dirty();
        if state.is_drained() {
            self.drained.notify_all();
        }
    }

    /// Stop raising the dirty bit. Returns a final frame to submit if a
    /// change was pending and no write was outstanding.
    pub fn halt(&self) -> Option<OutputFrame> {
        let mut state = self.state.lock();
        state.halted = true;
        let frame = state.begin(self.retry_limit);
        if state.is_drained() {
            self.drained.notify_all();
        }
        frame
    }

    pub fn is_halted(&self) -> bool {
        self.state.lock().halted
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    /// Frame the current state would encode to.
    pub fn current_frame(&self) -> OutputFrame {
        self.state.lock().build_frame()
    }

    /// Block until nothing is dirty and nothing is in flight.
    pub fn wait_drained(&self) {
        let mut state = self.state.lock();
        while !state.is_drained() {
            self.drained.wait(&mut state);
        }
    }

    /// Like [`wait_drained`](Self::wait_drained) with an upper bound.
    /// Returns `true` if the scheduler drained in time.
    pub fn wait_drained_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.is_drained() {
            if self.drained.wait_until(&mut state, deadline).timed_out() {
                return state.is_drained();
            }
        }
        true
    }
}
