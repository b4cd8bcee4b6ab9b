//! The hub engine: telemetry loop completion handlers and hub-level state.
//!
//! # Threading
//!
//! [`Hub::on_read_complete`] and [`Hub::on_write_complete`] may be called
//! concurrently from independent completion contexts, and concurrently with
//! the capability surface. Two locks exist:
//!
//! - the telemetry lock, covering from-device fields, per-port
//!   classification and sensor bindings;
//! - the output lock inside [`OutputScheduler`], covering everything read
//!   to build an output frame.
//!
//! When both are needed they are taken in that order. Neither is held while
//! calling [`Transport::submit_read`] or [`Transport::submit_write`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use wedo_hid_protocol::{
    DeviceCategory, HubCommandFlags, HubStatusFlags, MILLIVOLTS_PER_COUNT, PORT_COUNT, REPORT_LEN,
    WedoInputReport, parse,
};

use crate::capability::{MotorHandle, SensorHandle};
use crate::config::HubConfig;
use crate::counters::HubCounters;
use crate::error::{HubError, HubResult, TransportError};
use crate::port::{BindingKind, PortBinding, PortId, PortSnapshot, PortState};
use crate::registry::DeviceRegistry;
use crate::scheduler::{OutputFrame, OutputScheduler, WriteCompletion};
use crate::sensor::SensorBinding;
use crate::transport::Transport;

/// From-device state, written only by the read-completion path.
#[derive(Debug)]
pub(crate) struct TelemetryState {
    pub(crate) status: HubStatusFlags,
    pub(crate) raw_status: u8,
    pub(crate) voltage: u8,
    pub(crate) ports: [PortState; PORT_COUNT],
}

impl TelemetryState {
    fn new(port_debounce_threshold: u32) -> Self {
        Self {
            status: HubStatusFlags::default(),
            raw_status: 0,
            voltage: 0,
            ports: [
                PortState::new(port_debounce_threshold),
                PortState::new(port_debounce_threshold),
            ],
        }
    }
}

/// One attached WeDo hub.
pub struct Hub {
    name: String,
    config: HubConfig,
    transport: Arc<dyn Transport>,
    registry: Arc<dyn DeviceRegistry>,
    pub(crate) telemetry: Mutex<TelemetryState>,
    pub(crate) output: OutputScheduler,
    counters: HubCounters,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl Hub {
    /// Build a hub. Prefer [`HubFactory::create`](crate::HubFactory::create),
    /// which also assigns the name.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not validate.
    pub fn new(
        name: impl Into<String>,
        config: HubConfig,
        transport: Arc<dyn Transport>,
        registry: Arc<dyn DeviceRegistry>,
    ) -> HubResult<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            telemetry: Mutex::new(TelemetryState::new(config.port_debounce_threshold)),
            output: OutputScheduler::new(config.write_retry_limit),
            config,
            transport,
            registry,
            counters: HubCounters::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn counters(&self) -> &HubCounters {
        &self.counters
    }

    /// Submit the first read. Polling continues from the read-completion
    /// path until the hub is halted.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub is halted or the transport refuses the
    /// submission.
    pub fn start(&self) -> HubResult<()> {
        if self.output.is_halted() {
            return Err(HubError::Halted(self.name.clone()));
        }
        info!(hub = %self.name, "Starting telemetry loop");
        self.transport.submit_read()?;
        Ok(())
    }

    /// Read-completion handler.
    ///
    /// Decodes the report, updates from-device state, runs classification
    /// and sensor decode, services the output scheduler and resubmits the
    /// read. Faults and malformed reports change no state.
    pub fn on_read_complete(&self, result: Result<&[u8], TransportError>) {
        if self.output.is_halted() {
            debug!(hub = %self.name, "Dropping read completion after halt");
            return;
        }

        match result {
            Err(err) => {
                self.counters.inc_read_fault();
                warn!(hub = %self.name, error = %err, "Read transfer failed");
            }
            Ok(bytes) => match parse(bytes) {
                Err(err) => {
                    self.counters.inc_malformed();
                    debug!(hub = %self.name, error = %err, "Discarding malformed report");
                }
                Ok(report) => {
                    self.counters.inc_report();
                    self.apply_report(&report);
                    self.service_output();
                }
            },
        }

        self.resubmit_read();
    }

    /// Write-completion handler. `Ok` carries the number of bytes sent.
    pub fn on_write_complete(&self, result: Result<usize, TransportError>) {
        let result = match result {
            Ok(sent) if sent == REPORT_LEN => Ok(()),
            Ok(sent) => Err(TransportError::ShortWrite {
                sent,
                expected: REPORT_LEN,
            }),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.counters.inc_write_fault();
            warn!(hub = %self.name, error = %err, "Write transfer failed");
        }

        match self.output.complete_write(result.is_ok()) {
            WriteCompletion::Done => {}
            WriteCompletion::Retry(frame) => {
                self.counters.inc_write_retry();
                debug!(hub = %self.name, "Resubmitting faulted write");
                self.submit_frame(frame);
            }
            WriteCompletion::Flush(frame) => {
                debug!(hub = %self.name, "Flushing output after halt");
                self.submit_frame(frame);
            }
        }
    }

    /// Submit an output frame if state changed and no write is in flight.
    /// Called at the end of every telemetry cycle.
    pub fn service_output(&self) {
        if let Some(frame) = self.output.begin_write() {
            self.submit_frame(frame);
        }
    }

    fn submit_frame(&self, frame: OutputFrame) {
        self.counters.inc_write_submitted();
        if let Err(err) = self.transport.submit_write(frame) {
            warn!(hub = %self.name, error = %err, "Output submission refused");
            self.output.abort_write();
        }
    }

    fn resubmit_read(&self) {
        if self.output.is_halted() {
            return;
        }
        if let Err(err) = self.transport.submit_read() {
            warn!(hub = %self.name, error = %err, "Read resubmission refused");
        }
    }

    fn apply_report(&self, report: &WedoInputReport) {
        // Ports under active drive skip reclassification.
        let duty_cycles = self.output.duty_cycles();

        let mut telemetry = self.telemetry.lock();
        // Shutdown raises the halt before it takes this lock to unbind.
        if self.output.is_halted() {
            debug!(hub = %self.name, "Dropping report applied after halt");
            return;
        }
        telemetry.status = report.status;
        telemetry.raw_status = report.raw_status;
        telemetry.voltage = report.voltage;

        for port in PortId::ALL {
            let sample = report.ports[port.index()];
            let state = &mut telemetry.ports[port.index()];

            if duty_cycles[port.index()] == 0 {
                let previous = state.classifier.candidate();
                let committed = state.observe(sample.input, sample.id);
                let candidate = state.classifier.candidate();
                if previous.is_some() && previous != candidate {
                    debug!(
                        hub = %self.name,
                        port = %port,
                        candidate = ?candidate,
                        "Identity changed, debounce restarted"
                    );
                }
                if let Some(category) = committed {
                    self.commit(port, state, category);
                }
            }

            let raw_input = state.raw_input;
            if let PortBinding::Sensor(sensor) = &mut state.binding {
                sensor.decode(raw_input);
            }
        }
    }

    fn commit(&self, port: PortId, state: &mut PortState, category: DeviceCategory) {
        self.counters.inc_classification();
        let previous = state.classified.replace(category);

        if let (Some(kind), Some(previous)) = (state.binding.kind(), previous) {
            self.registry.unbind(port, previous);
            if kind == BindingKind::Motor {
                self.output.detach_motor(port);
            }
            info!(hub = %self.name, port = %port, category = %previous, "Unbound device");
        }
        state.binding = PortBinding::Unbound;
        state.epoch += 1;

        let Some(kind) = BindingKind::for_category(category) else {
            info!(hub = %self.name, port = %port, category = %category, "Port classified");
            return;
        };

        if let Err(err) = self.registry.bind(port, category) {
            self.counters.inc_bind_failure();
            warn!(
                hub = %self.name,
                port = %port,
                category = %category,
                error = %err,
                "Binding failed, retrying after next debounce run"
            );
            state.classifier.rearm();
            return;
        }

        state.binding = match kind {
            BindingKind::Sensor(sensor) => PortBinding::Sensor(SensorBinding::new(
                sensor,
                self.config.tilt_debounce_threshold,
            )),
            BindingKind::Motor => {
                self.output.attach_motor(port, state.epoch);
                PortBinding::Motor
            }
        };
        info!(hub = %self.name, port = %port, category = %category, "Bound device");
    }

    /// Status flags from the last decoded report.
    pub fn status(&self) -> HubStatusFlags {
        self.telemetry.lock().status
    }

    /// Status byte from the last decoded report, reserved bits included.
    pub fn raw_status(&self) -> u8 {
        self.telemetry.lock().raw_status
    }

    pub fn voltage(&self) -> u8 {
        self.telemetry.lock().voltage
    }

    pub fn voltage_millivolts(&self) -> u32 {
        u32::from(self.voltage()) * MILLIVOLTS_PER_COUNT
    }

    /// High-power state as reported by the device.
    pub fn high_power(&self) -> bool {
        self.status().high_power
    }

    pub fn command_flags(&self) -> HubCommandFlags {
        self.output.flags()
    }

    pub fn set_clear_error(&self, on: bool) {
        self.update_command_flags(|flags| flags.clear_error = on);
    }

    pub fn set_high_power(&self, on: bool) {
        self.update_command_flags(|flags| flags.high_power = on);
    }

    pub fn set_shut_down(&self, on: bool) {
        self.update_command_flags(|flags| flags.shut_down = on);
    }

    pub fn set_reset(&self, on: bool) {
        self.update_command_flags(|flags| flags.reset = on);
    }

    pub fn set_echo_out(&self, on: bool) {
        self.update_command_flags(|flags| flags.echo_out = on);
    }

    /// Apply several flag changes as one mutation.
    pub fn update_command_flags(&self, change: impl FnOnce(&mut HubCommandFlags)) {
        if self.output.update_flags(change) {
            debug!(hub = %self.name, flags = ?self.output.flags(), "Command flags changed");
        }
    }

    /// Read-only view of a port.
    pub fn port(&self, port: PortId) -> PortSnapshot {
        self.telemetry.lock().ports[port.index()].snapshot()
    }

    /// Capability handle for the sensor bound to `port`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotBound`] if no sensor is bound there.
    pub fn sensor(&self, port: PortId) -> HubResult<SensorHandle<'_>> {
        let telemetry = self.telemetry.lock();
        let state = &telemetry.ports[port.index()];
        match &state.binding {
            PortBinding::Sensor(sensor) => {
                Ok(SensorHandle::new(self, port, state.epoch, sensor.kind()))
            }
            _ => Err(HubError::not_bound(port, "sensor")),
        }
    }

    /// Capability handle for the motor bound to `port`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotBound`] if no motor is bound there.
    pub fn motor(&self, port: PortId) -> HubResult<MotorHandle<'_>> {
        let telemetry = self.telemetry.lock();
        let state = &telemetry.ports[port.index()];
        match state.binding {
            PortBinding::Motor => Ok(MotorHandle::new(self, port, state.epoch)),
            _ => Err(HubError::not_bound(port, "motor")),
        }
    }

    /// Stop polling and stop raising the dirty bit. A change that is
    /// pending but not yet written is still flushed.
    pub fn halt(&self) {
        info!(hub = %self.name, "Halting hub");
        if let Some(frame) = self.output.halt() {
            self.submit_frame(frame);
        }
    }

    pub fn is_halted(&self) -> bool {
        self.output.is_halted()
    }

    /// Block until no output change is pending and no write is in flight.
    pub fn wait_drained(&self) {
        self.output.wait_drained();
    }

    /// Like [`wait_drained`](Self::wait_drained) with an upper bound.
    /// Returns `true` if the hub drained in time.
    pub fn wait_drained_for(&self, timeout: Duration) -> bool {
        self.output.wait_drained_for(timeout)
    }

    /// Halt, drain, unbind every port and close the transport.
    pub fn shutdown(&self) {
        self.halt();
        self.wait_drained();

        let mut telemetry = self.telemetry.lock();
        for port in PortId::ALL {
            let state = &mut telemetry.ports[port.index()];
            if let (Some(kind), Some(category)) = (state.binding.kind(), state.classified) {
                self.registry.unbind(port, category);
                if kind == BindingKind::Motor {
                    self.output.detach_motor(port);
                }
            }
            state.binding = PortBinding::Unbound;
            state.epoch += 1;
        }
        drop(telemetry);

        self.transport.close();
        info!(hub = %self.name, "Hub shut down");
    }
}
