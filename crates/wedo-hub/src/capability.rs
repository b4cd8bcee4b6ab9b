//! Sensor and motor capability surfaces.
//!
//! Handles borrow the hub and remember the binding epoch they were created
//! under. Once the port is reclassified every call on an old handle fails
//! with [`HubError::NotBound`]. Arguments are validated before any lock is
//! taken, so a rejected call never changes state.

use wedo_hid_protocol::{MotorCommand, MotorPolarity, TiltStatus, is_valid_duty_cycle};

use crate::error::{HubError, HubResult};
use crate::hub::Hub;
use crate::port::{PortBinding, PortId};
use crate::scheduler::MotorDrive;
use crate::sensor::{ModeInfo, SensorBinding, SensorKind, SensorReading};

/// Device name exposed for a bound motor.
pub const MOTOR_NAME: &str = "wedo-motor";

/// Parse a motor command from its lowercase name or numeric index.
///
/// # Errors
///
/// Returns [`HubError::InvalidArgument`] for anything else.
pub fn parse_command(value: &str) -> HubResult<MotorCommand> {
    MotorCommand::from_name(value)
        .or_else(|| value.parse().ok().and_then(MotorCommand::from_index))
        .ok_or_else(|| HubError::invalid_argument("command", value, "expected run, coast or brake"))
}

/// Parse a motor polarity from its lowercase name or numeric index.
///
/// # Errors
///
/// Returns [`HubError::InvalidArgument`] for anything else.
pub fn parse_polarity(value: &str) -> HubResult<MotorPolarity> {
    MotorPolarity::from_name(value)
        .or_else(|| value.parse().ok().and_then(MotorPolarity::from_index))
        .ok_or_else(|| HubError::invalid_argument("polarity", value, "expected normal or inverted"))
}

/// Capability handle for a bound tilt or motion sensor.
#[derive(Debug, Clone, Copy)]
pub struct SensorHandle<'a> {
    hub: &'a Hub,
    port: PortId,
    epoch: u64,
    kind: SensorKind,
}

impl<'a> SensorHandle<'a> {
    pub(crate) fn new(hub: &'a Hub, port: PortId, epoch: u64, kind: SensorKind) -> Self {
        Self {
            hub,
            port,
            epoch,
            kind,
        }
    }

    pub fn port(&self) -> PortId {
        self.port
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn num_modes(&self) -> u8 {
        self.kind.num_modes()
    }

    pub fn modes(&self) -> &'static [ModeInfo] {
        self.kind.modes()
    }

    pub fn mode(&self) -> HubResult<u8> {
        self.with_binding(|sensor| sensor.mode())
    }

    pub fn mode_info(&self) -> HubResult<Option<&'static ModeInfo>> {
        self.with_binding(|sensor| sensor.mode_info())
    }

    /// Select a decode mode.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] if `mode` is not below
    /// [`num_modes`](Self::num_modes), or [`HubError::NotBound`] if the
    /// handle is stale.
    pub fn set_mode(&self, mode: u32) -> HubResult<()> {
        let mode = u8::try_from(mode)
            .ok()
            .filter(|m| *m < self.kind.num_modes())
            .ok_or_else(|| HubError::invalid_argument("mode", mode, "no such sensor mode"))?;
        self.with_binding(|sensor| sensor.set_mode(mode))?;
        Ok(())
    }

    /// Select a decode mode by its descriptor name.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] if no mode has that name.
    pub fn set_mode_by_name(&self, name: &str) -> HubResult<()> {
        let index = self
            .kind
            .modes()
            .iter()
            .position(|info| info.name == name)
            .ok_or_else(|| HubError::invalid_argument("mode", name, "no such sensor mode"))?;
        let index = u32::try_from(index)
            .map_err(|_| HubError::invalid_argument("mode", name, "no such sensor mode"))?;
        self.set_mode(index)
    }

    /// Values for the current mode, in mode order.
    pub fn read_values(&self) -> HubResult<Vec<i32>> {
        self.with_binding(|sensor| sensor.reading().values())
    }

    pub fn reading(&self) -> HubResult<SensorReading> {
        self.with_binding(|sensor| sensor.reading())
    }

    /// Committed tilt status; `None` for motion sensors.
    pub fn tilt_status(&self) -> HubResult<Option<TiltStatus>> {
        self.with_binding(|sensor| sensor.tilt_status())
    }

    fn with_binding<R>(&self, f: impl FnOnce(&mut SensorBinding) -> R) -> HubResult<R> {
        let mut telemetry = self.hub.telemetry.lock();
        let state = &mut telemetry.ports[self.port.index()];
        if state.epoch != self.epoch {
            return Err(HubError::not_bound(self.port, "sensor"));
        }
        match &mut state.binding {
            PortBinding::Sensor(sensor) => Ok(f(sensor)),
            _ => Err(HubError::not_bound(self.port, "sensor")),
        }
    }
}

/// Capability handle for a bound motor.
///
/// Setters that change the drive mark the hub's output dirty; setting a
/// value equal to the current one does nothing.
#[derive(Debug, Clone, Copy)]
pub struct MotorHandle<'a> {
    hub: &'a Hub,
    port: PortId,
    epoch: u64,
}

impl<'a> MotorHandle<'a> {
    pub(crate) fn new(hub: &'a Hub, port: PortId, epoch: u64) -> Self {
        Self { hub, port, epoch }
    }

    pub fn port(&self) -> PortId {
        self.port
    }

    pub fn name(&self) -> &'static str {
        MOTOR_NAME
    }

    pub fn supported_commands(&self) -> &'static [MotorCommand] {
        &MotorCommand::SUPPORTED
    }

    pub fn drive(&self) -> HubResult<MotorDrive> {
        self.hub.output.drive_for(self.port, self.epoch)
    }

    pub fn command(&self) -> HubResult<MotorCommand> {
        self.drive().map(|drive| drive.command)
    }

    pub fn set_command(&self, command: MotorCommand) -> HubResult<()> {
        self.update(|drive| drive.command = command)
    }

    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] for an unknown command.
    pub fn set_command_str(&self, value: &str) -> HubResult<()> {
        self.set_command(parse_command(value)?)
    }

    pub fn polarity(&self) -> HubResult<MotorPolarity> {
        self.drive().map(|drive| drive.polarity)
    }

    pub fn set_polarity(&self, polarity: MotorPolarity) -> HubResult<()> {
        self.update(|drive| drive.polarity = polarity)
    }

    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] for an unknown polarity.
    pub fn set_polarity_str(&self, value: &str) -> HubResult<()> {
        self.set_polarity(parse_polarity(value)?)
    }

    pub fn duty_cycle(&self) -> HubResult<i8> {
        self.drive().map(|drive| drive.duty_cycle)
    }

    /// Set the signed duty cycle.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] unless `duty_cycle` is within
    /// −100..=100.
    pub fn set_duty_cycle(&self, duty_cycle: i32) -> HubResult<()> {
        let duty_cycle = i8::try_from(duty_cycle)
            .ok()
            .filter(|_| is_valid_duty_cycle(duty_cycle))
            .ok_or_else(|| {
                HubError::invalid_argument("duty_cycle", duty_cycle, "must be within -100..=100")
            })?;
        self.update(|drive| drive.duty_cycle = duty_cycle)
    }

    fn update(&self, change: impl FnOnce(&mut MotorDrive)) -> HubResult<()> {
        if self.hub.output.update_drive(self.port, self.epoch, change)? {
            tracing::debug!(
                hub = %self.hub.name(),
                port = %self.port,
                drive = ?self.hub.output.drive(self.port),
                "Motor drive changed"
            );
        }
        Ok(())
    }
}
