//! Offline replay of captured input reports.
//!
//! Each capture is delivered to a hub as a read completion. Writes the hub
//! submits are recorded and completed successfully before the next capture.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wedo_hid_protocol::{DeviceCategory, MotorCommand, MotorPolarity, PORT_COUNT, REPORT_LEN};
use wedo_hub::mock::{MockRegistry, MockTransport, RegistryEvent};
use wedo_hub::{CounterSnapshot, Hub, HubConfig, HubFactory, PortId, PortSnapshot, SensorKind};

use crate::trace::{CaptureFile, format_hex};

/// Drive applied to every motor that binds during a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorSettings {
    pub command: MotorCommand,
    pub polarity: MotorPolarity,
    pub duty_cycle: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    pub config: HubConfig,
    /// Mode selected on every tilt sensor that binds.
    pub tilt_mode: Option<u32>,
    pub motor: Option<MotorSettings>,
}

/// Something observable that happened while replaying a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Malformed {
        index: usize,
        len: usize,
    },
    Classified {
        index: usize,
        port: PortId,
        category: DeviceCategory,
    },
    Bound {
        index: usize,
        port: PortId,
        category: DeviceCategory,
    },
    Unbound {
        index: usize,
        port: PortId,
        category: DeviceCategory,
    },
    Reading {
        index: usize,
        port: PortId,
        values: Vec<i32>,
    },
    Write {
        index: usize,
        frame: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub hub: String,
    pub reports: usize,
    pub voltage_mv: u32,
    pub ports: [PortSnapshot; PORT_COUNT],
    pub counters: CounterSnapshot,
    pub events: Vec<ReplayEvent>,
}

struct Replay<'a> {
    hub: Hub,
    transport: Arc<MockTransport>,
    registry: Arc<MockRegistry>,
    options: &'a ReplayOptions,
    events: Vec<ReplayEvent>,
    seen_registry: usize,
    seen_writes: usize,
    last_values: [Option<Vec<i32>>; PORT_COUNT],
}

/// Replay every capture in `trace` through a fresh hub.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a capture is not hex,
/// or a requested sensor mode or motor drive is rejected.
pub fn replay(trace: &CaptureFile, options: &ReplayOptions) -> Result<ReplaySummary> {
    if !trace.is_wedo() {
        warn!(
            vendor_id = %trace.vendor_id,
            product_id = %trace.product_id,
            "Trace was not captured from a WeDo hub"
        );
    }

    let factory = HubFactory::new(options.config.clone())?;
    let transport = Arc::new(MockTransport::new());
    let registry = Arc::new(MockRegistry::new());
    let hub = factory.create(transport.clone(), registry.clone())?;
    hub.start()?;

    let mut replay = Replay {
        hub,
        transport,
        registry,
        options,
        events: Vec::new(),
        seen_registry: 0,
        seen_writes: 0,
        last_values: [None, None],
    };

    for (index, capture) in trace.captures.iter().enumerate() {
        let bytes = capture
            .bytes()
            .with_context(|| format!("Capture {index} is not a hex report"))?;
        replay.step(index, &bytes)?;
    }

    replay.hub.halt();
    replay.complete_writes(trace.captures.len());
    replay.hub.shutdown();

    let hub = &replay.hub;
    Ok(ReplaySummary {
        hub: hub.name().to_string(),
        reports: trace.captures.len(),
        voltage_mv: hub.voltage_millivolts(),
        ports: PortId::ALL.map(|port| hub.port(port)),
        counters: hub.counters().snapshot(),
        events: replay.events,
    })
}

impl Replay<'_> {
    fn step(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        let before = PortId::ALL.map(|port| self.hub.port(port).classified);
        self.hub.on_read_complete(Ok(bytes));

        if bytes.len() != REPORT_LEN {
            debug!(index, len = bytes.len(), "Skipping malformed capture");
            self.events.push(ReplayEvent::Malformed {
                index,
                len: bytes.len(),
            });
            return Ok(());
        }

        for port in PortId::ALL {
            let after = self.hub.port(port).classified;
            if let Some(category) = after.filter(|_| after != before[port.index()]) {
                self.events.push(ReplayEvent::Classified {
                    index,
                    port,
                    category,
                });
            }
        }

        let registry_events = self.registry.events();
        for event in registry_events.iter().skip(self.seen_registry) {
            match *event {
                RegistryEvent::Bind(port, category) => {
                    self.events.push(ReplayEvent::Bound {
                        index,
                        port,
                        category,
                    });
                    self.configure(port)?;
                }
                RegistryEvent::Unbind(port, category) => {
                    self.events.push(ReplayEvent::Unbound {
                        index,
                        port,
                        category,
                    });
                }
            }
        }
        self.seen_registry = registry_events.len();

        for port in PortId::ALL {
            let values = match self.hub.sensor(port) {
                Ok(sensor) => Some(sensor.read_values()?),
                Err(_) => None,
            };
            let last = &mut self.last_values[port.index()];
            if let Some(values) = values.as_ref().filter(|v| last.as_ref() != Some(*v)) {
                self.events.push(ReplayEvent::Reading {
                    index,
                    port,
                    values: values.clone(),
                });
            }
            *last = values;
        }

        self.complete_writes(index);
        Ok(())
    }

    /// Apply the requested sensor mode or motor drive to a new binding.
    fn configure(&self, port: PortId) -> Result<()> {
        if let Ok(sensor) = self.hub.sensor(port) {
            if let (SensorKind::Tilt, Some(mode)) = (sensor.kind(), self.options.tilt_mode) {
                sensor
                    .set_mode(mode)
                    .with_context(|| format!("Cannot select tilt mode {mode} on {port}"))?;
            }
        }

        if let (Ok(motor), Some(settings)) = (self.hub.motor(port), self.options.motor) {
            motor.set_command(settings.command)?;
            motor.set_polarity(settings.polarity)?;
            motor
                .set_duty_cycle(settings.duty_cycle)
                .with_context(|| format!("Cannot drive {port}"))?;
        }
        Ok(())
    }

    /// Record and complete every submitted write, including flushes the
    /// completions themselves trigger.
    fn complete_writes(&mut self, index: usize) {
        loop {
            let writes = self.transport.writes();
            if writes.len() == self.seen_writes {
                return;
            }
            for frame in writes.iter().skip(self.seen_writes) {
                self.events.push(ReplayEvent::Write {
                    index,
                    frame: format_hex(frame),
                });
                self.hub.on_write_complete(Ok(REPORT_LEN));
            }
            self.seen_writes = writes.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::CaptureReport;

    fn trace(reports: &[&[u8]]) -> CaptureFile {
        CaptureFile {
            vendor_id: "0x0694".into(),
            product_id: "0x0003".into(),
            captures: reports
                .iter()
                .enumerate()
                .map(|(i, bytes)| CaptureReport::from_bytes(i as u64 * 8_000, bytes))
                .collect(),
        }
    }

    fn options(threshold: u32) -> Result<ReplayOptions> {
        Ok(ReplayOptions {
            config: HubConfig::builder()
                .port_debounce_threshold(threshold)
                .build()?,
            ..ReplayOptions::default()
        })
    }

    #[test]
    fn test_replay_reports_binding_and_readings() -> Result<()> {
        let tilt: &[u8] = &[0x00, 0xA0, 70, 38, 0, 0, 0, 0];
        let summary = replay(&trace(&[tilt, tilt, &[1, 2, 3]]), &options(2)?)?;

        assert_eq!(summary.hub, "hub0");
        assert_eq!(summary.reports, 3);
        assert_eq!(summary.voltage_mv, 160 * 49);
        assert!(summary.events.contains(&ReplayEvent::Bound {
            index: 1,
            port: PortId::Port1,
            category: DeviceCategory::Tilt,
        }));
        assert!(summary.events.contains(&ReplayEvent::Reading {
            index: 1,
            port: PortId::Port1,
            values: vec![70],
        }));
        assert!(summary.events.contains(&ReplayEvent::Malformed { index: 2, len: 3 }));
        assert_eq!(summary.counters.reports_malformed, 1);
        Ok(())
    }

    #[test]
    fn test_replay_drives_bound_motor() -> Result<()> {
        let motor: &[u8] = &[0x00, 0xA0, 0, 240, 0, 0, 0, 0];
        let mut options = options(1)?;
        options.motor = Some(MotorSettings {
            command: MotorCommand::Run,
            polarity: MotorPolarity::Normal,
            duty_cycle: 100,
        });
        let summary = replay(&trace(&[motor, motor]), &options)?;

        assert!(summary.events.contains(&ReplayEvent::Write {
            index: 1,
            frame: "0x20 0x7F 0x00 0x00 0x00 0x00 0x00 0x00".into(),
        }));
        assert_eq!(summary.counters.writes_submitted, 1);
        Ok(())
    }

    #[test]
    fn test_replay_flushes_drive_set_on_last_report() -> Result<()> {
        let motor: &[u8] = &[0x00, 0xA0, 0, 240, 0, 0, 0, 0];
        let mut options = options(1)?;
        options.motor = Some(MotorSettings {
            command: MotorCommand::Brake,
            polarity: MotorPolarity::Normal,
            duty_cycle: 0,
        });
        let summary = replay(&trace(&[motor]), &options)?;

        assert_eq!(
            summary.events.last(),
            Some(&ReplayEvent::Write {
                index: 1,
                frame: "0x20 0x80 0x00 0x00 0x00 0x00 0x00 0x00".into(),
            })
        );
        Ok(())
    }

    #[test]
    fn test_invalid_motor_drive_is_reported() -> Result<()> {
        let motor: &[u8] = &[0x00, 0xA0, 0, 240, 0, 0, 0, 0];
        let mut options = options(1)?;
        options.motor = Some(MotorSettings {
            command: MotorCommand::Run,
            polarity: MotorPolarity::Normal,
            duty_cycle: 150,
        });
        assert!(replay(&trace(&[motor]), &options).is_err());
        Ok(())
    }
}
