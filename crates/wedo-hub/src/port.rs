//! Per-port state and debounced device-category classification.

use serde::{Deserialize, Serialize};
use wedo_hid_protocol::{DeviceCategory, PORT_COUNT};

use crate::debounce::Debouncer;
use crate::sensor::{SensorBinding, SensorKind};

/// One of the hub's two ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortId {
    Port1,
    Port2,
}

impl PortId {
    pub const ALL: [PortId; PORT_COUNT] = [PortId::Port1, PortId::Port2];

    /// Zero-based index into per-port arrays.
    pub fn index(self) -> usize {
        match self {
            PortId::Port1 => 0,
            PortId::Port2 => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PortId::Port1 => "port1",
            PortId::Port2 => "port2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|port| port.name() == name)
    }
}

impl core::fmt::Display for PortId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Behavior a committed category binds to a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Sensor(SensorKind),
    Motor,
}

impl BindingKind {
    /// Binding for a category; `None` for categories that are recognised
    /// but inert.
    pub fn for_category(category: DeviceCategory) -> Option<Self> {
        match category {
            DeviceCategory::Motor => Some(BindingKind::Motor),
            other => SensorKind::for_category(other).map(BindingKind::Sensor),
        }
    }
}

/// Decoder/encoder currently bound to a port.
///
/// Motor drive parameters are read when building output frames, so they
/// live with the output scheduler rather than here.
#[derive(Debug, Clone, Default)]
pub enum PortBinding {
    #[default]
    Unbound,
    Sensor(SensorBinding),
    Motor,
}

impl PortBinding {
    pub fn kind(&self) -> Option<BindingKind> {
        match self {
            PortBinding::Unbound => None,
            PortBinding::Sensor(sensor) => Some(BindingKind::Sensor(sensor.kind())),
            PortBinding::Motor => Some(BindingKind::Motor),
        }
    }
}

/// From-device state of one port.
#[derive(Debug, Clone)]
pub struct PortState {
    pub(crate) raw_input: u8,
    pub(crate) raw_id: u8,
    pub(crate) classified: Option<DeviceCategory>,
    pub(crate) classifier: Debouncer<DeviceCategory>,
    pub(crate) binding: PortBinding,
    /// Bumped on every commit; capability handles carry the value they saw.
    pub(crate) epoch: u64,
}

impl PortState {
    pub fn new(debounce_threshold: u32) -> Self {
        Self {
            raw_input: 0,
            raw_id: 0,
            classified: None,
            classifier: Debouncer::new(debounce_threshold),
            binding: PortBinding::Unbound,
            epoch: 0,
        }
    }

    /// Record a sample and classify its identity byte. Returns the category
    /// on the sample that commits it.
    pub fn observe(&mut self, raw_input: u8, raw_id: u8) -> Option<DeviceCategory> {
        self.raw_input = raw_input;
        self.raw_id = raw_id;
        self.classifier.observe(DeviceCategory::classify(raw_id))
    }

    pub fn snapshot(&self) -> PortSnapshot {
        PortSnapshot {
            raw_input: self.raw_input,
            raw_id: self.raw_id,
            classified: self.classified,
            candidate: self.classifier.candidate(),
            debounce_count: self.classifier.count(),
            binding: self.binding.kind(),
        }
    }
}

/// Read-only copy of a port's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortSnapshot {
    pub raw_input: u8,
    pub raw_id: u8,
    pub classified: Option<DeviceCategory>,
    pub candidate: Option<DeviceCategory>,
    pub debounce_count: u32,
    pub binding: Option<BindingKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_names() {
        assert_eq!(PortId::Port1.to_string(), "port1");
        assert_eq!(PortId::from_name("port2"), Some(PortId::Port2));
        assert_eq!(PortId::from_name("port3"), None);
        assert_eq!(PortId::Port2.index(), 1);
    }

    #[test]
    fn test_binding_for_category() {
        assert_eq!(
            BindingKind::for_category(DeviceCategory::Tilt),
            Some(BindingKind::Sensor(SensorKind::Tilt))
        );
        assert_eq!(
            BindingKind::for_category(DeviceCategory::Motor),
            Some(BindingKind::Motor)
        );
        assert_eq!(BindingKind::for_category(DeviceCategory::Sound), None);
        assert_eq!(BindingKind::for_category(DeviceCategory::ShortHi), None);
    }

    #[test]
    fn test_observe_commits_after_threshold() {
        let mut port = PortState::new(3);
        assert_eq!(port.observe(0, 240), None);
        assert_eq!(port.observe(0, 241), None);
        assert_eq!(port.observe(0, 238), Some(DeviceCategory::Motor));
        assert_eq!(port.observe(0, 240), None);
        let snap = port.snapshot();
        assert_eq!(snap.raw_id, 240);
        assert_eq!(snap.candidate, Some(DeviceCategory::Motor));
        assert_eq!(snap.classified, None);
    }

    #[test]
    fn test_new_port_is_unclassified() {
        let snap = PortState::new(100).snapshot();
        assert_eq!(snap.classified, None);
        assert_eq!(snap.candidate, None);
        assert_eq!(snap.binding, None);
    }
}
