//! Sensor bindings: mode descriptors, tilt classification and decode.
//!
//! A sensor port reports a single raw analog byte. What that byte means is
//! selected by the sensor's mode, and each mode maps to one
//! [`SensorDecoder`] variant.

use serde::{Deserialize, Serialize};
use wedo_hid_protocol::{DeviceCategory, TiltStatus};

use crate::debounce::Debouncer;

/// Value encoding of a sensor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    S8,
}

/// Static description of one sensor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeInfo {
    pub name: &'static str,
    pub units: &'static str,
    pub data_sets: u8,
    pub data_type: DataType,
    pub raw_min: i32,
    pub raw_max: i32,
}

const TILT_MODES: [ModeInfo; 3] = [
    ModeInfo {
        name: "WEDO-TILT-RAW",
        units: "",
        data_sets: 1,
        data_type: DataType::U8,
        raw_min: 0,
        raw_max: 255,
    },
    ModeInfo {
        name: "WEDO-TILT-AXIS",
        units: "",
        data_sets: 2,
        data_type: DataType::S8,
        raw_min: -1,
        raw_max: 1,
    },
    ModeInfo {
        name: "WEDO-TILT-STATUS",
        units: "",
        data_sets: 1,
        data_type: DataType::U8,
        raw_min: 0,
        raw_max: 4,
    },
];

const MOTION_MODES: [ModeInfo; 1] = [ModeInfo {
    name: "WEDO-MOTION-RAW",
    units: "",
    data_sets: 1,
    data_type: DataType::U8,
    raw_min: 0,
    raw_max: 255,
}];

/// Sensor families with a behavioral binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Tilt,
    Motion,
}

impl SensorKind {
    /// Sensor kind bound for a device category, if any.
    pub fn for_category(category: DeviceCategory) -> Option<Self> {
        match category {
            DeviceCategory::Tilt => Some(SensorKind::Tilt),
            DeviceCategory::Motion => Some(SensorKind::Motion),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Tilt => "wedo-tilt",
            SensorKind::Motion => "wedo-motion",
        }
    }

    pub fn modes(self) -> &'static [ModeInfo] {
        match self {
            SensorKind::Tilt => &TILT_MODES,
            SensorKind::Motion => &MOTION_MODES,
        }
    }

    pub fn num_modes(self) -> u8 {
        match self {
            SensorKind::Tilt => 3,
            SensorKind::Motion => 1,
        }
    }

    /// Decoder for `mode`, or `None` if the mode does not exist.
    pub fn decoder(self, mode: u8) -> Option<SensorDecoder> {
        match (self, mode) {
            (SensorKind::Tilt, 0) => Some(SensorDecoder::RawPassthrough),
            (SensorKind::Tilt, 1) => Some(SensorDecoder::TiltAxis),
            (SensorKind::Tilt, 2) => Some(SensorDecoder::TiltStatus),
            (SensorKind::Motion, 0) => Some(SensorDecoder::Motion),
            _ => None,
        }
    }
}

/// Decode behavior selected by a sensor's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDecoder {
    /// Raw byte, unfiltered.
    RawPassthrough,
    /// Debounced tilt as a left/right, back/front axis pair.
    TiltAxis,
    /// Debounced tilt as a single status code.
    TiltStatus,
    /// Motion sensor raw byte, unfiltered.
    Motion,
}

/// Values last reported by a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SensorReading {
    Raw { value: u8 },
    Axis { left_right: i8, back_front: i8 },
    Status { code: u8 },
}

impl SensorReading {
    /// Zero reading for a decoder, before any sample has been decoded.
    pub fn zero(decoder: SensorDecoder) -> Self {
        match decoder {
            SensorDecoder::RawPassthrough | SensorDecoder::Motion => SensorReading::Raw { value: 0 },
            SensorDecoder::TiltAxis => SensorReading::Axis {
                left_right: 0,
                back_front: 0,
            },
            SensorDecoder::TiltStatus => SensorReading::Status { code: 0 },
        }
    }

    /// Reported values in mode order.
    pub fn values(&self) -> Vec<i32> {
        match *self {
            SensorReading::Raw { value } => vec![i32::from(value)],
            SensorReading::Axis {
                left_right,
                back_front,
            } => vec![i32::from(left_right), i32::from(back_front)],
            SensorReading::Status { code } => vec![i32::from(code)],
        }
    }
}

/// Debounced tilt classifier.
#[derive(Debug, Clone, Copy)]
pub struct TiltClassifier {
    debouncer: Debouncer<TiltStatus>,
    status: TiltStatus,
}

impl TiltClassifier {
    pub fn new(threshold: u32) -> Self {
        Self {
            debouncer: Debouncer::new(threshold),
            status: TiltStatus::Unknown,
        }
    }

    /// Feed one raw reading and return the committed status.
    pub fn update(&mut self, raw_input: u8) -> TiltStatus {
        if let Some(status) = self.debouncer.observe(TiltStatus::classify(raw_input)) {
            self.status = status;
        }
        self.status
    }

    pub fn status(&self) -> TiltStatus {
        self.status
    }

    pub fn debounce_count(&self) -> u32 {
        self.debouncer.count()
    }
}

/// Per-port state of a bound sensor.
#[derive(Debug, Clone)]
pub struct SensorBinding {
    kind: SensorKind,
    mode: u8,
    tilt: Option<TiltClassifier>,
    reading: SensorReading,
}

impl SensorBinding {
    /// Bind a sensor in mode 0.
    pub fn new(kind: SensorKind, tilt_threshold: u32) -> Self {
        let tilt = matches!(kind, SensorKind::Tilt).then(|| TiltClassifier::new(tilt_threshold));
        let decoder = kind.decoder(0).unwrap_or(SensorDecoder::RawPassthrough);
        Self {
            kind,
            mode: 0,
            tilt,
            reading: SensorReading::zero(decoder),
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn mode_info(&self) -> Option<&'static ModeInfo> {
        self.kind.modes().get(usize::from(self.mode))
    }

    pub fn decoder(&self) -> SensorDecoder {
        self.kind
            .decoder(self.mode)
            .unwrap_or(SensorDecoder::RawPassthrough)
    }

    /// Select a mode. Returns `false` and leaves state untouched if the mode
    /// does not exist for this sensor.
    pub fn set_mode(&mut self, mode: u8) -> bool {
        let Some(decoder) = self.kind.decoder(mode) else {
            return false;
        };
        if mode != self.mode {
            self.mode = mode;
            self.reading = SensorReading::zero(decoder);
        }
        true
    }

    /// Refresh the reading from one raw sample.
    pub fn decode(&mut self, raw_input: u8) -> SensorReading {
        self.reading = match self.decoder() {
            SensorDecoder::RawPassthrough | SensorDecoder::Motion => {
                SensorReading::Raw { value: raw_input }
            }
            SensorDecoder::TiltAxis => {
                let (left_right, back_front) = self.update_tilt(raw_input).axes();
                SensorReading::Axis {
                    left_right,
                    back_front,
                }
            }
            SensorDecoder::TiltStatus => SensorReading::Status {
                code: self.update_tilt(raw_input).status_code(),
            },
        };
        self.reading
    }

    pub fn reading(&self) -> SensorReading {
        self.reading
    }

    /// Committed tilt status, for tilt sensors.
    pub fn tilt_status(&self) -> Option<TiltStatus> {
        self.tilt.as_ref().map(TiltClassifier::status)
    }

    fn update_tilt(&mut self, raw_input: u8) -> TiltStatus {
        self.tilt
            .as_mut()
            .map_or(TiltStatus::Unknown, |tilt| tilt.update(raw_input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIGHT: u8 = 70;
    const FRONT: u8 = 180;

    #[test]
    fn test_categories_with_sensor_binding() {
        assert_eq!(SensorKind::for_category(DeviceCategory::Tilt), Some(SensorKind::Tilt));
        assert_eq!(
            SensorKind::for_category(DeviceCategory::Motion),
            Some(SensorKind::Motion)
        );
        assert_eq!(SensorKind::for_category(DeviceCategory::Light), None);
        assert_eq!(SensorKind::for_category(DeviceCategory::Motor), None);
    }

    #[test]
    fn test_mode_tables_match_counts() {
        for kind in [SensorKind::Tilt, SensorKind::Motion] {
            assert_eq!(kind.modes().len(), usize::from(kind.num_modes()));
            for mode in 0..kind.num_modes() {
                assert!(kind.decoder(mode).is_some());
            }
            assert!(kind.decoder(kind.num_modes()).is_none());
        }
    }

    #[test]
    fn test_new_binding_starts_in_mode_zero() {
        let binding = SensorBinding::new(SensorKind::Tilt, 4);
        assert_eq!(binding.mode(), 0);
        assert_eq!(binding.reading(), SensorReading::Raw { value: 0 });
        assert_eq!(binding.mode_info().map(|m| m.name), Some("WEDO-TILT-RAW"));
    }

    #[test]
    fn test_raw_mode_is_unfiltered() {
        let mut binding = SensorBinding::new(SensorKind::Tilt, 4);
        assert_eq!(binding.decode(RIGHT), SensorReading::Raw { value: RIGHT });
        assert_eq!(binding.decode(FRONT), SensorReading::Raw { value: FRONT });
        assert_eq!(binding.tilt_status(), Some(TiltStatus::Unknown));
    }

    #[test]
    fn test_axis_mode_debounces() {
        let mut binding = SensorBinding::new(SensorKind::Tilt, 4);
        assert!(binding.set_mode(1));
        for _ in 0..3 {
            assert_eq!(
                binding.decode(RIGHT),
                SensorReading::Axis {
                    left_right: 0,
                    back_front: 0
                }
            );
        }
        assert_eq!(
            binding.decode(RIGHT),
            SensorReading::Axis {
                left_right: 1,
                back_front: 0
            }
        );
    }

    #[test]
    fn test_status_mode_reports_right_as_four() {
        let mut binding = SensorBinding::new(SensorKind::Tilt, 4);
        assert!(binding.set_mode(2));
        let mut last = binding.reading();
        for _ in 0..4 {
            last = binding.decode(RIGHT);
        }
        assert_eq!(last, SensorReading::Status { code: 4 });
        assert_eq!(last.values(), vec![4]);
    }

    #[test]
    fn test_interrupted_tilt_run_restarts() {
        let mut tilt = TiltClassifier::new(4);
        for _ in 0..3 {
            tilt.update(RIGHT);
        }
        tilt.update(FRONT);
        assert_eq!(tilt.debounce_count(), 1);
        for _ in 0..3 {
            assert_eq!(tilt.update(RIGHT), TiltStatus::Unknown);
        }
        assert_eq!(tilt.update(RIGHT), TiltStatus::Right);
    }

    #[test]
    fn test_set_mode_out_of_range_is_rejected() {
        let mut binding = SensorBinding::new(SensorKind::Motion, 4);
        assert!(!binding.set_mode(1));
        assert_eq!(binding.mode(), 0);
        assert_eq!(binding.decode(200).values(), vec![200]);
    }

    #[test]
    fn test_axis_values_order() {
        let reading = SensorReading::Axis {
            left_right: -1,
            back_front: 0,
        };
        assert_eq!(reading.values(), vec![-1, 0]);
    }
}
