//! Device-category and tilt-status threshold tables.
//!
//! Both tables are sorted sets of inclusive upper bounds: a raw analog byte
//! belongs to the first entry whose bound is greater than or equal to it. The
//! final entry of each table is `255`, so every byte classifies.

use serde::{Deserialize, Serialize};

/// Number of device categories recognised from a port's identity byte.
pub const CATEGORY_COUNT: usize = 15;

/// Number of tilt statuses recognised from a tilt sensor's analog reading.
pub const TILT_STATUS_COUNT: usize = 6;

/// Device category inferred from a port's raw identity byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    ShortLo,
    Bend,
    Tilt,
    Future,
    Raw,
    Touch,
    Sound,
    Temp,
    Light,
    Motion,
    LightBrick,
    #[serde(rename = "22")]
    Category22,
    Open,
    Motor,
    ShortHi,
}

/// Identity table: `(inclusive upper bound, category)` in ascending order.
pub const IDENTITY_TABLE: [(u8, DeviceCategory); CATEGORY_COUNT] = [
    (9, DeviceCategory::ShortLo),
    (27, DeviceCategory::Bend),
    (47, DeviceCategory::Tilt),
    (67, DeviceCategory::Future),
    (87, DeviceCategory::Raw),
    (109, DeviceCategory::Touch),
    (131, DeviceCategory::Sound),
    (152, DeviceCategory::Temp),
    (169, DeviceCategory::Light),
    (190, DeviceCategory::Motion),
    (211, DeviceCategory::LightBrick),
    (224, DeviceCategory::Category22),
    (233, DeviceCategory::Open),
    (246, DeviceCategory::Motor),
    (255, DeviceCategory::ShortHi),
];

impl DeviceCategory {
    /// All categories in identity-table order.
    pub const ALL: [DeviceCategory; CATEGORY_COUNT] = [
        DeviceCategory::ShortLo,
        DeviceCategory::Bend,
        DeviceCategory::Tilt,
        DeviceCategory::Future,
        DeviceCategory::Raw,
        DeviceCategory::Touch,
        DeviceCategory::Sound,
        DeviceCategory::Temp,
        DeviceCategory::Light,
        DeviceCategory::Motion,
        DeviceCategory::LightBrick,
        DeviceCategory::Category22,
        DeviceCategory::Open,
        DeviceCategory::Motor,
        DeviceCategory::ShortHi,
    ];

    /// Classify a raw identity byte.
    pub fn classify(raw_id: u8) -> Self {
        IDENTITY_TABLE
            .iter()
            .find(|(max, _)| raw_id <= *max)
            .map_or(DeviceCategory::ShortHi, |(_, category)| *category)
    }

    /// Inclusive upper bound of this category's identity range.
    pub fn max_identity(self) -> u8 {
        IDENTITY_TABLE
            .iter()
            .find(|(_, category)| *category == self)
            .map_or(u8::MAX, |(max, _)| *max)
    }

    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            DeviceCategory::ShortLo => "shortlo",
            DeviceCategory::Bend => "bend",
            DeviceCategory::Tilt => "tilt",
            DeviceCategory::Future => "future",
            DeviceCategory::Raw => "raw",
            DeviceCategory::Touch => "touch",
            DeviceCategory::Sound => "sound",
            DeviceCategory::Temp => "temp",
            DeviceCategory::Light => "light",
            DeviceCategory::Motion => "motion",
            DeviceCategory::LightBrick => "lightbrick",
            DeviceCategory::Category22 => "22",
            DeviceCategory::Open => "open",
            DeviceCategory::Motor => "motor",
            DeviceCategory::ShortHi => "shorthi",
        }
    }

    /// Look a category up by its stable name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.name() == name)
    }
}

impl core::fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Discrete orientation reported by the tilt sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TiltStatus {
    #[default]
    Unknown,
    Back,
    Right,
    Level,
    Front,
    Left,
}

/// Tilt table: `(inclusive upper bound, status)` in ascending order.
pub const TILT_TABLE: [(u8, TiltStatus); TILT_STATUS_COUNT] = [
    (0, TiltStatus::Unknown),
    (48, TiltStatus::Back),
    (99, TiltStatus::Right),
    (153, TiltStatus::Level),
    (204, TiltStatus::Front),
    (255, TiltStatus::Left),
];

impl TiltStatus {
    /// Classify a raw tilt reading.
    pub fn classify(raw_input: u8) -> Self {
        TILT_TABLE
            .iter()
            .find(|(max, _)| raw_input <= *max)
            .map_or(TiltStatus::Left, |(_, status)| *status)
    }

    /// `(left/right, back/front)` axis pair, each in −1..=1.
    pub fn axes(self) -> (i8, i8) {
        match self {
            TiltStatus::Back => (0, -1),
            TiltStatus::Right => (1, 0),
            TiltStatus::Front => (0, 1),
            TiltStatus::Left => (-1, 0),
            TiltStatus::Level | TiltStatus::Unknown => (0, 0),
        }
    }

    /// Single status code: level 0, front 1, back 2, left 3, right 4.
    pub fn status_code(self) -> u8 {
        match self {
            TiltStatus::Level | TiltStatus::Unknown => 0,
            TiltStatus::Front => 1,
            TiltStatus::Back => 2,
            TiltStatus::Left => 3,
            TiltStatus::Right => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TiltStatus::Unknown => "unknown",
            TiltStatus::Back => "back",
            TiltStatus::Right => "right",
            TiltStatus::Level => "level",
            TiltStatus::Front => "front",
            TiltStatus::Left => "left",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_table_is_ascending_and_complete() {
        let bounds: Vec<u8> = IDENTITY_TABLE.iter().map(|(max, _)| *max).collect();
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(bounds.last().copied(), Some(u8::MAX));
    }

    #[test]
    fn identity_boundaries() {
        assert_eq!(DeviceCategory::classify(0), DeviceCategory::ShortLo);
        assert_eq!(DeviceCategory::classify(9), DeviceCategory::ShortLo);
        assert_eq!(DeviceCategory::classify(10), DeviceCategory::Bend);
        assert_eq!(DeviceCategory::classify(28), DeviceCategory::Tilt);
        assert_eq!(DeviceCategory::classify(47), DeviceCategory::Tilt);
        assert_eq!(DeviceCategory::classify(48), DeviceCategory::Future);
        assert_eq!(DeviceCategory::classify(180), DeviceCategory::Motion);
        assert_eq!(DeviceCategory::classify(212), DeviceCategory::Category22);
        assert_eq!(DeviceCategory::classify(240), DeviceCategory::Motor);
        assert_eq!(DeviceCategory::classify(247), DeviceCategory::ShortHi);
        assert_eq!(DeviceCategory::classify(255), DeviceCategory::ShortHi);
    }

    #[test]
    fn category_names_round_trip() {
        for category in DeviceCategory::ALL {
            assert_eq!(DeviceCategory::from_name(category.name()), Some(category));
        }
        assert_eq!(DeviceCategory::from_name("servo"), None);
    }

    #[test]
    fn max_identity_matches_table() {
        assert_eq!(DeviceCategory::Tilt.max_identity(), 47);
        assert_eq!(DeviceCategory::Motor.max_identity(), 246);
    }

    #[test]
    fn tilt_boundaries() {
        assert_eq!(TiltStatus::classify(0), TiltStatus::Unknown);
        assert_eq!(TiltStatus::classify(1), TiltStatus::Back);
        assert_eq!(TiltStatus::classify(48), TiltStatus::Back);
        assert_eq!(TiltStatus::classify(49), TiltStatus::Right);
        assert_eq!(TiltStatus::classify(153), TiltStatus::Level);
        assert_eq!(TiltStatus::classify(200), TiltStatus::Front);
        assert_eq!(TiltStatus::classify(255), TiltStatus::Left);
    }

    #[test]
    fn tilt_right_decodes() {
        assert_eq!(TiltStatus::Right.axes(), (1, 0));
        assert_eq!(TiltStatus::Right.status_code(), 4);
    }

    #[test]
    fn tilt_level_and_unknown_are_neutral() {
        assert_eq!(TiltStatus::Level.axes(), (0, 0));
        assert_eq!(TiltStatus::Unknown.axes(), (0, 0));
        assert_eq!(TiltStatus::Unknown.status_code(), 0);
    }

    #[test]
    fn category_serde_names() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&DeviceCategory::Category22)?, "\"22\"");
        assert_eq!(serde_json::to_string(&DeviceCategory::LightBrick)?, "\"lightbrick\"");
        let parsed: DeviceCategory = serde_json::from_str("\"motor\"")?;
        assert_eq!(parsed, DeviceCategory::Motor);
        Ok(())
    }
}
