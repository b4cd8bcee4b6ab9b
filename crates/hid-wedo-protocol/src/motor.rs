//! Motor output byte encoding.
//!
//! The hub drives a motor from the 5 V USB rail with no speed regulation. A
//! port accepts a signed 7-bit drive level, but a motor only starts turning at
//! a level of roughly 28, so a duty cycle of 1..=100 is rescaled onto
//! 28..=127 and 0 always means stop.
//!
//! The high bit of the output byte carries two meanings that must not be
//! conflated: while running it is the direction (two's-complement sign), and at
//! zero drive it is the brake bit (`0x80`).

use serde::{Deserialize, Serialize};

/// Drive level added to the duty cycle magnitude while running.
pub const DRIVE_OFFSET: i16 = 27;

/// Output byte for a braking port.
pub const OUTPUT_BRAKE: u8 = 0x80;

/// Output byte for a stopped or coasting port.
pub const OUTPUT_STOP: u8 = 0x00;

/// Largest accepted duty cycle magnitude.
pub const MAX_DUTY_CYCLE: i8 = 100;

/// Motor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorCommand {
    Run,
    #[default]
    Coast,
    Brake,
}

impl MotorCommand {
    /// Commands the hub supports, in index order.
    pub const SUPPORTED: [MotorCommand; 3] =
        [MotorCommand::Run, MotorCommand::Coast, MotorCommand::Brake];

    pub fn name(self) -> &'static str {
        match self {
            MotorCommand::Run => "run",
            MotorCommand::Coast => "coast",
            MotorCommand::Brake => "brake",
        }
    }

    /// Parse a command from its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::SUPPORTED.into_iter().find(|c| c.name() == name)
    }

    /// Parse a command from its index in [`MotorCommand::SUPPORTED`].
    pub fn from_index(index: u32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::SUPPORTED.get(i).copied())
    }
}

/// Motor polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorPolarity {
    #[default]
    Normal,
    Inverted,
}

impl MotorPolarity {
    pub const ALL: [MotorPolarity; 2] = [MotorPolarity::Normal, MotorPolarity::Inverted];

    pub fn name(self) -> &'static str {
        match self {
            MotorPolarity::Normal => "normal",
            MotorPolarity::Inverted => "inverted",
        }
    }

    /// Parse a polarity from its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Parse a polarity from its index in [`MotorPolarity::ALL`].
    pub fn from_index(index: u32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Returns `true` if `duty_cycle` lies in −100..=100.
pub fn is_valid_duty_cycle(duty_cycle: i32) -> bool {
    (-i32::from(MAX_DUTY_CYCLE)..=i32::from(MAX_DUTY_CYCLE)).contains(&duty_cycle)
}

/// Encode a port's motor state as its output byte.
///
/// `duty_cycle` is expected in −100..=100; values outside are clamped first.
pub fn encode_motor_output(command: MotorCommand, polarity: MotorPolarity, duty_cycle: i8) -> u8 {
    match command {
        MotorCommand::Coast => OUTPUT_STOP,
        MotorCommand::Brake => OUTPUT_BRAKE,
        MotorCommand::Run => {
            let duty = i16::from(duty_cycle.clamp(-MAX_DUTY_CYCLE, MAX_DUTY_CYCLE));
            let level = match duty.signum() {
                0 => 0,
                1 => duty + DRIVE_OFFSET,
                _ => duty - DRIVE_OFFSET,
            };
            let level = match polarity {
                MotorPolarity::Normal => level,
                MotorPolarity::Inverted => -level,
            };
            // level is within −127..=127 here
            i8::try_from(level).map_or(OUTPUT_STOP, |v| v.to_le_bytes()[0])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(command: MotorCommand, polarity: MotorPolarity, duty: i8) -> i8 {
        i8::from_le_bytes([encode_motor_output(command, polarity, duty)])
    }

    #[test]
    fn run_normal_scales_into_drive_range() {
        assert_eq!(signed(MotorCommand::Run, MotorPolarity::Normal, 1), 28);
        assert_eq!(signed(MotorCommand::Run, MotorPolarity::Normal, 100), 127);
        assert_eq!(signed(MotorCommand::Run, MotorPolarity::Normal, -1), -28);
        assert_eq!(signed(MotorCommand::Run, MotorPolarity::Normal, -100), -127);
    }

    #[test]
    fn run_inverted_mirrors() {
        assert_eq!(signed(MotorCommand::Run, MotorPolarity::Inverted, 1), -28);
        assert_eq!(signed(MotorCommand::Run, MotorPolarity::Inverted, -1), 28);
        assert_eq!(signed(MotorCommand::Run, MotorPolarity::Inverted, 100), -127);
    }

    #[test]
    fn run_zero_is_stop() {
        for polarity in MotorPolarity::ALL {
            assert_eq!(encode_motor_output(MotorCommand::Run, polarity, 0), OUTPUT_STOP);
        }
    }

    #[test]
    fn coast_and_brake_ignore_duty_and_polarity() {
        for polarity in MotorPolarity::ALL {
            for duty in [-100, -1, 0, 1, 100] {
                assert_eq!(encode_motor_output(MotorCommand::Coast, polarity, duty), 0x00);
                assert_eq!(encode_motor_output(MotorCommand::Brake, polarity, duty), 0x80);
            }
        }
    }

    #[test]
    fn out_of_range_duty_is_clamped() {
        assert_eq!(
            encode_motor_output(MotorCommand::Run, MotorPolarity::Normal, 127),
            encode_motor_output(MotorCommand::Run, MotorPolarity::Normal, 100)
        );
    }

    #[test]
    fn duty_cycle_validation() {
        assert!(is_valid_duty_cycle(100));
        assert!(is_valid_duty_cycle(-100));
        assert!(!is_valid_duty_cycle(101));
        assert!(!is_valid_duty_cycle(-101));
    }

    #[test]
    fn parse_names_and_indices() {
        assert_eq!(MotorCommand::from_name("brake"), Some(MotorCommand::Brake));
        assert_eq!(MotorCommand::from_name("reverse"), None);
        assert_eq!(MotorCommand::from_index(0), Some(MotorCommand::Run));
        assert_eq!(MotorCommand::from_index(3), None);
        assert_eq!(MotorPolarity::from_name("inverted"), Some(MotorPolarity::Inverted));
        assert_eq!(MotorPolarity::from_index(2), None);
    }
}
