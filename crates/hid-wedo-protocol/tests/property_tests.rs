//! Property tests for the WeDo HID protocol.
//!
//! Verifies invariants across a wide range of inputs using `proptest`.

use proptest::prelude::*;
use wedo_hid_protocol as wedo;

fn any_command() -> impl Strategy<Value = wedo::MotorCommand> {
    prop_oneof![
        Just(wedo::MotorCommand::Run),
        Just(wedo::MotorCommand::Coast),
        Just(wedo::MotorCommand::Brake),
    ]
}

fn any_polarity() -> impl Strategy<Value = wedo::MotorPolarity> {
    prop_oneof![
        Just(wedo::MotorPolarity::Normal),
        Just(wedo::MotorPolarity::Inverted),
    ]
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(500))]

    /// parse fails for every length other than 8.
    #[test]
    fn prop_parse_rejects_wrong_length(len in 0usize..64) {
        prop_assume!(len != wedo::REPORT_LEN);
        let data = vec![0u8; len];
        prop_assert!(
            wedo::parse(&data).is_err(),
            "parse of {len}-byte slice must fail"
        );
    }

    /// Port samples come straight from bytes 2–5.
    #[test]
    fn prop_parse_port_bytes(bytes in any::<[u8; 8]>()) {
        let report = wedo::parse(&bytes).expect("parse must succeed for 8-byte slice");
        prop_assert_eq!(report.ports[0].input, bytes[2]);
        prop_assert_eq!(report.ports[0].id, bytes[3]);
        prop_assert_eq!(report.ports[1].input, bytes[4]);
        prop_assert_eq!(report.ports[1].id, bytes[5]);
        prop_assert_eq!(report.voltage, bytes[1]);
    }

    /// Decoded status flags mirror their bits.
    #[test]
    fn prop_status_flag_bits(status in any::<u8>()) {
        let flags = wedo::HubStatusFlags::from_byte(status);
        prop_assert_eq!(flags.error, status & 0x80 != 0);
        prop_assert_eq!(flags.high_power, status & 0x40 != 0);
        prop_assert_eq!(flags.echo_in, status & 0x01 != 0);
        prop_assert_eq!(flags.to_byte(), status & 0xC1);
    }

    /// Exactly one of the high-power on/off bits is set in every frame.
    #[test]
    fn prop_high_power_bits_exclusive(
        clear_error in any::<bool>(),
        high_power in any::<bool>(),
        shut_down in any::<bool>(),
        reset in any::<bool>(),
        echo_out in any::<bool>(),
    ) {
        let flags = wedo::HubCommandFlags { clear_error, high_power, shut_down, reset, echo_out };
        let byte = flags.to_byte();
        prop_assert_eq!(byte & 0x40 != 0, high_power);
        prop_assert_eq!(byte & 0x20 != 0, !high_power);
    }

    /// Reserved output bytes are always zero.
    #[test]
    fn prop_output_reserved_zeros(p1 in any::<u8>(), p2 in any::<u8>()) {
        let report = wedo::encode_output(wedo::HubCommandFlags::default(), [p1, p2]);
        prop_assert_eq!(report[1], p1);
        prop_assert_eq!(report[2], p2);
        prop_assert_eq!(&report[3..], &[0u8; 5]);
    }

    /// Running at non-zero duty always lands in the 28..=127 drive band.
    #[test]
    fn prop_run_drive_band(duty in -100i8..=100, polarity in any_polarity()) {
        prop_assume!(duty != 0);
        let byte = wedo::encode_motor_output(wedo::MotorCommand::Run, polarity, duty);
        let level = i8::from_le_bytes([byte]);
        prop_assert!((28..=127).contains(&level.unsigned_abs()));
    }

    /// Inverting polarity negates the drive level.
    #[test]
    fn prop_inversion_negates(duty in -100i8..=100) {
        let normal = i8::from_le_bytes([wedo::encode_motor_output(
            wedo::MotorCommand::Run, wedo::MotorPolarity::Normal, duty)]);
        let inverted = i8::from_le_bytes([wedo::encode_motor_output(
            wedo::MotorCommand::Run, wedo::MotorPolarity::Inverted, duty)]);
        prop_assert_eq!(i16::from(normal), -i16::from(inverted));
    }

    /// Non-run commands ignore duty cycle and polarity.
    #[test]
    fn prop_non_run_constant(command in any_command(), polarity in any_polarity(), duty in -100i8..=100) {
        let byte = wedo::encode_motor_output(command, polarity, duty);
        match command {
            wedo::MotorCommand::Coast => prop_assert_eq!(byte, wedo::OUTPUT_STOP),
            wedo::MotorCommand::Brake => prop_assert_eq!(byte, wedo::OUTPUT_BRAKE),
            wedo::MotorCommand::Run => prop_assert!(duty == 0 || byte != wedo::OUTPUT_STOP),
        }
    }

    /// Every identity byte classifies into the first table entry that covers it.
    #[test]
    fn prop_classify_first_covering_bound(raw_id in any::<u8>()) {
        let category = wedo::DeviceCategory::classify(raw_id);
        prop_assert!(raw_id <= category.max_identity());
        let position = wedo::IDENTITY_TABLE
            .iter()
            .position(|(_, c)| *c == category)
            .expect("category must be in the table");
        if position > 0 {
            prop_assert!(raw_id > wedo::IDENTITY_TABLE[position - 1].0);
        }
    }

    /// Tilt classification is monotonic in the raw reading.
    #[test]
    fn prop_tilt_monotonic(a in any::<u8>(), b in any::<u8>()) {
        let index = |raw: u8| {
            let status = wedo::TiltStatus::classify(raw);
            wedo::TILT_TABLE.iter().position(|(_, s)| *s == status)
        };
        if a <= b {
            prop_assert!(index(a) <= index(b));
        }
    }
}
