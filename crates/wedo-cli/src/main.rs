#![deny(static_mut_refs)]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wedo_cli::{
    CaptureFile, ConfigOverrides, MotorSettings, ReplayEvent, ReplayOptions, ReplaySummary,
    load_config, parse_hex_bytes, replay,
};
use wedo_hid_protocol::{
    DeviceCategory, MotorCommand, MotorPolarity, TiltStatus, encode_motor_output,
    is_valid_duty_cycle, parse,
};
use wedo_hub::{parse_command, parse_polarity};

/// Replay captured LEGO WeDo hub reports through the hub engine.
#[derive(Parser)]
#[command(name = "wedo-replay", version, about = "LEGO WeDo hub report replay tool")]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a capture trace and print what the hub did
    Replay {
        /// Capture trace (JSON)
        trace: PathBuf,
        /// Hub configuration (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the port identity debounce threshold
        #[arg(long)]
        port_debounce: Option<u32>,
        /// Override the tilt debounce threshold
        #[arg(long)]
        tilt_debounce: Option<u32>,
        /// Override the write retry limit
        #[arg(long)]
        write_retries: Option<u8>,
        /// Mode to select on tilt sensors (0 raw, 1 axis, 2 status)
        #[arg(long)]
        tilt_mode: Option<u32>,
        /// Command to apply to bound motors (run, coast, brake)
        #[arg(long, value_parser = parse_command)]
        motor_command: Option<MotorCommand>,
        /// Polarity to apply to bound motors
        #[arg(long, value_parser = parse_polarity, default_value = "normal")]
        motor_polarity: MotorPolarity,
        /// Duty cycle to apply to bound motors (-100..=100)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        motor_duty: i32,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode one input report given as hex bytes
    Decode {
        /// Report bytes, e.g. 0x00 0x96 0x46 0x26 0x00 0xF0 0x00 0x00
        #[arg(required = true, num_args = 1..)]
        bytes: Vec<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Encode one port's motor output byte
    Encode {
        #[arg(long, value_parser = parse_command, default_value = "run")]
        command: MotorCommand,
        #[arg(long, value_parser = parse_polarity, default_value = "normal")]
        polarity: MotorPolarity,
        #[arg(long, allow_negative_numbers = true)]
        duty: i32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("wedo_hub={log_level},wedo_cli={log_level},wedo_replay={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Replay {
            trace,
            config,
            port_debounce,
            tilt_debounce,
            write_retries,
            tilt_mode,
            motor_command,
            motor_polarity,
            motor_duty,
            json,
        } => {
            let overrides = ConfigOverrides {
                port_debounce_threshold: port_debounce,
                tilt_debounce_threshold: tilt_debounce,
                write_retry_limit: write_retries,
            };
            let options = ReplayOptions {
                config: load_config(config.as_deref(), overrides)?,
                tilt_mode,
                motor: motor_command.map(|command| MotorSettings {
                    command,
                    polarity: motor_polarity,
                    duty_cycle: motor_duty,
                }),
            };
            let capture = CaptureFile::load(&trace)?;
            let summary = replay(&capture, &options)?;
            if json {
                let json = serde_json::to_string_pretty(&summary)
                    .context("Failed to serialize replay summary")?;
                println!("{json}");
            } else {
                print_summary(&summary);
            }
        }
        Commands::Decode { bytes, json } => decode(&bytes.join(" "), json)?,
        Commands::Encode {
            command,
            polarity,
            duty,
        } => {
            if !is_valid_duty_cycle(duty) {
                bail!("duty cycle {duty} is outside -100..=100");
            }
            let duty = i8::try_from(duty).context("duty cycle out of range")?;
            let byte = encode_motor_output(command, polarity, duty);
            println!("0x{byte:02X} ({})", i8::from_ne_bytes([byte]));
        }
    }

    Ok(())
}

fn decode(hex: &str, json: bool) -> Result<()> {
    let bytes = parse_hex_bytes(hex)?;
    let report = parse(&bytes).context("Not a WeDo input report")?;

    if json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "status: error={} high_power={} echo_in={} (0x{:02X})",
        report.status.error, report.status.high_power, report.status.echo_in, report.raw_status
    );
    println!(
        "voltage: {} mV (raw {})",
        report.voltage_millivolts(),
        report.voltage
    );
    for (number, sample) in report.ports.iter().enumerate() {
        println!(
            "port{}: input={:<3} id={:<3} category={:<10} tilt={}",
            number + 1,
            sample.input,
            sample.id,
            DeviceCategory::classify(sample.id),
            TiltStatus::classify(sample.input).name(),
        );
    }
    Ok(())
}

fn print_summary(summary: &ReplaySummary) {
    for event in &summary.events {
        match event {
            ReplayEvent::Malformed { index, len } => {
                println!("[{index:>6}] malformed report ({len} bytes)");
            }
            ReplayEvent::Classified {
                index,
                port,
                category,
            } => println!("[{index:>6}] {port}: classified as {category}"),
            ReplayEvent::Bound {
                index,
                port,
                category,
            } => println!("[{index:>6}] {port}: bound {category}"),
            ReplayEvent::Unbound {
                index,
                port,
                category,
            } => println!("[{index:>6}] {port}: unbound {category}"),
            ReplayEvent::Reading {
                index,
                port,
                values,
            } => println!("[{index:>6}] {port}: values {values:?}"),
            ReplayEvent::Write { index, frame } => println!("[{index:>6}] write {frame}"),
        }
    }

    let counters = summary.counters;
    println!(
        "{}: {} report(s), {} malformed, {} classification(s), {} write(s), {} mV",
        summary.hub,
        counters.reports_received,
        counters.reports_malformed,
        counters.classifications,
        counters.writes_submitted,
        summary.voltage_mv,
    );
}
