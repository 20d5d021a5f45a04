use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use relaylink_frame::{Checksum, Session, SessionConfig};
use relaylink_transport::{SerialConfig, SerialStream, DEFAULT_BAUD_RATE};

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod listen;
pub mod ports;
pub mod relay;
pub mod send;
pub mod stats;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Switch a relay output on.
    Activate(RelayArgs),
    /// Switch a relay output off.
    Deactivate(RelayArgs),
    /// Request peripheral state and print the response.
    Stats(StatsArgs),
    /// Send raw register values as one frame.
    Send(SendArgs),
    /// Print received frames until interrupted.
    Listen(ListenArgs),
    /// Decode a captured frame given as hex.
    Decode(DecodeArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Activate(args) => relay::run(args, true),
        Command::Deactivate(args) => relay::run(args, false),
        Command::Stats(args) => stats::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial link settings shared by every command that talks to a device.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Serial device path.
    #[arg(long, short = 'p', env = "RELAYLINK_PORT")]
    pub port: PathBuf,
    /// Line speed in bits per second.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Receive timeout per frame phase (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub timeout: String,
    /// Checksum algorithm used by the peripheral (crc8, additive).
    #[arg(long, default_value = "crc8")]
    pub checksum: Checksum,
}

impl LinkArgs {
    pub fn session_config(&self) -> CliResult<SessionConfig> {
        Ok(SessionConfig {
            timeout: parse_duration(&self.timeout)?,
            checksum: self.checksum,
        })
    }

    /// Open the serial device and bind a session to it.
    pub fn open(&self) -> CliResult<Session<SerialStream>> {
        let config = self.session_config()?;
        let serial = SerialConfig::new(&self.port).baud_rate(self.baud);
        let stream = SerialStream::open(&serial)
            .map_err(|err| transport_error("open failed", err))?;
        Ok(Session::with_config(stream, config))
    }
}

#[derive(Args, Debug)]
pub struct RelayArgs {
    /// Relay output number.
    pub output: u8,
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Maximum time to wait for the response (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Register values to send (comma-separated), register 0 first.
    #[arg(long, value_delimiter = ',', required = true)]
    pub values: Vec<u8>,
    /// Wait for one response frame and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the response when --wait is set.
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex, e.g. "7E 06 00 0A 01 14 02 1E F5 EF".
    pub hex: String,
    /// Checksum algorithm the capture was made with.
    #[arg(long, default_value = "crc8")]
    pub checksum: Checksum,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("40").unwrap(), Duration::from_millis(40));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0ms").is_err());
        assert!(parse_duration("").is_err());
        assert_eq!(parse_duration("soon").unwrap_err().code, USAGE);
    }

    #[test]
    fn session_config_from_link_args() {
        let link = LinkArgs {
            port: PathBuf::from("/dev/null"),
            baud: DEFAULT_BAUD_RATE,
            timeout: "20ms".to_string(),
            checksum: Checksum::Additive,
        };
        let config = link.session_config().unwrap();
        assert_eq!(config.timeout, Duration::from_millis(20));
        assert_eq!(config.checksum, Checksum::Additive);
    }
}
