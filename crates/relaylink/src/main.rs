mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "relaylink", version, about = "Relay/input peripheral serial client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use relaylink_frame::Checksum;

    use super::*;

    #[test]
    fn parses_activate_subcommand() {
        let cli = Cli::try_parse_from(["relaylink", "activate", "2", "--port", "/dev/ttyUSB0"])
            .expect("activate args should parse");

        match cli.command {
            Command::Activate(args) => {
                assert_eq!(args.output, 2);
                assert_eq!(args.link.port.to_str(), Some("/dev/ttyUSB0"));
                assert_eq!(args.link.baud, 115_200);
                assert_eq!(args.link.checksum, Checksum::Crc8);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_link_overrides() {
        let cli = Cli::try_parse_from([
            "relaylink",
            "stats",
            "-p",
            "/dev/ttyACM0",
            "--baud",
            "9600",
            "--checksum",
            "additive",
            "--timeout",
            "250ms",
            "--wait-timeout",
            "2s",
        ])
        .expect("stats args should parse");

        match cli.command {
            Command::Stats(args) => {
                assert_eq!(args.link.baud, 9600);
                assert_eq!(args.link.checksum, Checksum::Additive);
                assert_eq!(args.link.timeout, "250ms");
                assert_eq!(args.wait_timeout, "2s");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_send_values() {
        let cli = Cli::try_parse_from([
            "relaylink",
            "send",
            "--port",
            "/dev/ttyUSB0",
            "--values",
            "10,20,30",
        ])
        .expect("send args should parse");
        match cli.command {
            Command::Send(args) => assert_eq!(args.values, vec![10, 20, 30]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_checksum() {
        let err = Cli::try_parse_from([
            "relaylink",
            "deactivate",
            "1",
            "--port",
            "/dev/ttyUSB0",
            "--checksum",
            "md5",
        ])
        .expect_err("unknown checksum should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_decode_without_port() {
        let cli = Cli::try_parse_from(["relaylink", "decode", "7E 00 00 EF"])
            .expect("decode args should parse");
        assert!(matches!(cli.command, Command::Decode(_)));
    }
}
