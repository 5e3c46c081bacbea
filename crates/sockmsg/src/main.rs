mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sockmsg", version, about = "Message framing over TCP")]
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
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "sockmsg",
            "send",
            "127.0.0.1:7000",
            "--mode",
            "prefixed",
            "--data",
            "hello",
        ])
        .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "sockmsg",
            "send",
            "127.0.0.1:7000",
            "--data",
            "hello",
            "--file",
            "payload.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_listen_subcommand_with_framing_options() {
        let cli = Cli::try_parse_from([
            "sockmsg",
            "listen",
            "127.0.0.1:0",
            "--delimiter",
            "|",
            "--escape",
            "!",
            "--max-size",
            "4096",
            "--count",
            "3",
        ])
        .expect("listen args should parse");

        assert!(matches!(cli.command, Command::Listen(_)));
    }

    #[test]
    fn rejects_a_bad_address() {
        assert!(Cli::try_parse_from(["sockmsg", "listen", "not-an-addr"]).is_err());
    }
}
