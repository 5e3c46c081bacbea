use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use sockmsg_frame::FramingMode;
use sockmsg_peer::{Connection, Transport};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a server and print received messages.
    Listen(ListenArgs),
    /// Send one framed message.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ModeArg {
    Raw,
    Delimited,
    Prefixed,
    Fixed,
}

impl ModeArg {
    pub fn as_mode(self) -> FramingMode {
        match self {
            ModeArg::Raw => FramingMode::Raw,
            ModeArg::Delimited => FramingMode::DelimiterBound,
            ModeArg::Prefixed => FramingMode::PrefixedLength,
            ModeArg::Fixed => FramingMode::FixedLength,
        }
    }
}

/// Framing options shared by `listen` and `send`.
#[derive(Args, Debug)]
pub struct FramingArgs {
    /// Framing mode.
    #[arg(long, value_name = "MODE", default_value = "delimited")]
    pub mode: ModeArg,

    /// Delimiter string (delimited mode). Default: newline.
    #[arg(long, value_name = "STRING")]
    pub delimiter: Option<String>,

    /// Escape character (delimited mode). Default: backslash.
    #[arg(long, value_name = "CHAR")]
    pub escape: Option<char>,

    /// Maximum message size in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_size: Option<usize>,
}

impl FramingArgs {
    /// Configure `conn` with these options, switching mode last so buffered
    /// bytes are evaluated under the final parameters.
    pub fn apply<T: Transport>(&self, conn: &Connection<T>) -> sockmsg_peer::Result<()> {
        if let Some(max) = self.max_size {
            conn.set_max_message_size(max)?;
        }
        if let Some(delimiter) = &self.delimiter {
            conn.set_delimiter_str(delimiter)?;
        }
        if let Some(escape) = self.escape {
            if !escape.is_ascii() {
                return Err(sockmsg_frame::FrameError::InvalidArgument(
                    "escape must be a single-byte character".to_string(),
                )
                .into());
            }
            conn.set_escape_code(escape as u8)?;
        }
        conn.set_mode(self.mode.as_mode())?;
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind, e.g. 127.0.0.1:7000.
    pub addr: SocketAddr,

    #[command(flatten)]
    pub framing: FramingArgs,

    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address to connect to, e.g. 127.0.0.1:7000.
    pub addr: SocketAddr,

    #[command(flatten)]
    pub framing: FramingArgs,

    /// String payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,

    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,

    /// Wait for one reply message and print it.
    #[arg(long)]
    pub wait: bool,

    /// Maximum time to wait for a reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
