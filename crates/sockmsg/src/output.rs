use std::io::{IsTerminal, Write};

use clap::ValueEnum;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    /// One annotated line per message.
    Pretty,
    /// Payload bytes verbatim.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Raw
        }
    }
}

pub fn print_message(payload: &[u8], connection_id: u64, format: OutputFormat) {
    match format {
        OutputFormat::Pretty => {
            println!(
                "connection={} size={} payload={}",
                connection_id,
                payload.len(),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => {
            print_raw(payload);
            print_raw(b"\n");
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
