use std::fs;
use std::time::{Duration, Instant};

use sockmsg_peer::{Client, Connection, POLL_INTERVAL};
use sockmsg_transport::TcpTransport;

use crate::cmd::{ModeArg, SendArgs};
use crate::exit::{peer_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;

    let mut client =
        Client::connect(args.addr).map_err(|err| peer_error("connect failed", err))?;
    args.framing
        .apply(client.connection())
        .map_err(|err| peer_error("configure failed", err))?;

    let payload = resolve_payload(&args)?;
    client
        .connection()
        .send(&payload)
        .map_err(|err| peer_error("send failed", err))?;

    if args.wait {
        let raw = matches!(args.framing.mode, ModeArg::Raw);
        let reply = wait_for_reply(client.connection(), raw, wait_timeout)?;
        print_message(&reply, client.connection().id(), format);
    }

    client
        .disconnect()
        .map_err(|err| peer_error("disconnect failed", err))?;
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}

fn wait_for_reply(
    conn: &Connection<TcpTransport>,
    raw: bool,
    timeout: Duration,
) -> CliResult<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if raw {
            let bytes = conn.receive(usize::MAX);
            if !bytes.is_empty() {
                return Ok(bytes);
            }
        } else if let Some(message) = conn
            .receive_message()
            .map_err(|err| peer_error("receive failed", err))?
        {
            return Ok(message);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    Err(CliError::new(TIMEOUT, "no reply before the timeout"))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
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
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
