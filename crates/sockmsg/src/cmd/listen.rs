use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sockmsg_peer::{ConnectionEvent, MessageServer, ServerEvent, POLL_INTERVAL};

use crate::cmd::{ListenArgs, ModeArg};
use crate::exit::{peer_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, print_raw, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let server =
        MessageServer::bind(args.addr).map_err(|err| peer_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        // New connections start in raw mode; configure them before their
        // first bytes are counted.
        while let Some(event) = server.next_event() {
            if let ServerEvent::ClientConnected(id) = event {
                if let Some(conn) = server.connection(id) {
                    args.framing
                        .apply(&conn)
                        .map_err(|err| peer_error("configure failed", err))?;
                }
            }
        }

        for conn in server.connections() {
            while let Some(event) = conn.next_event() {
                match event {
                    ConnectionEvent::MessageArrived => {
                        let message = conn
                            .receive_message()
                            .map_err(|err| peer_error("receive failed", err))?;
                        if let Some(message) = message {
                            print_message(&message, conn.id(), format);
                            printed = printed.saturating_add(1);
                            if args.count.is_some_and(|count| printed >= count) {
                                return Ok(SUCCESS);
                            }
                        }
                    }
                    ConnectionEvent::RawDataArrived => {
                        if matches!(args.framing.mode, ModeArg::Raw) {
                            print_raw(&conn.receive(usize::MAX));
                        }
                    }
                    ConnectionEvent::Disconnected => {}
                }
            }
        }

        std::thread::sleep(POLL_INTERVAL);
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
