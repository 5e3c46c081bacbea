use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::TcpTransport;

/// Non-blocking TCP accept queue.
///
/// Bound once, then drained by a polling worker: every call to
/// [`accept_pending`](Self::accept_pending) yields the transports for all
/// connections queued since the last call, without ever blocking.
pub struct TcpAcceptor {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpAcceptor {
    /// Bind and listen on `addr`.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| TransportError::Bind { addr, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(%addr, "listening for tcp connections");
        Ok(Self { listener, addr })
    }

    /// Accept every connection currently pending.
    pub fn accept_pending(&self) -> Result<Vec<TcpTransport>> {
        let mut accepted = Vec::new();
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    accepted.push(TcpTransport::from_stream(stream).map_err(into_accept_error)?);
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Accept(err)),
            }
        }
        Ok(accepted)
    }

    /// The locally bound address (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

fn into_accept_error(err: TransportError) -> TransportError {
    match err {
        TransportError::Io(io) => TransportError::Accept(io),
        other => other,
    }
}
