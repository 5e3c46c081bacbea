//! TCP byte-stream transport for sockmsg.
//!
//! Exposes a connected duplex stream through the narrow contract the framing
//! engine needs: how many bytes are pending, a non-destructive peek, a
//! destructive consume, a best-effort send, and a liveness probe that can
//! tell a graceful peer close apart from "no data yet".
//!
//! This is the lowest layer of sockmsg. Everything else builds on top of the
//! [`TcpTransport`] type provided here.

pub mod error;

#[cfg(unix)]
pub mod acceptor;
#[cfg(unix)]
pub mod stream;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use acceptor::TcpAcceptor;
#[cfg(unix)]
pub use stream::TcpTransport;
