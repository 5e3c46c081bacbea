//! Polled message connections over sockmsg framing.
//!
//! This is the "just works" layer. A [`Connection`] pairs a byte-stream
//! transport with a staging buffer and framer, and a background worker polls
//! it every 20 ms; the application drains [`ConnectionEvent`]s and pulls raw
//! bytes or whole messages at its own pace. [`MessageServer`] and [`Client`]
//! own the workers for the server and client sides.

pub mod connection;
pub mod error;
pub mod event;
pub mod transport;
pub mod worker;

#[cfg(unix)]
pub mod client;
#[cfg(unix)]
pub mod server;

pub use connection::Connection;
pub use error::{PeerError, Result};
pub use event::{ConnectionEvent, ServerEvent};
pub use transport::Transport;
pub use worker::{PollWorker, POLL_INTERVAL};

#[cfg(unix)]
pub use client::Client;
#[cfg(unix)]
pub use server::MessageServer;
