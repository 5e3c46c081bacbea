use sockmsg_frame::FrameError;
use sockmsg_transport::TransportError;

/// Errors that can occur on a connection, a server, or a client.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Buffering or framing error.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// A message was received that is not valid UTF-8.
    #[error("message is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The polling worker thread could not be started.
    #[error("failed to spawn polling worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// Stop or disconnect was called while already stopped.
    #[error("not running")]
    NotRunning,
}

pub type Result<T> = std::result::Result<T, PeerError>;
