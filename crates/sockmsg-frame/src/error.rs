/// Errors that can occur while staging, framing, or unframing messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A write would not fit in the buffer, or a peek reached past the
    /// available data.
    #[error("buffer overflow ({requested} bytes requested, {available} available)")]
    Overflow { requested: usize, available: usize },

    /// An unescaped delimiter was found in the middle of a message body.
    #[error("malformed frame: unescaped delimiter inside message body")]
    MalformedFrame,

    /// The framing parameters are contradictory or incomplete.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(&'static str),

    /// A message-oriented call was made while the connection is in raw mode.
    #[error("a message mode must be selected first")]
    InvalidMode,

    /// A send payload violates the size contract of the active mode.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A framed message exceeds the configured maximum message size.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
