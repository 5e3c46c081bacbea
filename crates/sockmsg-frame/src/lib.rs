//! Message framing over byte streams.
//!
//! A TCP stream delivers bytes with no message boundaries. This crate turns
//! such a stream back into discrete messages: bytes are staged in a
//! [`RingBuffer`], and a [`Framer`] locates and extracts complete messages
//! according to the active [`FramingMode`]:
//!
//! - delimiter-bound, with an [`EscapeCodec`] protecting delimiter bytes that
//!   appear inside message bodies;
//! - length-prefixed, with a 4-byte little-endian signed prefix;
//! - fixed-length, where every message is exactly the configured size.
//!
//! No I/O happens here; the transport layer feeds bytes in and the peer layer
//! drives extraction.

pub mod error;
pub mod escape;
pub mod framer;
pub mod ring;

pub use error::{FrameError, Result};
pub use escape::EscapeCodec;
pub use framer::{
    Framer, FramingMode, DEFAULT_DELIMITER, DEFAULT_ESCAPE_CODE, DEFAULT_MAX_MESSAGE_SIZE,
    LENGTH_PREFIX_SIZE,
};
pub use ring::RingBuffer;
