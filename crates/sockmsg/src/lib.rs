//! Message framing over TCP byte streams.
//!
//! sockmsg turns a plain TCP stream into a stream of discrete messages,
//! with delimiter-bound, length-prefixed, and fixed-length framing modes,
//! escape-protected delimiters, and background polling on both the server
//! and client side.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP streams and the non-blocking accept queue
//! - [`frame`] — Staging buffer, escape codec, and the framing state machine
//! - [`peer`] — Polled connections, [`peer::MessageServer`] and [`peer::Client`]

/// Re-export transport types.
pub mod transport {
    pub use sockmsg_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sockmsg_frame::*;
}

/// Re-export peer types.
pub mod peer {
    pub use sockmsg_peer::*;
}
