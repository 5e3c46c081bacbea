use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sockmsg_frame::{Framer, FramingMode, RingBuffer, DEFAULT_MAX_MESSAGE_SIZE};
use tracing::{debug, trace};

use crate::error::Result;
use crate::event::ConnectionEvent;
use crate::transport::Transport;

/// A polled, message-framed connection over a byte-stream transport.
///
/// The connection owns a staging [`RingBuffer`] and a [`Framer`]. Each
/// [`poll`](Self::poll) checks liveness, pumps pending transport bytes into
/// the buffer, and queues one [`ConnectionEvent`] per observation. The
/// application drains the event queue and pulls data out with
/// [`receive`](Self::receive) or [`receive_message`](Self::receive_message).
///
/// All methods take `&self`; a single mutex serializes buffer and framer
/// access so the polling worker and the application never interleave
/// mid-operation.
pub struct Connection<T: Transport> {
    id: u64,
    state: Mutex<State<T>>,
    events: Mutex<VecDeque<ConnectionEvent>>,
}

struct State<T> {
    transport: T,
    ring: RingBuffer,
    framer: Framer,
    /// Buffered byte count after the last poll or receive, so a poll only
    /// reports raw data that actually changed the buffer.
    observed: usize,
    disconnected: bool,
}

impl<T: Transport> State<T> {
    /// Count boundaries completed since the last scan, as events.
    fn count_new(&mut self) -> Result<Vec<ConnectionEvent>> {
        let visible = self.ring.peek(0, self.ring.len())?;
        let count = self.framer.count_new_messages(&visible)?;
        Ok(vec![ConnectionEvent::MessageArrived; count])
    }
}

impl<T: Transport> Connection<T> {
    /// Wrap `transport` in a connection in raw mode.
    ///
    /// The staging capacity and default maximum message size follow the
    /// transport's receive-buffer size when it reports one.
    pub fn new(id: u64, transport: T) -> Self {
        let window = transport
            .recv_buffer_size()
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_MESSAGE_SIZE);
        Self {
            id,
            state: Mutex::new(State {
                transport,
                ring: RingBuffer::with_capacity(window),
                framer: Framer::with_max_message_size(window),
                observed: 0,
                disconnected: false,
            }),
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// Identifier assigned by the owning server (or 0 for a client).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Observe the transport once: liveness, then byte pumping, then message
    /// counting. Queues events for everything that changed; does nothing when
    /// nothing changed, and nothing at all once disconnected.
    pub fn poll(&self) -> Result<()> {
        let mut fired = Vec::new();
        let mut failed = None;
        {
            let mut guard = self.state();
            let state = &mut *guard;
            if state.disconnected {
                return Ok(());
            }

            if !state.transport.is_alive() {
                debug!(id = self.id, "peer disconnected");
                state.disconnected = true;
                state.transport.close();
                fired.push(ConnectionEvent::Disconnected);
            } else {
                // Pump only what fits; the rest stays queued in the kernel
                // until the application frees staging space.
                let take = state.transport.available()?.min(state.ring.free());
                if take > 0 {
                    let bytes = state.transport.consume(take)?;
                    state.ring.write(&bytes)?;
                }

                if state.ring.len() != state.observed {
                    trace!(id = self.id, buffered = state.ring.len(), "raw data arrived");
                    state.observed = state.ring.len();
                    fired.push(ConnectionEvent::RawDataArrived);
                }
                // Keep the raw-data event even when counting fails; the bytes
                // did arrive regardless of the framing configuration.
                match state.count_new() {
                    Ok(events) => fired.extend(events),
                    Err(err) => failed = Some(err),
                }
            }
        }
        self.push_events(fired);
        match failed {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Frame and send `payload` under the active mode.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        let mut guard = self.state();
        let state = &mut *guard;
        let wire = state.framer.encode_message(payload)?;
        state.transport.send(&wire)?;
        Ok(())
    }

    /// Frame and send a UTF-8 string.
    pub fn send_str(&self, payload: &str) -> Result<()> {
        self.send(payload.as_bytes())
    }

    /// Take up to `max` raw bytes out of the staging buffer.
    ///
    /// Works in every mode. In a framed mode the framer's scan cursor is
    /// rewound so boundary counting stays consistent with what remains.
    pub fn receive(&self, max: usize) -> Vec<u8> {
        let mut guard = self.state();
        let state = &mut *guard;
        let out = state.ring.read(max);
        state.framer.notify_consumed(out.len());
        state.observed = state.ring.len();
        out
    }

    /// Take one complete message out of the staging buffer, or `None` when
    /// no complete message is buffered. Fails in raw mode.
    pub fn receive_message(&self) -> Result<Option<Vec<u8>>> {
        let mut guard = self.state();
        let state = &mut *guard;
        let message = state.framer.extract_one(&mut state.ring)?;
        if message.is_some() {
            state.observed = state.ring.len();
        }
        Ok(message)
    }

    /// [`receive_message`](Self::receive_message), decoded as UTF-8.
    pub fn receive_message_string(&self) -> Result<Option<String>> {
        match self.receive_message()? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    /// Switch framing mode. Bytes already buffered are re-evaluated under the
    /// new mode, and any newly visible messages are queued before returning.
    pub fn set_mode(&self, mode: FramingMode) -> Result<()> {
        let fired = {
            let mut state = self.state();
            state.framer.set_mode(mode);
            state.count_new()?
        };
        self.push_events(fired);
        Ok(())
    }

    /// Replace the delimiter; re-evaluates the buffer like a mode switch.
    pub fn set_delimiter(&self, delimiter: &[u8]) -> Result<()> {
        let fired = {
            let mut state = self.state();
            state.framer.set_delimiter(delimiter)?;
            state.count_new()?
        };
        self.push_events(fired);
        Ok(())
    }

    /// Replace the delimiter with a UTF-8 string.
    pub fn set_delimiter_str(&self, delimiter: &str) -> Result<()> {
        self.set_delimiter(delimiter.as_bytes())
    }

    /// Replace the escape code; re-evaluates the buffer like a mode switch.
    pub fn set_escape_code(&self, escape_code: u8) -> Result<()> {
        let fired = {
            let mut state = self.state();
            state.framer.set_escape_code(escape_code);
            state.count_new()?
        };
        self.push_events(fired);
        Ok(())
    }

    /// Replace the maximum message size; re-evaluates the buffer like a mode
    /// switch.
    pub fn set_max_message_size(&self, max: usize) -> Result<()> {
        let fired = {
            let mut state = self.state();
            state.framer.set_max_message_size(max)?;
            state.count_new()?
        };
        self.push_events(fired);
        Ok(())
    }

    /// The active framing mode.
    pub fn mode(&self) -> FramingMode {
        self.state().framer.mode()
    }

    /// The configured delimiter bytes.
    pub fn delimiter(&self) -> Vec<u8> {
        self.state().framer.delimiter().to_vec()
    }

    /// The configured escape code.
    pub fn escape_code(&self) -> u8 {
        self.state().framer.escape_code()
    }

    /// The configured maximum message size.
    pub fn max_message_size(&self) -> usize {
        self.state().framer.max_message_size()
    }

    /// Number of bytes currently staged.
    pub fn available(&self) -> usize {
        self.state().ring.len()
    }

    /// Whether the connection can still exchange data.
    pub fn is_alive(&self) -> bool {
        let state = self.state();
        !state.disconnected && state.transport.is_alive()
    }

    /// Whether a disconnect has been observed (or the connection was closed
    /// locally).
    pub fn is_closed(&self) -> bool {
        self.state().disconnected
    }

    /// Close the transport. Does not queue a `Disconnected` event; that is
    /// reserved for the peer closing its end.
    pub fn close(&self) {
        let mut state = self.state();
        if !state.disconnected {
            debug!(id = self.id, "closing connection");
            state.disconnected = true;
            state.transport.close();
        }
    }

    /// Pop the oldest queued event.
    pub fn next_event(&self) -> Option<ConnectionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Pop every queued event, oldest first.
    pub fn drain_events(&self) -> Vec<ConnectionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_events(&self, fired: Vec<ConnectionEvent>) {
        if fired.is_empty() {
            return;
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(fired);
    }
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish()
    }
}
