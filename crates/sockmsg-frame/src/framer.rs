use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::escape::EscapeCodec;
use crate::ring::RingBuffer;

/// Width of the little-endian signed length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum message size, matching a common socket receive window.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65535;

/// Default delimiter: a single newline.
pub const DEFAULT_DELIMITER: &[u8] = &[0x0A];

/// Default escape code: backslash.
pub const DEFAULT_ESCAPE_CODE: u8 = 0x5C;

/// The discipline used to locate message boundaries in the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingMode {
    /// No message concept; the stream is an undifferentiated byte sequence.
    #[default]
    Raw,
    /// Messages end with a delimiter sequence, escape-protected in bodies.
    DelimiterBound,
    /// Messages carry a 4-byte little-endian signed length prefix.
    PrefixedLength,
    /// Every message is exactly the maximum message size.
    FixedLength,
}

/// Per-connection framing state machine.
///
/// Holds the active [`FramingMode`], the framing parameters, and the scan
/// cursor: the offset into the currently-visible bytes up to which message
/// boundaries have already been counted. The cursor keeps repeated polls
/// incremental and guarantees each boundary is discovered exactly once.
#[derive(Debug, Clone)]
pub struct Framer {
    mode: FramingMode,
    delimiter: Vec<u8>,
    escape_code: u8,
    max_message_size: usize,
    cursor: usize,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    /// A framer in raw mode with default parameters.
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// A framer in raw mode with an explicit message size cap.
    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            mode: FramingMode::Raw,
            delimiter: DEFAULT_DELIMITER.to_vec(),
            escape_code: DEFAULT_ESCAPE_CODE,
            max_message_size,
            cursor: 0,
        }
    }

    /// The active framing mode.
    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// The delimiter used in [`FramingMode::DelimiterBound`].
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// The escape byte used in [`FramingMode::DelimiterBound`].
    pub fn escape_code(&self) -> u8 {
        self.escape_code
    }

    /// The maximum message size in bytes (all modes except raw).
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Current scan cursor, relative to the front of the visible bytes.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Switch framing mode. Resets the scan cursor so the existing buffer is
    /// re-evaluated under the new mode.
    pub fn set_mode(&mut self, mode: FramingMode) {
        self.mode = mode;
        self.cursor = 0;
    }

    /// Replace the delimiter. Resets the scan cursor.
    pub fn set_delimiter(&mut self, delimiter: &[u8]) -> Result<()> {
        if delimiter.is_empty() {
            return Err(FrameError::UnsupportedConfiguration(
                "delimiter must be at least one byte",
            ));
        }
        self.delimiter = delimiter.to_vec();
        self.cursor = 0;
        Ok(())
    }

    /// Replace the escape code. Resets the scan cursor.
    pub fn set_escape_code(&mut self, escape_code: u8) {
        self.escape_code = escape_code;
        self.cursor = 0;
    }

    /// Replace the message size cap. Resets the scan cursor.
    pub fn set_max_message_size(&mut self, max_message_size: usize) -> Result<()> {
        if max_message_size == 0 {
            return Err(FrameError::UnsupportedConfiguration(
                "max message size must be at least one byte",
            ));
        }
        self.max_message_size = max_message_size;
        self.cursor = 0;
        Ok(())
    }

    /// Tell the framer that `n` bytes were consumed from the front of the
    /// buffer, so the cursor stays anchored to the bytes that remain.
    pub fn notify_consumed(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_sub(n);
    }

    /// Count message boundaries that became complete since the last call.
    ///
    /// `visible` is the full peeked contents of the staging buffer; scanning
    /// starts at the cursor, and the cursor advances past every counted
    /// boundary, so each boundary is counted exactly once across polls.
    pub fn count_new_messages(&mut self, visible: &[u8]) -> Result<usize> {
        debug_assert!(self.cursor <= visible.len(), "cursor past visible bytes");

        let count = match self.mode {
            FramingMode::Raw => 0,

            FramingMode::DelimiterBound => {
                let codec = EscapeCodec::new(&self.delimiter, self.escape_code)?;
                let mut count = 0;
                while let Some(end) = codec.find_terminator(&visible[self.cursor..]) {
                    self.cursor += end;
                    count += 1;
                }
                count
            }

            FramingMode::PrefixedLength => {
                let mut count = 0;
                while self.cursor + LENGTH_PREFIX_SIZE <= visible.len() {
                    let declared = read_length_prefix(&visible[self.cursor..]);
                    let Some(declared) = declared else {
                        // A negative length means these bytes are likely not
                        // meant to be read in this mode; stop counting until
                        // the configuration or the stream catches up.
                        break;
                    };
                    let next = self.cursor + LENGTH_PREFIX_SIZE + declared;
                    if next > visible.len() {
                        break;
                    }
                    self.cursor = next;
                    count += 1;
                }
                count
            }

            FramingMode::FixedLength => {
                let count = (visible.len() - self.cursor) / self.max_message_size;
                self.cursor += count * self.max_message_size;
                count
            }
        };

        if count > 0 {
            trace!(count, cursor = self.cursor, mode = ?self.mode, "counted new messages");
        }
        Ok(count)
    }

    /// Consume and return one complete message payload from `ring`.
    ///
    /// Returns `Ok(None)` — consuming nothing — when no complete message is
    /// buffered yet. Fails with [`FrameError::InvalidMode`] in raw mode and
    /// [`FrameError::MessageTooLarge`] as soon as the size bound is provably
    /// violated, even before the full message has arrived.
    pub fn extract_one(&mut self, ring: &mut RingBuffer) -> Result<Option<Vec<u8>>> {
        match self.mode {
            FramingMode::Raw => Err(FrameError::InvalidMode),
            FramingMode::DelimiterBound => self.extract_delimited(ring),
            FramingMode::PrefixedLength => self.extract_prefixed(ring),
            FramingMode::FixedLength => self.extract_fixed(ring),
        }
    }

    /// Produce the on-wire bytes for `payload` under the active mode.
    pub fn encode_message(&self, payload: &[u8]) -> Result<Bytes> {
        if self.mode != FramingMode::Raw && payload.len() > self.max_message_size {
            return Err(FrameError::InvalidArgument(format!(
                "message is {} bytes but max message size is {}",
                payload.len(),
                self.max_message_size
            )));
        }

        let wire = match self.mode {
            FramingMode::Raw => Bytes::copy_from_slice(payload),

            FramingMode::DelimiterBound => {
                let codec = EscapeCodec::new(&self.delimiter, self.escape_code)?;
                let escaped = codec.encode(payload);
                let mut wire = BytesMut::with_capacity(escaped.len() + self.delimiter.len());
                wire.put_slice(&escaped);
                wire.put_slice(&self.delimiter);
                wire.freeze()
            }

            FramingMode::PrefixedLength => {
                if payload.len() > i32::MAX as usize {
                    return Err(FrameError::InvalidArgument(format!(
                        "message is {} bytes but the length prefix is a signed 32-bit value",
                        payload.len()
                    )));
                }
                let mut wire = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
                wire.put_i32_le(payload.len() as i32);
                wire.put_slice(payload);
                wire.freeze()
            }

            FramingMode::FixedLength => {
                if payload.len() != self.max_message_size {
                    return Err(FrameError::InvalidArgument(format!(
                        "message is {} bytes but expected {} bytes",
                        payload.len(),
                        self.max_message_size
                    )));
                }
                Bytes::copy_from_slice(payload)
            }
        };
        Ok(wire)
    }

    fn extract_delimited(&mut self, ring: &mut RingBuffer) -> Result<Option<Vec<u8>>> {
        let codec = EscapeCodec::new(&self.delimiter, self.escape_code)?;

        // Pre-scan the visible bytes for the real terminator so nothing is
        // consumed when the message is incomplete.
        let visible = ring.peek(0, ring.len())?;
        let Some(end) = codec.find_terminator(&visible) else {
            if visible.len() >= self.max_message_size {
                return Err(FrameError::MessageTooLarge {
                    size: visible.len(),
                    max: self.max_message_size,
                });
            }
            return Ok(None);
        };

        let body_len = end - self.delimiter.len();
        if body_len > self.max_message_size {
            return Err(FrameError::MessageTooLarge {
                size: body_len,
                max: self.max_message_size,
            });
        }

        // Drain the message unit by unit: every escaped delimiter splits the
        // scan early, and the decoded parts are stitched back together.
        let mut payload = Vec::new();
        let mut consumed = 0;
        while consumed < end {
            let Some(unit) = ring.read_until(&self.delimiter, end - consumed) else {
                break;
            };
            consumed += unit.len();
            let false_split = codec.trailing_delimiter_escaped(&unit);
            payload.extend_from_slice(&codec.decode(&unit)?);
            if !false_split {
                break;
            }
        }

        self.notify_consumed(consumed);
        Ok(Some(payload))
    }

    fn extract_prefixed(&mut self, ring: &mut RingBuffer) -> Result<Option<Vec<u8>>> {
        if ring.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }
        let prefix = ring.peek(0, LENGTH_PREFIX_SIZE)?;
        let Some(declared) = read_length_prefix(&prefix) else {
            // Negative length: same out-of-sync tolerance as counting.
            return Ok(None);
        };

        if declared > self.max_message_size {
            return Err(FrameError::MessageTooLarge {
                size: declared,
                max: self.max_message_size,
            });
        }
        if ring.len() < LENGTH_PREFIX_SIZE + declared {
            return Ok(None);
        }

        ring.read(LENGTH_PREFIX_SIZE);
        let payload = ring.read(declared);
        self.notify_consumed(LENGTH_PREFIX_SIZE + declared);
        Ok(Some(payload))
    }

    fn extract_fixed(&mut self, ring: &mut RingBuffer) -> Result<Option<Vec<u8>>> {
        if ring.len() < self.max_message_size {
            return Ok(None);
        }
        let payload = ring.read(self.max_message_size);
        self.notify_consumed(self.max_message_size);
        Ok(Some(payload))
    }
}

/// Decode a 4-byte little-endian signed length prefix.
///
/// Returns `None` for negative lengths, which the framer treats as "not yet
/// a valid frame" rather than an error.
fn read_length_prefix(bytes: &[u8]) -> Option<usize> {
    let declared = i32::from_le_bytes(
        bytes[..LENGTH_PREFIX_SIZE]
            .try_into()
            .expect("prefix slice is 4 bytes"),
    );
    usize::try_from(declared).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(bytes: &[u8]) -> RingBuffer {
        let mut ring = RingBuffer::with_capacity(bytes.len().max(64));
        ring.write(bytes).unwrap();
        ring
    }

    fn prefixed(payload: &[u8]) -> Vec<u8> {
        let mut wire = (payload.len() as i32).to_le_bytes().to_vec();
        wire.extend_from_slice(payload);
        wire
    }

    #[test]
    fn raw_mode_counts_nothing() {
        let mut framer = Framer::new();
        assert_eq!(framer.count_new_messages(b"plenty of bytes").unwrap(), 0);
        assert_eq!(framer.cursor(), 0);
    }

    #[test]
    fn raw_mode_rejects_message_extraction() {
        let mut framer = Framer::new();
        let mut ring = ring_with(b"data");
        assert!(matches!(
            framer.extract_one(&mut ring),
            Err(FrameError::InvalidMode)
        ));
        assert_eq!(ring.len(), 4, "failed extraction must not consume");
    }

    #[test]
    fn counts_delimited_messages_incrementally() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::DelimiterBound);

        assert_eq!(framer.count_new_messages(b"one\ntwo\npart").unwrap(), 2);
        assert_eq!(framer.cursor(), 8);

        // Same bytes again: nothing new.
        assert_eq!(framer.count_new_messages(b"one\ntwo\npart").unwrap(), 0);

        // The partial tail completes.
        assert_eq!(framer.count_new_messages(b"one\ntwo\npart\n").unwrap(), 1);
        assert_eq!(framer.cursor(), 13);
    }

    #[test]
    fn delimited_counting_is_escape_aware() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::DelimiterBound);
        framer.set_delimiter(b"|").unwrap();
        framer.set_escape_code(b'!');

        // "a!|b|" is one message: the first delimiter is escaped.
        assert_eq!(framer.count_new_messages(b"a!|b|").unwrap(), 1);

        framer.set_delimiter(b"|").unwrap();
        // Doubled escape is a literal escape, so the delimiter counts.
        assert_eq!(framer.count_new_messages(b"a!!|").unwrap(), 1);
    }

    #[test]
    fn counts_prefixed_messages_and_stops_at_partial() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::PrefixedLength);

        let mut wire = prefixed(b"first");
        wire.extend_from_slice(&prefixed(b"second"));
        wire.extend_from_slice(&(100i32).to_le_bytes());
        wire.extend_from_slice(b"partial payload");

        assert_eq!(framer.count_new_messages(&wire).unwrap(), 2);
        let counted = framer.cursor();
        assert_eq!(counted, 4 + 5 + 4 + 6);

        // Nothing new until the partial third message completes.
        assert_eq!(framer.count_new_messages(&wire).unwrap(), 0);
    }

    #[test]
    fn negative_length_prefix_halts_counting() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::PrefixedLength);

        let mut wire = prefixed(b"ok");
        wire.extend_from_slice(&(-5i32).to_le_bytes());
        wire.extend_from_slice(b"garbage");

        assert_eq!(framer.count_new_messages(&wire).unwrap(), 1);
        assert_eq!(framer.cursor(), 6);
        assert_eq!(framer.count_new_messages(&wire).unwrap(), 0);
    }

    #[test]
    fn zero_length_prefix_counts_as_a_message() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::PrefixedLength);
        assert_eq!(framer.count_new_messages(&prefixed(b"")).unwrap(), 1);
    }

    #[test]
    fn counts_fixed_length_chunks() {
        let mut framer = Framer::new();
        framer.set_max_message_size(10).unwrap();
        framer.set_mode(FramingMode::FixedLength);

        assert_eq!(framer.count_new_messages(&[0u8; 25]).unwrap(), 2);
        assert_eq!(framer.cursor(), 20);
        assert_eq!(framer.count_new_messages(&[0u8; 30]).unwrap(), 1);
        assert_eq!(framer.cursor(), 30);
    }

    #[test]
    fn mode_switch_recounts_existing_bytes() {
        let mut framer = Framer::new();
        let wire = b"first\nsecond\nthird\n";

        // Raw mode sees no messages in the buffered bytes.
        assert_eq!(framer.count_new_messages(wire).unwrap(), 0);

        // Switching resets the cursor; all three boundaries are discovered.
        framer.set_mode(FramingMode::DelimiterBound);
        assert_eq!(framer.count_new_messages(wire).unwrap(), 3);
    }

    #[test]
    fn extracts_delimited_messages_in_order() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::DelimiterBound);
        let mut ring = ring_with(b"one\ntwo\n");

        assert_eq!(framer.extract_one(&mut ring).unwrap().unwrap(), b"one");
        assert_eq!(framer.extract_one(&mut ring).unwrap().unwrap(), b"two");
        assert_eq!(framer.extract_one(&mut ring).unwrap(), None);
    }

    #[test]
    fn extracts_message_with_escaped_delimiter() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::DelimiterBound);
        framer.set_delimiter(b"|").unwrap();
        framer.set_escape_code(b'!');

        // On-wire form of "Message 1! part 1|part 2".
        let mut ring = ring_with(b"Message 1!! part 1!|part 2|");
        let payload = framer.extract_one(&mut ring).unwrap().unwrap();
        assert_eq!(payload, b"Message 1! part 1|part 2");
        assert!(ring.is_empty());
    }

    #[test]
    fn incomplete_delimited_message_consumes_nothing() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::DelimiterBound);
        framer.set_delimiter(b"|").unwrap();
        framer.set_escape_code(b'!');

        // An escaped delimiter arrived but the terminator has not.
        let mut ring = ring_with(b"abc!|def");
        assert_eq!(framer.extract_one(&mut ring).unwrap(), None);
        assert_eq!(ring.len(), 8, "false split must not consume");

        ring.write(b"|").unwrap();
        let payload = framer.extract_one(&mut ring).unwrap().unwrap();
        assert_eq!(payload, b"abc|def");
    }

    #[test]
    fn oversized_delimited_message_fails_early() {
        let mut framer = Framer::new();
        framer.set_max_message_size(10).unwrap();
        framer.set_mode(FramingMode::DelimiterBound);
        framer.set_delimiter(b"|").unwrap();

        // 24 body bytes with a terminator: provably too large.
        let mut ring = ring_with(b"abcdefghijklmnopqrstuvwx|");
        assert!(matches!(
            framer.extract_one(&mut ring),
            Err(FrameError::MessageTooLarge { size: 24, max: 10 })
        ));

        // No terminator yet, but already more bytes than the cap allows.
        let mut framer = Framer::new();
        framer.set_max_message_size(10).unwrap();
        framer.set_mode(FramingMode::DelimiterBound);
        framer.set_delimiter(b"|").unwrap();
        let mut ring = ring_with(b"abcdefghijkl");
        assert!(matches!(
            framer.extract_one(&mut ring),
            Err(FrameError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn extracts_prefixed_messages() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::PrefixedLength);

        let mut wire = prefixed(b"hello");
        wire.extend_from_slice(&prefixed(b"world!"));
        let mut ring = ring_with(&wire);

        assert_eq!(framer.extract_one(&mut ring).unwrap().unwrap(), b"hello");
        assert_eq!(framer.extract_one(&mut ring).unwrap().unwrap(), b"world!");
        assert_eq!(framer.extract_one(&mut ring).unwrap(), None);
    }

    #[test]
    fn zero_length_prefixed_message_is_a_message() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::PrefixedLength);
        let mut ring = ring_with(&prefixed(b""));

        let payload = framer.extract_one(&mut ring).unwrap();
        assert_eq!(payload, Some(Vec::new()));
        assert!(ring.is_empty());
    }

    #[test]
    fn partial_prefixed_message_consumes_nothing() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::PrefixedLength);

        let wire = prefixed(b"not all here");
        let mut ring = ring_with(&wire[..8]);
        assert_eq!(framer.extract_one(&mut ring).unwrap(), None);
        assert_eq!(ring.len(), 8);

        ring.write(&wire[8..]).unwrap();
        assert_eq!(
            framer.extract_one(&mut ring).unwrap().unwrap(),
            b"not all here"
        );
    }

    #[test]
    fn oversized_prefix_fails_before_payload_arrives() {
        let mut framer = Framer::new();
        framer.set_max_message_size(10).unwrap();
        framer.set_mode(FramingMode::PrefixedLength);

        // Only the prefix has arrived; the bound is already violated.
        let mut ring = ring_with(&(24i32).to_le_bytes());
        assert!(matches!(
            framer.extract_one(&mut ring),
            Err(FrameError::MessageTooLarge { size: 24, max: 10 })
        ));
    }

    #[test]
    fn extracts_fixed_length_messages() {
        let mut framer = Framer::new();
        framer.set_max_message_size(10).unwrap();
        framer.set_mode(FramingMode::FixedLength);

        let wire: Vec<u8> = (0u8..30).collect();
        let mut ring = ring_with(&wire);

        assert_eq!(framer.extract_one(&mut ring).unwrap().unwrap(), &wire[..10]);
        assert_eq!(
            framer.extract_one(&mut ring).unwrap().unwrap(),
            &wire[10..20]
        );
        assert_eq!(
            framer.extract_one(&mut ring).unwrap().unwrap(),
            &wire[20..30]
        );
        assert_eq!(framer.extract_one(&mut ring).unwrap(), None);
    }

    #[test]
    fn cursor_rewinds_when_bytes_are_consumed() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::DelimiterBound);
        assert_eq!(framer.count_new_messages(b"one\ntwo\n").unwrap(), 2);
        assert_eq!(framer.cursor(), 8);

        framer.notify_consumed(4);
        assert_eq!(framer.cursor(), 4);
        framer.notify_consumed(100);
        assert_eq!(framer.cursor(), 0);
    }

    #[test]
    fn setters_validate_their_arguments() {
        let mut framer = Framer::new();
        assert!(matches!(
            framer.set_delimiter(b""),
            Err(FrameError::UnsupportedConfiguration(_))
        ));
        assert!(matches!(
            framer.set_max_message_size(0),
            Err(FrameError::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn counting_rejects_escape_code_colliding_with_delimiter() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::DelimiterBound);
        framer.set_delimiter(b"ab").unwrap();
        framer.set_escape_code(b'a');
        assert!(matches!(
            framer.count_new_messages(b"data"),
            Err(FrameError::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn encode_raw_is_verbatim() {
        let framer = Framer::new();
        assert_eq!(framer.encode_message(b"bytes").unwrap(), &b"bytes"[..]);
    }

    #[test]
    fn encode_delimited_escapes_and_terminates() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::DelimiterBound);
        framer.set_delimiter(b"|").unwrap();
        framer.set_escape_code(b'!');

        let wire = framer.encode_message(b"a|b!c").unwrap();
        assert_eq!(wire, &b"a!|b!!c|"[..]);
    }

    #[test]
    fn encode_prefixed_prepends_length() {
        let mut framer = Framer::new();
        framer.set_mode(FramingMode::PrefixedLength);
        let wire = framer.encode_message(b"hello").unwrap();
        assert_eq!(&wire[..4], &5i32.to_le_bytes());
        assert_eq!(&wire[4..], b"hello");
    }

    #[test]
    fn encode_fixed_requires_exact_size() {
        let mut framer = Framer::new();
        framer.set_max_message_size(4).unwrap();
        framer.set_mode(FramingMode::FixedLength);

        assert!(framer.encode_message(b"four").is_ok());
        assert!(matches!(
            framer.encode_message(b"five!"),
            Err(FrameError::InvalidArgument(_))
        ));
        assert!(matches!(
            framer.encode_message(b"no"),
            Err(FrameError::InvalidArgument(_))
        ));
    }

    #[test]
    fn encode_rejects_oversized_payload_in_framed_modes() {
        let mut framer = Framer::new();
        framer.set_max_message_size(4).unwrap();

        for mode in [
            FramingMode::DelimiterBound,
            FramingMode::PrefixedLength,
            FramingMode::FixedLength,
        ] {
            framer.set_mode(mode);
            assert!(
                matches!(
                    framer.encode_message(b"too large"),
                    Err(FrameError::InvalidArgument(_))
                ),
                "mode {mode:?} must reject oversized payloads"
            );
        }

        // Raw mode has no message concept and no cap.
        framer.set_mode(FramingMode::Raw);
        assert!(framer.encode_message(b"too large").is_ok());
    }

    #[test]
    fn wire_round_trip_per_mode() {
        for mode in [FramingMode::DelimiterBound, FramingMode::PrefixedLength] {
            let mut framer = Framer::new();
            framer.set_mode(mode);
            let payload = b"round trip \\ with \n inside".as_slice();

            let wire = framer.encode_message(payload).unwrap();
            let mut ring = RingBuffer::with_capacity(wire.len().max(64));
            ring.write(&wire).unwrap();

            let received = framer.extract_one(&mut ring).unwrap().unwrap();
            assert_eq!(received, payload, "mode {mode:?} should round trip");
        }
    }
}
