use crate::error::{FrameError, Result};

/// Fixed-capacity circular byte buffer.
///
/// Stages bytes between the transport and the framer. One slot more than the
/// capacity is allocated so a full buffer and an empty buffer keep distinct
/// cursor positions.
pub struct RingBuffer {
    buf: Box<[u8]>,
    read: usize,
    write: usize,
}

impl RingBuffer {
    /// Create a buffer that can hold up to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity + 1].into_boxed_slice(),
            read: 0,
            write: 0,
        }
    }

    /// Maximum number of bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.buf.len() - 1
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        (self.buf.len() + self.write - self.read) % self.buf.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    /// Number of bytes that can still be written.
    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Append `bytes` at the write cursor.
    ///
    /// Fails with [`FrameError::Overflow`] and leaves the buffer unchanged
    /// when `bytes` does not fit entirely. Wrap-around splits the copy into
    /// at most two contiguous segments.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.free() {
            return Err(FrameError::Overflow {
                requested: bytes.len(),
                available: self.free(),
            });
        }

        let first = bytes.len().min(self.buf.len() - self.write);
        self.buf[self.write..self.write + first].copy_from_slice(&bytes[..first]);
        self.buf[..bytes.len() - first].copy_from_slice(&bytes[first..]);
        self.write = (self.write + bytes.len()) % self.buf.len();
        Ok(())
    }

    /// Remove and return up to `max` bytes from the front of the buffer.
    ///
    /// Returns fewer bytes when fewer are buffered; never blocks.
    pub fn read(&mut self, max: usize) -> Vec<u8> {
        let n = self.len().min(max);
        let out = self.copy_out(self.read, n);
        self.read = (self.read + n) % self.buf.len();
        out
    }

    /// Remove and return everything currently buffered.
    pub fn read_all(&mut self) -> Vec<u8> {
        self.read(self.len())
    }

    /// Return bytes in `[offset, offset + len)` relative to the front,
    /// without consuming them.
    ///
    /// Fails with [`FrameError::Overflow`] when the range reaches past the
    /// buffered bytes.
    pub fn peek(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        if offset + len > self.len() {
            return Err(FrameError::Overflow {
                requested: offset + len,
                available: self.len(),
            });
        }
        Ok(self.copy_out((self.read + offset) % self.buf.len(), len))
    }

    /// Scan for the first complete occurrence of `delimiter`, looking at no
    /// more than `max_scan` bytes.
    ///
    /// On a match, consumes and returns everything up to and including the
    /// delimiter. Without a match nothing is consumed, so a retry after more
    /// data arrives resumes correctly — including when the delimiter
    /// straddles the wrap-around point.
    pub fn read_until(&mut self, delimiter: &[u8], max_scan: usize) -> Option<Vec<u8>> {
        if delimiter.is_empty() {
            return None;
        }

        let mut matched = 0usize;
        let mut scanned = 0usize;
        let mut walker = self.read;
        while walker != self.write && scanned < max_scan {
            scanned += 1;

            if self.buf[walker] == delimiter[matched] {
                matched += 1;
                if matched == delimiter.len() {
                    return Some(self.read(scanned));
                }
            } else if matched != 0 {
                // Partial match failed: rewind to the byte after the point
                // where the partial match began.
                scanned -= matched;
                walker = (walker + self.buf.len() - matched) % self.buf.len();
                matched = 0;
            }

            walker = (walker + 1) % self.buf.len();
        }
        None
    }

    fn copy_out(&self, start: usize, n: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(n);
        let first = n.min(self.buf.len() - start);
        out.extend_from_slice(&self.buf[start..start + first]);
        out.extend_from_slice(&self.buf[..n - first]);
        out
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let ring = RingBuffer::with_capacity(1024);
        assert_eq!(ring.len(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 1024);
        assert_eq!(ring.free(), 1024);
    }

    #[test]
    fn fills_to_capacity_then_overflows() {
        let mut ring = RingBuffer::with_capacity(1024);
        for expected in [256, 512, 768, 1024] {
            ring.write(&[0xAA; 256]).unwrap();
            assert_eq!(ring.len(), expected);
        }

        let err = ring.write(&[0xAA; 256]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Overflow {
                requested: 256,
                available: 0
            }
        ));
        assert_eq!(ring.len(), 1024, "failed write must not change the buffer");
    }

    #[test]
    fn oversized_single_write_fails() {
        let mut ring = RingBuffer::with_capacity(1024);
        assert!(ring.write(&[0u8; 1025]).is_err());
        assert!(ring.is_empty());
    }

    #[test]
    fn read_returns_written_bytes_in_order() {
        let mut ring = RingBuffer::with_capacity(1024);
        let data: Vec<u8> = (0..=255).collect();
        ring.write(&data).unwrap();
        assert_eq!(ring.read_all(), data);
        assert!(ring.is_empty());
    }

    #[test]
    fn read_is_bounded_and_never_blocks() {
        let mut ring = RingBuffer::with_capacity(1024);
        ring.write(&[7u8; 256]).unwrap();

        assert_eq!(ring.read(200).len(), 200);
        assert_eq!(ring.read(200).len(), 56);
        assert_eq!(ring.read(200).len(), 0);
    }

    #[test]
    fn round_trips_across_the_wrap_point() {
        let mut ring = RingBuffer::with_capacity(400);

        let first: Vec<u8> = (0..=255).collect();
        ring.write(&first).unwrap();
        let read1 = ring.read(200);

        let second: Vec<u8> = (0..=255).rev().collect();
        ring.write(&second).unwrap();
        let read2 = ring.read_all();

        let mut written = first;
        written.extend_from_slice(&second);
        let mut read = read1;
        read.extend_from_slice(&read2);
        assert_eq!(read, written);
    }

    #[test]
    fn peek_matches_read_without_consuming() {
        let mut ring = RingBuffer::with_capacity(64);
        ring.write(b"peekaboo").unwrap();

        let peeked = ring.peek(0, 8).unwrap();
        assert_eq!(ring.len(), 8);
        assert_eq!(ring.read(8), peeked);
    }

    #[test]
    fn peek_with_offset() {
        let mut ring = RingBuffer::with_capacity(64);
        ring.write(b"0123456789").unwrap();
        assert_eq!(ring.peek(4, 3).unwrap(), b"456");
    }

    #[test]
    fn peek_past_available_fails() {
        let mut ring = RingBuffer::with_capacity(64);
        ring.write(b"abc").unwrap();
        assert!(matches!(
            ring.peek(0, 4),
            Err(FrameError::Overflow {
                requested: 4,
                available: 3
            })
        ));
        assert!(ring.peek(3, 1).is_err());
    }

    #[test]
    fn peek_across_the_wrap_point() {
        let mut ring = RingBuffer::with_capacity(8);
        ring.write(b"abcdef").unwrap();
        ring.read(6);
        ring.write(b"wrapme").unwrap();
        assert_eq!(ring.peek(0, 6).unwrap(), b"wrapme");
    }

    #[test]
    fn read_until_returns_through_first_delimiter() {
        let mut ring = RingBuffer::with_capacity(128);
        ring.write(b"This is a simple message|||With a three-pipe delimiter|||")
            .unwrap();

        let unit = ring.read_until(b"|||", 100).unwrap();
        assert_eq!(unit, b"This is a simple message|||");

        let unit = ring.read_until(b"|||", 100).unwrap();
        assert_eq!(unit, b"With a three-pipe delimiter|||");
    }

    #[test]
    fn read_until_consumes_nothing_on_no_match() {
        let mut ring = RingBuffer::with_capacity(64);
        ring.write(b"no terminator here").unwrap();

        assert!(ring.read_until(b"\n", 100).is_none());
        assert_eq!(ring.len(), 18);
    }

    #[test]
    fn read_until_respects_scan_budget() {
        let mut ring = RingBuffer::with_capacity(64);
        ring.write(b"0123456789\n").unwrap();

        assert!(ring.read_until(b"\n", 5).is_none());
        assert_eq!(ring.read_until(b"\n", 11).unwrap(), b"0123456789\n");
    }

    #[test]
    fn read_until_backtracks_over_partial_matches() {
        let mut ring = RingBuffer::with_capacity(64);
        // "ab" prefixes that never complete "abc" until the end.
        ring.write(b"ababcab").unwrap();
        assert_eq!(ring.read_until(b"abc", 100).unwrap(), b"ababc");
        assert_eq!(ring.read_all(), b"ab");
    }

    #[test]
    fn read_until_finds_delimiter_straddling_the_wrap_point() {
        let mut ring = RingBuffer::with_capacity(16);
        ring.write(&[0u8; 12]).unwrap();
        ring.read(12);
        // The delimiter lands across the end of the backing array.
        ring.write(b"payload<E").unwrap();
        assert!(ring.read_until(b"<END>", 100).is_none());
        ring.write(b"ND>").unwrap();
        let unit = ring.read_until(b"<END>", 100).unwrap();
        assert_eq!(unit, b"payload<END>");
    }

    #[test]
    fn read_until_retry_after_more_data_arrives() {
        let mut ring = RingBuffer::with_capacity(64);
        ring.write(b"partial||").unwrap();
        assert!(ring.read_until(b"|||", 100).is_none());

        ring.write(b"|rest|||").unwrap();
        assert_eq!(ring.read_until(b"|||", 100).unwrap(), b"partial|||");
        assert_eq!(ring.read_until(b"|||", 100).unwrap(), b"rest|||");
    }
}
