use crate::error::{FrameError, Result};

/// Makes delimiter sequences inside message bodies unambiguous.
///
/// On the wire, every literal escape byte is doubled and every literal
/// delimiter occurrence is prefixed with one escape byte. A delimiter is only
/// a terminator when it is preceded by an even run of escape bytes.
#[derive(Debug, Clone)]
pub struct EscapeCodec {
    delimiter: Vec<u8>,
    escape: u8,
}

impl EscapeCodec {
    /// Build a codec, validating the delimiter/escape pair.
    pub fn new(delimiter: &[u8], escape: u8) -> Result<Self> {
        Self::validate(delimiter, escape)?;
        Ok(Self {
            delimiter: delimiter.to_vec(),
            escape,
        })
    }

    /// Check that the delimiter is non-empty and free of the escape byte.
    pub fn validate(delimiter: &[u8], escape: u8) -> Result<()> {
        if delimiter.is_empty() {
            return Err(FrameError::UnsupportedConfiguration(
                "delimiter must be at least one byte",
            ));
        }
        if delimiter.contains(&escape) {
            return Err(FrameError::UnsupportedConfiguration(
                "escape code must not be part of the delimiter",
            ));
        }
        Ok(())
    }

    /// Escape `payload` so no byte sequence in it reads as a terminator.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(payload.len() + payload.len() / 8);
        let mut i = 0;
        while i < payload.len() {
            if payload[i..].starts_with(&self.delimiter) {
                out.push(self.escape);
                out.extend_from_slice(&self.delimiter);
                i += self.delimiter.len();
            } else if payload[i] == self.escape {
                out.push(self.escape);
                out.push(self.escape);
                i += 1;
            } else {
                out.push(payload[i]);
                i += 1;
            }
        }
        out
    }

    /// Decode on-wire bytes back into a payload.
    ///
    /// A doubled escape collapses to one literal escape; an escape followed
    /// by the delimiter collapses to a literal delimiter. An unescaped
    /// delimiter is only legal as the final bytes of `wire` (the terminator,
    /// which is stripped); anywhere else it is a [`FrameError::MalformedFrame`].
    pub fn decode(&self, wire: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(wire.len());
        let mut i = 0;
        while i < wire.len() {
            if wire[i] == self.escape {
                if wire.get(i + 1) == Some(&self.escape) {
                    out.push(self.escape);
                    i += 2;
                } else if wire[i + 1..].starts_with(&self.delimiter) {
                    out.extend_from_slice(&self.delimiter);
                    i += 1 + self.delimiter.len();
                } else {
                    // Stray escape before an ordinary byte: passes through.
                    out.push(self.escape);
                    i += 1;
                }
            } else if wire[i..].starts_with(&self.delimiter) {
                if i + self.delimiter.len() != wire.len() {
                    return Err(FrameError::MalformedFrame);
                }
                i += self.delimiter.len();
            } else {
                out.push(wire[i]);
                i += 1;
            }
        }
        Ok(out)
    }

    /// Index one past the first unescaped delimiter in `wire`, if present.
    ///
    /// This is the terminator search shared by message counting and
    /// extraction: a delimiter preceded by an odd run of escape bytes belongs
    /// to the message body and is skipped.
    pub fn find_terminator(&self, wire: &[u8]) -> Option<usize> {
        let mut i = 0;
        while i < wire.len() {
            if wire[i] == self.escape {
                let run_start = i;
                while i < wire.len() && wire[i] == self.escape {
                    i += 1;
                }
                let run = i - run_start;
                if run % 2 == 1 && wire[i..].starts_with(&self.delimiter) {
                    i += self.delimiter.len();
                }
                continue;
            }
            if wire[i..].starts_with(&self.delimiter) {
                return Some(i + self.delimiter.len());
            }
            i += 1;
        }
        None
    }

    /// Whether `unit` (which must end with the delimiter) terminates with an
    /// escaped — and therefore literal — delimiter.
    pub fn trailing_delimiter_escaped(&self, unit: &[u8]) -> bool {
        let Some(body_len) = unit.len().checked_sub(self.delimiter.len()) else {
            return false;
        };
        if !unit[body_len..].starts_with(&self.delimiter) {
            return false;
        }
        let run = unit[..body_len]
            .iter()
            .rev()
            .take_while(|&&b| b == self.escape)
            .count();
        run % 2 == 1
    }

    /// The configured delimiter bytes.
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// The configured escape byte.
    pub fn escape(&self) -> u8 {
        self.escape
    }
}
