use sockmsg_transport::Result;
#[cfg(unix)]
use sockmsg_transport::TcpTransport;

/// The byte-stream operations a [`Connection`](crate::Connection) polls
/// against.
///
/// Abstracting the stream behind this trait keeps the connection logic
/// testable without sockets; [`TcpTransport`] is the production
/// implementation.
pub trait Transport: Send + 'static {
    /// Number of bytes that can be read without blocking.
    fn available(&self) -> Result<usize>;

    /// Copy pending bytes into `buf` without consuming them; returns the
    /// number of bytes copied. Must not block.
    fn peek(&self, buf: &mut [u8]) -> Result<usize>;

    /// Remove and return up to `len` pending bytes; may return short. Must
    /// not block.
    fn consume(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Write all of `bytes` to the peer.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Whether the peer end is still open. Pending unread data keeps a
    /// half-closed stream alive until drained.
    fn is_alive(&self) -> bool;

    /// Kernel receive-buffer size, if the transport has one. Seeds the
    /// staging capacity and the default maximum message size.
    fn recv_buffer_size(&self) -> Option<usize>;

    /// Release the underlying resources. Later calls may fail or report the
    /// transport as dead.
    fn close(&mut self);
}

#[cfg(unix)]
impl Transport for TcpTransport {
    fn available(&self) -> Result<usize> {
        TcpTransport::available(self)
    }

    fn peek(&self, buf: &mut [u8]) -> Result<usize> {
        TcpTransport::peek(self, buf)
    }

    fn consume(&mut self, len: usize) -> Result<Vec<u8>> {
        TcpTransport::consume(self, len)
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        TcpTransport::send(self, bytes)
    }

    fn is_alive(&self) -> bool {
        TcpTransport::is_alive(self)
    }

    fn recv_buffer_size(&self) -> Option<usize> {
        TcpTransport::recv_buffer_size(self).ok()
    }

    fn close(&mut self) {
        self.shutdown();
    }
}
