use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::os::fd::AsRawFd;

use tracing::debug;

use crate::error::{Result, TransportError};

/// A connected TCP byte stream.
///
/// Wraps [`TcpStream`] with the operations the framing engine polls against:
/// pending byte count, non-destructive peek, destructive consume, and a
/// liveness probe. None of the operations block waiting for data.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to a listening peer (blocking).
    pub fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|source| TransportError::Connect { addr, source })?;
        debug!(%addr, "connected tcp transport");
        Self::from_stream(stream)
    }

    /// Wrap an already-connected stream.
    ///
    /// Nagle is disabled so small framed messages are not held back by the
    /// kernel between polls.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    /// Number of bytes that can be read without blocking.
    pub fn available(&self) -> Result<usize> {
        let mut pending: libc::c_int = 0;
        // SAFETY: `pending` is a valid writable c_int and the fd is an open
        // socket descriptor owned by this transport.
        let rc = unsafe {
            libc::ioctl(self.stream.as_raw_fd(), libc::FIONREAD, &mut pending)
        };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(pending.max(0) as usize)
    }

    /// Copy pending bytes into `buf` without consuming them.
    ///
    /// Returns the number of bytes copied. Never blocks: at most
    /// [`available`](Self::available) bytes are peeked.
    pub fn peek(&self, buf: &mut [u8]) -> Result<usize> {
        let pending = self.available()?;
        if pending == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = pending.min(buf.len());
        let n = self.stream.peek(&mut buf[..want])?;
        Ok(n)
    }

    /// Remove and return up to `len` pending bytes.
    ///
    /// Returns fewer bytes when fewer are pending; never blocks.
    pub fn consume(&mut self, len: usize) -> Result<Vec<u8>> {
        let n = self.available()?.min(len);
        let mut buf = vec![0u8; n];
        if n > 0 {
            // The kernel already holds these bytes, so this cannot block.
            self.stream.read_exact(&mut buf)?;
        }
        Ok(buf)
    }

    /// Write all of `bytes` to the peer.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Whether the peer end of the stream is still open.
    ///
    /// A stream that is not read-ready is alive. A stream that reports
    /// read-readiness but peeks zero bytes has been closed, reset, or
    /// terminated by the peer.
    pub fn is_alive(&self) -> bool {
        if !self.read_ready() {
            return true;
        }
        let mut probe = [0u8; 1];
        match self.stream.peek(&mut probe) {
            Ok(0) => false,
            Ok(_) => true,
            Err(err) if err.kind() == ErrorKind::WouldBlock => true,
            Err(_) => false,
        }
    }

    /// Size of the kernel receive buffer, used to seed the staging capacity.
    pub fn recv_buffer_size(&self) -> Result<usize> {
        let mut size: libc::c_int = 0;
        let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
        // SAFETY: `size` and `len` are valid writable pointers for the
        // provided sizes, and the fd is an open socket owned by this process.
        let rc = unsafe {
            libc::getsockopt(
                self.stream.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_RCVBUF,
                (&mut size as *mut libc::c_int).cast::<libc::c_void>(),
                &mut len,
            )
        };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(size.max(0) as usize)
    }

    /// Address of the remote endpoint.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }

    /// Shut down both directions of the stream.
    pub fn shutdown(&mut self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }

    fn read_ready(&self) -> bool {
        let mut fds = libc::pollfd {
            fd: self.stream.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `fds` is a valid pollfd array of length 1; zero timeout
        // makes this a non-blocking readiness query.
        let rc = unsafe { libc::poll(&mut fds, 1, 0) };
        if rc < 0 {
            // Treat a failed readiness query as "ready" so the follow-up peek
            // decides liveness.
            return true;
        }
        rc > 0 && fds.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("peer", &self.stream.peer_addr().ok())
            .finish()
    }
}
