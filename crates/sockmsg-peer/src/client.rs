use std::net::SocketAddr;
use std::sync::Arc;

use sockmsg_transport::TcpTransport;
use tracing::info;

use crate::connection::Connection;
use crate::error::{PeerError, Result};
use crate::worker::PollWorker;

/// A client-side message connection with its own polling worker.
///
/// Client connections carry id 0; server-assigned ids start at 1.
pub struct Client {
    connection: Arc<Connection<TcpTransport>>,
    worker: Option<PollWorker>,
}

impl Client {
    /// Connect to a server and start polling.
    pub fn connect(addr: SocketAddr) -> Result<Self> {
        let transport = TcpTransport::connect(addr)?;
        let connection = Arc::new(Connection::new(0, transport));

        let polled = Arc::clone(&connection);
        let worker = PollWorker::spawn("sockmsg-client", move || {
            if let Err(err) = polled.poll() {
                tracing::warn!(%err, "poll failed");
            }
        })?;

        info!(%addr, "client connected");
        Ok(Self {
            connection,
            worker: Some(worker),
        })
    }

    /// The underlying connection. Clone the `Arc` to share it with other
    /// threads; the polling worker holds its own handle.
    pub fn connection(&self) -> &Arc<Connection<TcpTransport>> {
        &self.connection
    }

    /// Whether the polling worker is running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Stop polling and close the connection.
    ///
    /// Fails with [`PeerError::NotRunning`] when already disconnected.
    pub fn disconnect(&mut self) -> Result<()> {
        let Some(mut worker) = self.worker.take() else {
            return Err(PeerError::NotRunning);
        };
        worker.stop();
        self.connection.close();
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}
