use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use sockmsg_transport::{TcpAcceptor, TcpTransport};
use tracing::{info, warn};

use crate::connection::Connection;
use crate::error::{PeerError, Result};
use crate::event::ServerEvent;
use crate::worker::PollWorker;

/// A TCP server that accepts and polls message connections.
///
/// One background [`PollWorker`] drives everything: per tick it accepts all
/// pending connections (assigning monotonic ids starting at 1, never reused),
/// polls every live connection, and retires disconnected ones. Connection
/// lifecycle is reported through a [`ServerEvent`] queue; per-connection data
/// events live on each [`Connection`].
pub struct MessageServer {
    inner: Arc<ServerInner>,
    worker: Option<PollWorker>,
}

struct ServerInner {
    acceptor: TcpAcceptor,
    connections: Mutex<Vec<Arc<Connection<TcpTransport>>>>,
    events: Mutex<VecDeque<ServerEvent>>,
    next_id: AtomicU64,
}

impl MessageServer {
    /// Bind to `addr` and start the polling worker.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let inner = Arc::new(ServerInner {
            acceptor: TcpAcceptor::bind(addr)?,
            connections: Mutex::new(Vec::new()),
            events: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
        });

        let tick_inner = Arc::clone(&inner);
        let worker = PollWorker::spawn("sockmsg-server", move || tick_inner.tick())?;

        Ok(Self {
            inner,
            worker: Some(worker),
        })
    }

    /// The locally bound address (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.acceptor.local_addr()
    }

    /// Snapshot of the currently live connections.
    pub fn connections(&self) -> Vec<Arc<Connection<TcpTransport>>> {
        self.inner.lock_connections().clone()
    }

    /// Look up a live connection by id.
    pub fn connection(&self, id: u64) -> Option<Arc<Connection<TcpTransport>>> {
        self.inner
            .lock_connections()
            .iter()
            .find(|conn| conn.id() == id)
            .cloned()
    }

    /// Whether the polling worker is running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Pop the oldest queued lifecycle event.
    pub fn next_event(&self) -> Option<ServerEvent> {
        self.inner.lock_events().pop_front()
    }

    /// Pop every queued lifecycle event, oldest first.
    pub fn drain_events(&self) -> Vec<ServerEvent> {
        self.inner.lock_events().drain(..).collect()
    }

    /// Stop the polling worker and close every connection.
    ///
    /// Cooperative: the in-flight tick finishes before the worker is joined.
    /// Fails with [`PeerError::NotRunning`] when already stopped.
    pub fn stop(&mut self) -> Result<()> {
        let Some(mut worker) = self.worker.take() else {
            return Err(PeerError::NotRunning);
        };
        worker.stop();

        for conn in self.inner.lock_connections().drain(..) {
            conn.close();
        }
        info!(addr = %self.local_addr(), "server stopped");
        Ok(())
    }
}

impl ServerInner {
    fn tick(&self) {
        match self.acceptor.accept_pending() {
            Ok(transports) => {
                for transport in transports {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    info!(id, "client connected");
                    self.lock_connections()
                        .push(Arc::new(Connection::new(id, transport)));
                    self.lock_events().push_back(ServerEvent::ClientConnected(id));
                }
            }
            Err(err) => warn!(%err, "accept failed"),
        }

        // Poll outside the list lock so application calls are not starved.
        for conn in self.lock_connections().clone() {
            if let Err(err) = conn.poll() {
                warn!(id = conn.id(), %err, "poll failed");
            }
        }

        let mut retired = Vec::new();
        self.lock_connections().retain(|conn| {
            if conn.is_closed() {
                retired.push(conn.id());
                false
            } else {
                true
            }
        });
        let mut events = self.lock_events();
        for id in retired {
            info!(id, "client disconnected");
            events.push_back(ServerEvent::ClientDisconnected(id));
        }
    }

    fn lock_connections(
        &self,
    ) -> std::sync::MutexGuard<'_, Vec<Arc<Connection<TcpTransport>>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_events(&self) -> std::sync::MutexGuard<'_, VecDeque<ServerEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MessageServer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpStream;
    use std::time::{Duration, Instant};

    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn accepts_connections_with_monotonic_ids() {
        let server = MessageServer::bind(loopback()).unwrap();
        let addr = server.local_addr();

        let _c1 = TcpStream::connect(addr).unwrap();
        let _c2 = TcpStream::connect(addr).unwrap();
        wait_for(|| server.connections().len() == 2);

        assert_eq!(server.next_event(), Some(ServerEvent::ClientConnected(1)));
        assert_eq!(server.next_event(), Some(ServerEvent::ClientConnected(2)));
        assert!(server.connection(1).is_some());
        assert!(server.connection(3).is_none());
    }

    #[test]
    fn retires_disconnected_clients() {
        let server = MessageServer::bind(loopback()).unwrap();
        let client = TcpStream::connect(server.local_addr()).unwrap();
        wait_for(|| server.connections().len() == 1);

        drop(client);
        wait_for(|| server.connections().is_empty());
        assert_eq!(
            server.drain_events(),
            [
                ServerEvent::ClientConnected(1),
                ServerEvent::ClientDisconnected(1),
            ]
        );
    }

    #[test]
    fn ids_are_not_reused() {
        let server = MessageServer::bind(loopback()).unwrap();
        let addr = server.local_addr();

        let first = TcpStream::connect(addr).unwrap();
        wait_for(|| server.connections().len() == 1);
        drop(first);
        wait_for(|| server.connections().is_empty());

        let _second = TcpStream::connect(addr).unwrap();
        wait_for(|| server.connections().len() == 1);
        assert_eq!(server.connections()[0].id(), 2);
    }

    #[test]
    fn double_stop_is_an_error() {
        let mut server = MessageServer::bind(loopback()).unwrap();
        assert!(server.is_running());
        server.stop().unwrap();
        assert!(!server.is_running());
        assert!(matches!(server.stop(), Err(PeerError::NotRunning)));
    }
}
