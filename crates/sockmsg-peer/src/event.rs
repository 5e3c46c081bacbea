/// Observations a connection makes while polling its transport.
///
/// Events accumulate in a per-connection queue and are drained by the
/// application; they are ordered, and `Disconnected` is always last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// New bytes were staged in the receive buffer.
    RawDataArrived,
    /// One complete message boundary was discovered. Queued once per message.
    MessageArrived,
    /// The peer closed the connection. Fired exactly once; the connection
    /// produces no further events.
    Disconnected,
}

/// Lifecycle observations a server makes about its client connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerEvent {
    /// A new client connection was accepted, with its assigned id.
    ClientConnected(u64),
    /// A client connection was retired after disconnecting.
    ClientDisconnected(u64),
}
