//! Public types for the connection handle.

use std::time::Duration;

use tokio::sync::watch;

/// Lifecycle of an opened connection.
///
/// A [`Connection`](crate::Connection) only exists once the handshake
/// completed, so it starts out `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake done, frames can be sent.
    Open,
    /// The peer went away or the socket failed. Sends fail with `NotOpen`.
    Disconnected,
    /// Closed locally via [`Connection::close`](crate::Connection::close).
    /// Sends fail with `Closed`.
    Closed,
}

/// Outbound frames buffered ahead of the socket.
pub(crate) const WRITE_QUEUE_DEPTH: usize = 16;

/// Time allowed for the close frame to go out when shutting down.
pub(crate) const CLOSE_WAIT: Duration = Duration::from_secs(1);

/// Moves `Open` to `Disconnected`. A locally closed connection stays `Closed`.
pub(crate) fn mark_disconnected(state: &watch::Sender<ConnectionState>) -> bool {
    state.send_if_modified(|s| {
        if *s == ConnectionState::Open {
            *s = ConnectionState::Disconnected;
            true
        } else {
            false
        }
    })
}
