//! Callback boundary towards the view layer.

use tokio::sync::mpsc;

use crate::error::ErrorKind;
use crate::state::SessionState;

/// Receives session notifications. All methods default to no-ops.
///
/// Callbacks run on the session's driver task and must not block.
pub trait SessionObserver: Send + Sync {
    /// Upload progress in percent. Non-decreasing; at most 95 until the
    /// share code arrives, then 100.
    fn on_progress(&self, _percent: u8) {}

    /// The server issued the share code. Fires at most once.
    fn on_link(&self, _share_code: &str) {}

    /// Latest download count, forwarded verbatim.
    fn on_stats(&self, _download_count: u64) {}

    /// The session failed. Fires at most once.
    fn on_error(&self, _kind: ErrorKind, _message: &str) {}

    /// The session moved to `state`.
    fn on_state_change(&self, _state: SessionState) {}
}

/// A single observer notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    Progress(u8),
    Link(String),
    Stats(u64),
    Error { kind: ErrorKind, message: String },
    StateChanged(SessionState),
}

/// Observer that forwards every notification into a channel.
///
/// Lets an async consumer (a UI loop, a test) await events in order.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ObserverEvent>,
}

impl ChannelObserver {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ObserverEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: ObserverEvent) {
        // The receiver going away just means nobody is watching any more.
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn on_progress(&self, percent: u8) {
        self.emit(ObserverEvent::Progress(percent));
    }

    fn on_link(&self, share_code: &str) {
        self.emit(ObserverEvent::Link(share_code.to_string()));
    }

    fn on_stats(&self, download_count: u64) {
        self.emit(ObserverEvent::Stats(download_count));
    }

    fn on_error(&self, kind: ErrorKind, message: &str) {
        self.emit(ObserverEvent::Error {
            kind,
            message: message.to_string(),
        });
    }

    fn on_state_change(&self, state: SessionState) {
        self.emit(ObserverEvent::StateChanged(state));
    }
}
