//! Decoding of server frames and relay of download statistics.

use std::sync::Arc;

use dropshare_protocol::ServerMessage;
use tracing::{debug, warn};

use crate::observer::SessionObserver;

/// Decodes inbound frames and forwards download counts to the observer.
pub(crate) struct StatsListener {
    observer: Arc<dyn SessionObserver>,
}

impl StatsListener {
    pub(crate) fn new(observer: Arc<dyn SessionObserver>) -> Self {
        Self { observer }
    }

    /// Decodes one inbound frame.
    ///
    /// Malformed frames and unknown `type` tags yield `None`; neither is an
    /// error for the session.
    pub(crate) fn decode(&self, text: &str) -> Option<ServerMessage> {
        match ServerMessage::from_json(text) {
            Ok(ServerMessage::Unknown) => {
                debug!(frame = text, "ignoring frame with unknown type");
                None
            }
            Ok(msg) => Some(msg),
            Err(e) => {
                warn!("failed to parse server frame: {e}");
                None
            }
        }
    }

    /// Forwards a download count verbatim. No clamping, no deltas.
    pub(crate) fn forward(&self, downloads: u64) {
        self.observer.on_stats(downloads);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{ChannelObserver, ObserverEvent};

    fn listener() -> (StatsListener, tokio::sync::mpsc::UnboundedReceiver<ObserverEvent>) {
        let (obs, rx) = ChannelObserver::channel();
        (StatsListener::new(Arc::new(obs)), rx)
    }

    #[test]
    fn decodes_stats() {
        let (l, _) = listener();
        assert_eq!(
            l.decode(r#"{"type":"stats","downloads":7}"#),
            Some(ServerMessage::Stats { downloads: 7 })
        );
    }

    #[test]
    fn unknown_tag_is_ignored() {
        let (l, _) = listener();
        assert_eq!(l.decode(r#"{"type":"banner","text":"hi"}"#), None);
    }

    #[test]
    fn malformed_frame_is_ignored() {
        let (l, _) = listener();
        assert_eq!(l.decode("{{{"), None);
        assert_eq!(l.decode(r#"{"type":"stats","downloads":"many"}"#), None);
    }

    #[test]
    fn forwards_counts_verbatim() {
        let (l, mut rx) = listener();
        l.forward(7);
        l.forward(3);
        assert_eq!(rx.try_recv().unwrap(), ObserverEvent::Stats(7));
        assert_eq!(rx.try_recv().unwrap(), ObserverEvent::Stats(3));
    }
}
