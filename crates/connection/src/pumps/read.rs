//! WebSocket read pump: hands inbound text frames to the message handler.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use dropshare_protocol::constants::WS_MAX_INBOUND_SIZE;

use crate::types::{ConnectionState, mark_disconnected};
use crate::ws_client::{DisconnectNotifier, MessageSlot};

/// Reads frames until the peer goes away or the connection is cancelled.
///
/// Text frames reach the handler one at a time, in arrival order. When the
/// stream ends without a local close the disconnect notifier fires.
pub(crate) async fn read_pump<S>(
    mut read: S,
    on_message: MessageSlot,
    on_disconnect: Arc<DisconnectNotifier>,
    state: Arc<watch::Sender<ConnectionState>>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => match msg {
                        tungstenite::Message::Text(text) => {
                            handle_text_message(text.as_str(), &on_message).await;
                        }
                        tungstenite::Message::Ping(data) => {
                            trace!("received ping, sending pong");
                            let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                        }
                        tungstenite::Message::Pong(_) => {
                            trace!("received pong");
                        }
                        tungstenite::Message::Close(frame) => {
                            debug!(?frame, "received close frame");
                            break;
                        }
                        _ => {} // Binary: not part of the protocol.
                    },
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    if cancel.is_cancelled() {
        return;
    }
    if mark_disconnected(&state) {
        on_disconnect.notify().await;
    }
}

/// Hands one text frame to the registered handler.
async fn handle_text_message(text: &str, on_message: &MessageSlot) {
    if text.len() > WS_MAX_INBOUND_SIZE {
        warn!("message too large ({} bytes), dropping", text.len());
        return;
    }

    let guard = on_message.lock().await;
    if let Some(cb) = guard.as_ref() {
        cb(text.to_owned());
    } else {
        warn!("no message handler set, dropping inbound frame");
    }
}
