//! WebSocket write pump: the only task that writes to the socket.

use std::sync::Arc;

use futures_util::SinkExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

use crate::types::{CLOSE_WAIT, ConnectionState, mark_disconnected};
use crate::ws_client::DisconnectNotifier;

/// Writes queued frames to the WebSocket, in queue order.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    state: Arc<watch::Sender<ConnectionState>>,
    on_disconnect: Arc<DisconnectNotifier>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => {
                match msg {
                    Some(m) => {
                        trace!(len = m.len(), "writing frame");
                        if let Err(e) = write.send(m).await {
                            error!("WebSocket write error: {e}");
                            if mark_disconnected(&state) {
                                on_disconnect.notify().await;
                            }
                            return;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    let _ = tokio::time::timeout(CLOSE_WAIT, write.send(tungstenite::Message::Close(None))).await;
}
