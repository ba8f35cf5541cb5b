//! WebSocket client for the upload endpoint.
//!
//! Implements the connection handle: bounded open, queued sends through a
//! single write pump, one inbound message handler and an idempotent close.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{Mutex, mpsc, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use dropshare_protocol::ClientMessage;
use dropshare_protocol::constants::WS_MAX_INBOUND_SIZE;

use crate::types::{ConnectionState, WRITE_QUEUE_DEPTH};

/// Errors from the connection handle.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection is not open")]
    NotOpen,

    #[error("connection closed")]
    Closed,

    #[error("a message handler is already registered")]
    HandlerAlreadySet,
}

/// Callback invoked once per inbound text frame.
pub type MessageHandler = Box<dyn Fn(String) + Send + Sync>;

/// Callback invoked when the peer goes away.
pub type DisconnectHandler = Box<dyn Fn() + Send + Sync>;

pub(crate) type MessageSlot = Arc<Mutex<Option<MessageHandler>>>;

/// Delivers the disconnect notification exactly once, whether the handler
/// is registered before or after the socket dies.
pub(crate) struct DisconnectNotifier {
    handler: Mutex<Option<DisconnectHandler>>,
    disconnected: AtomicBool,
    fired: AtomicBool,
}

impl DisconnectNotifier {
    pub(crate) fn new() -> Self {
        Self {
            handler: Mutex::new(None),
            disconnected: AtomicBool::new(false),
            fired: AtomicBool::new(false),
        }
    }

    pub(crate) async fn set(&self, handler: DisconnectHandler) {
        let mut slot = self.handler.lock().await;
        *slot = Some(handler);
        if self.disconnected.load(Ordering::SeqCst) {
            self.fire(&slot);
        }
    }

    pub(crate) async fn notify(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
        let slot = self.handler.lock().await;
        self.fire(&slot);
    }

    fn fire(&self, slot: &Option<DisconnectHandler>) {
        if let Some(cb) = slot.as_ref() {
            if !self.fired.swap(true, Ordering::SeqCst) {
                cb();
            }
        }
    }
}

/// One persistent WebSocket connection.
///
/// Dropping the handle aborts both pumps and releases the socket.
pub struct Connection {
    write_tx: mpsc::Sender<tungstenite::Message>,
    state: Arc<watch::Sender<ConnectionState>>,
    on_message: MessageSlot,
    on_disconnect: Arc<DisconnectNotifier>,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
    cancel: CancellationToken,
}

impl Connection {
    /// Opens a connection to `endpoint`, failing with
    /// [`ConnectionError::Timeout`] if the handshake does not finish within
    /// `timeout`.
    ///
    /// On timeout or cancellation the in-flight handshake future is dropped,
    /// which releases the underlying socket.
    pub async fn open(endpoint: &str, timeout: Duration) -> Result<Self, ConnectionError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_INBOUND_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_INBOUND_SIZE);

        let connect = tokio_tungstenite::connect_async_with_config(endpoint, Some(ws_config), false);
        let (ws_stream, _) = match tokio::time::timeout(timeout, connect).await {
            Ok(result) => result?,
            Err(_) => return Err(ConnectionError::Timeout(timeout)),
        };
        info!(endpoint, "connection opened");

        let (write, read) = ws_stream.split();
        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(WRITE_QUEUE_DEPTH);
        let (state, _) = watch::channel(ConnectionState::Open);
        let state = Arc::new(state);
        let on_message: MessageSlot = Arc::new(Mutex::new(None));
        let on_disconnect = Arc::new(DisconnectNotifier::new());
        let cancel = CancellationToken::new();

        let write_handle = {
            let state = state.clone();
            let on_disconnect = on_disconnect.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(
                write,
                write_rx,
                state,
                on_disconnect,
                cancel,
            ))
        };

        let read_handle = {
            let on_message = on_message.clone();
            let on_disconnect = on_disconnect.clone();
            let state = state.clone();
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::read::read_pump(
                read,
                on_message,
                on_disconnect,
                state,
                write_tx,
                cancel,
            ))
        };

        Ok(Self {
            write_tx,
            state,
            on_message,
            on_disconnect,
            _read_handle: read_handle,
            _write_handle: write_handle,
            cancel,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns `true` while frames can be sent.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Queues one frame for the write pump.
    ///
    /// Waits only for room in the local queue, never for the network.
    pub async fn send(&self, message: &ClientMessage) -> Result<(), ConnectionError> {
        match self.state() {
            ConnectionState::Open => {}
            ConnectionState::Closed => return Err(ConnectionError::Closed),
            ConnectionState::Disconnected => return Err(ConnectionError::NotOpen),
        }

        let json = message.to_json()?;
        self.write_tx
            .send(tungstenite::Message::Text(json.into()))
            .await
            .map_err(|_| match self.state() {
                ConnectionState::Closed => ConnectionError::Closed,
                _ => ConnectionError::NotOpen,
            })
    }

    /// Registers the handler for inbound text frames.
    ///
    /// Only one handler may be registered per connection.
    pub async fn on_message(&self, handler: MessageHandler) -> Result<(), ConnectionError> {
        let mut slot = self.on_message.lock().await;
        if slot.is_some() {
            return Err(ConnectionError::HandlerAlreadySet);
        }
        *slot = Some(handler);
        Ok(())
    }

    /// Registers the disconnect callback.
    ///
    /// Fires at most once. If the peer is already gone the callback runs
    /// immediately.
    pub async fn on_disconnect(&self, handler: DisconnectHandler) {
        self.on_disconnect.set(handler).await;
    }

    /// Closes the connection. Safe to call repeatedly and from any state.
    pub fn close(&self) {
        let previous = self.state.send_replace(ConnectionState::Closed);
        self.cancel.cancel();
        if previous != ConnectionState::Closed {
            debug!(?previous, "connection closed");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.state.send_replace(ConnectionState::Closed);
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
    }
}
