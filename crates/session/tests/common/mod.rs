//! In-process upload server for session tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use dropshare_session::{ObserverEvent, SessionState};

pub const WAIT: Duration = Duration::from_secs(5);

enum Command {
    Send(String),
    Drop,
}

/// Accepts a single WebSocket client, records every text frame it sends and
/// replies with whatever the test scripts.
pub struct MockServer {
    pub addr: SocketAddr,
    frames: mpsc::UnboundedReceiver<Value>,
    commands: mpsc::UnboundedSender<Command>,
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (commands, mut command_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = accept_async(stream).await.unwrap();
            let (mut write, mut read) = ws.split();
            loop {
                tokio::select! {
                    msg = read.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            let value: Value = serde_json::from_str(text.as_str()).unwrap();
                            let _ = frames_tx.send(value);
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    },
                    cmd = command_rx.recv() => match cmd {
                        Some(Command::Send(text)) => {
                            if write.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        Some(Command::Drop) | None => break,
                    },
                }
            }
        });

        Self {
            addr,
            frames,
            commands,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Sends one text frame to the client.
    pub fn send(&self, text: &str) {
        self.commands.send(Command::Send(text.to_string())).unwrap();
    }

    /// Drops the socket without a close handshake.
    pub fn drop_connection(&self) {
        let _ = self.commands.send(Command::Drop);
    }

    /// Next frame received from the client.
    pub async fn next_frame(&mut self) -> Value {
        tokio::time::timeout(WAIT, self.frames.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("server task ended")
    }

    /// Next `n` frames, asserting that each is an `upload_chunk`.
    pub async fn upload_chunks(&mut self, n: usize) -> Vec<Value> {
        let mut chunks = Vec::with_capacity(n);
        for _ in 0..n {
            let frame = self.next_frame().await;
            assert_eq!(frame["action"], "upload_chunk", "unexpected frame {frame}");
            chunks.push(frame);
        }
        chunks
    }

    /// Waits until the client has gone away, discarding any remaining frames.
    pub async fn wait_closed(&mut self) {
        tokio::time::timeout(WAIT, async {
            while self.frames.recv().await.is_some() {}
        })
        .await
        .expect("client connection still open");
    }
}

/// Next observer event.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<ObserverEvent>) -> ObserverEvent {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for an observer event")
        .expect("observer channel closed")
}

/// Collects events up to and including the transition into `state`.
pub async fn events_until_state(
    rx: &mut mpsc::UnboundedReceiver<ObserverEvent>,
    state: SessionState,
) -> Vec<ObserverEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = event == ObserverEvent::StateChanged(state);
        events.push(event);
        if done {
            return events;
        }
    }
}

/// Collects events up to and including the first error.
pub async fn events_until_error(
    rx: &mut mpsc::UnboundedReceiver<ObserverEvent>,
) -> Vec<ObserverEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = matches!(event, ObserverEvent::Error { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}

pub fn link(code: &str) -> String {
    format!(r#"{{"type":"link","code":"{code}"}}"#)
}

pub fn stats(downloads: u64) -> String {
    format!(r#"{{"type":"stats","downloads":{downloads}}}"#)
}

pub fn error(message: &str) -> String {
    format!(r#"{{"type":"error","message":"{message}"}}"#)
}
