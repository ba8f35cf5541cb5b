//! Background task that moves a session through its lifecycle.
//!
//! The driver owns the connection and the keep-alive timer. Both are dropped
//! before the final `Closed`/`Failed` transition, so a terminal session never
//! holds either.

use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use dropshare_connection::Connection;
use dropshare_protocol::constants::PROGRESS_DONE;
use dropshare_protocol::{ClientMessage, ServerMessage};
use dropshare_transfer::{ChunkReader, FileRef, capped_progress};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::keepalive::{KeepAlive, next_tick};
use crate::observer::SessionObserver;
use crate::session::Shared;
use crate::state::SessionState;
use crate::stats::StatsListener;

/// What the connection callbacks report back to the driver.
enum SessionEvent {
    Inbound(String),
    Disconnected,
}

/// Why the driver stopped.
enum Stop {
    Cancelled,
    Failed(SessionError),
}

impl From<SessionError> for Stop {
    fn from(e: SessionError) -> Self {
        Stop::Failed(e)
    }
}

/// Closes the connection and clears the shared open flag when dropped.
struct OwnedConnection {
    conn: Connection,
    shared: Arc<Shared>,
}

impl Deref for OwnedConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for OwnedConnection {
    fn drop(&mut self) {
        self.conn.close();
        self.shared.set_connection_open(false);
    }
}

pub(crate) struct Driver {
    config: SessionConfig,
    observer: Arc<dyn SessionObserver>,
    shared: Arc<Shared>,
    stats: StatsListener,
    cancel: CancellationToken,
}

impl Driver {
    pub(crate) fn new(
        config: SessionConfig,
        observer: Arc<dyn SessionObserver>,
        shared: Arc<Shared>,
        cancel: CancellationToken,
    ) -> Self {
        let stats = StatsListener::new(Arc::clone(&observer));
        Self {
            config,
            observer,
            shared,
            stats,
            cancel,
        }
    }

    pub(crate) async fn run(self, file: FileRef) {
        let stop = self.drive(file).await;
        match stop {
            Stop::Cancelled => {
                self.enter(SessionState::Closed);
            }
            Stop::Failed(err) => {
                warn!(kind = %err.kind(), "session failed: {err}");
                if self.enter(SessionState::Failed) {
                    self.observer.on_error(err.kind(), &err.to_string());
                }
            }
        }
    }

    async fn drive(&self, file: FileRef) -> Stop {
        let conn = match self.connect().await {
            Ok(conn) => conn,
            Err(stop) => return stop,
        };

        let (events_tx, mut events) = mpsc::unbounded_channel();
        let inbound = events_tx.clone();
        if let Err(e) = conn
            .on_message(Box::new(move |text| {
                let _ = inbound.send(SessionEvent::Inbound(text));
            }))
            .await
        {
            return Stop::Failed(e.into());
        }
        conn.on_disconnect(Box::new(move || {
            let _ = events_tx.send(SessionEvent::Disconnected);
        }))
        .await;

        let mut deferred = Vec::new();
        if let Err(stop) = self.send_chunks(&conn, &file, &mut events, &mut deferred).await {
            return stop;
        }
        if !self.enter(SessionState::AwaitingLink) {
            return Stop::Cancelled;
        }
        self.relay(&conn, &mut events, deferred).await
    }

    async fn connect(&self) -> Result<OwnedConnection, Stop> {
        debug!(endpoint = %self.config.endpoint, "opening connection");
        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Stop::Cancelled),
            r = Connection::open(&self.config.endpoint, self.config.open_timeout) => r,
        };
        let conn = opened.map_err(|e| Stop::Failed(e.into()))?;
        self.shared.set_connection_open(true);
        let conn = OwnedConnection {
            conn,
            shared: Arc::clone(&self.shared),
        };

        if !self.enter(SessionState::Sending) {
            return Err(Stop::Cancelled);
        }
        Ok(conn)
    }

    /// Sends every chunk in order, one at a time.
    ///
    /// Server frames other than `error` that arrive meanwhile are pushed to
    /// `deferred` and handled once the session awaits the link.
    async fn send_chunks(
        &self,
        conn: &Connection,
        file: &FileRef,
        events: &mut mpsc::UnboundedReceiver<SessionEvent>,
        deferred: &mut Vec<ServerMessage>,
    ) -> Result<(), Stop> {
        let mut reader = ChunkReader::new(file, self.config.chunk_size)
            .map_err(|e| Stop::Failed(e.into()))?;
        let total = reader.total_chunks();
        debug!(total_chunks = total, "sending chunks");

        loop {
            if self.cancel.is_cancelled() {
                return Err(Stop::Cancelled);
            }
            while let Ok(event) = events.try_recv() {
                if let Some(msg) = self.while_sending(event, reader.next_index(), total)? {
                    deferred.push(msg);
                }
            }

            let chunk = match reader.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => return Err(Stop::Failed(e.into())),
            };

            let message = chunk.to_message();
            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Stop::Cancelled),
                r = conn.send(&message) => r,
            };
            if let Err(e) = sent {
                return Err(Stop::Failed(SessionError::TransferInterrupted(format!(
                    "chunk {} of {total}: {e}",
                    chunk.index + 1
                ))));
            }

            let chunks_sent = self.shared.record_chunk(chunk.len());
            trace!(chunk_index = chunk.index, total_chunks = total, "chunk queued");
            self.report_progress(capped_progress(chunks_sent, total));
        }

        info!(total_chunks = total, bytes = file.size(), "all chunks sent");
        Ok(())
    }

    fn while_sending(
        &self,
        event: SessionEvent,
        sent: u64,
        total: u64,
    ) -> Result<Option<ServerMessage>, Stop> {
        match event {
            SessionEvent::Disconnected => Err(Stop::Failed(SessionError::TransferInterrupted(
                format!("connection lost after {sent} of {total} chunks"),
            ))),
            SessionEvent::Inbound(text) => match self.stats.decode(&text) {
                Some(ServerMessage::Error { message }) => {
                    Err(Stop::Failed(SessionError::ServerRejected(message)))
                }
                Some(other) => {
                    debug!(?other, "deferring frame until all chunks are sent");
                    Ok(Some(other))
                }
                None => Ok(None),
            },
        }
    }

    /// Waits for the share code, then relays stats and keeps the connection
    /// alive until cancelled or the connection is lost.
    async fn relay(
        &self,
        conn: &Connection,
        events: &mut mpsc::UnboundedReceiver<SessionEvent>,
        deferred: Vec<ServerMessage>,
    ) -> Stop {
        let mut keepalive: Option<KeepAlive> = None;
        for msg in deferred {
            if let Err(stop) = self.on_server_message(msg, &mut keepalive) {
                return stop;
            }
        }
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Stop::Cancelled,
                event = events.recv() => {
                    let Some(event) = event else {
                        return Stop::Failed(SessionError::TransferInterrupted(
                            "connection lost".into(),
                        ));
                    };
                    if let Err(stop) = self.after_sending(event, &mut keepalive) {
                        return stop;
                    }
                }
                _ = next_tick(&mut keepalive), if keepalive.is_some() => self.ping(conn).await,
            }
        }
    }

    fn after_sending(
        &self,
        event: SessionEvent,
        keepalive: &mut Option<KeepAlive>,
    ) -> Result<(), Stop> {
        let state = self.shared.state();
        let text = match event {
            SessionEvent::Inbound(text) => text,
            SessionEvent::Disconnected if state == SessionState::Live => {
                return Err(SessionError::TransferInterrupted("connection lost".into()).into());
            }
            SessionEvent::Disconnected => {
                return Err(SessionError::TransferInterrupted(
                    "connection lost before the share code arrived".into(),
                )
                .into());
            }
        };

        match self.stats.decode(&text) {
            Some(msg) => self.on_server_message(msg, keepalive),
            None => Ok(()),
        }
    }

    fn on_server_message(
        &self,
        msg: ServerMessage,
        keepalive: &mut Option<KeepAlive>,
    ) -> Result<(), Stop> {
        let state = self.shared.state();
        match msg {
            ServerMessage::Link { code } if state == SessionState::AwaitingLink => {
                self.go_live(&code, keepalive)
            }
            ServerMessage::Link { code } => {
                warn!(%state, code, "ignoring repeated link");
                Ok(())
            }
            ServerMessage::Stats { downloads } if state == SessionState::Live => {
                self.shared.set_download_count(downloads);
                self.stats.forward(downloads);
                Ok(())
            }
            ServerMessage::Stats { downloads } => {
                debug!(%state, downloads, "ignoring stats before link");
                Ok(())
            }
            ServerMessage::Error { message } if state == SessionState::AwaitingLink => {
                Err(SessionError::ServerRejected(message).into())
            }
            ServerMessage::Error { message } => {
                warn!(%state, "server error after link: {message}");
                Ok(())
            }
            ServerMessage::Unknown => Ok(()),
        }
    }

    fn go_live(&self, code: &str, keepalive: &mut Option<KeepAlive>) -> Result<(), Stop> {
        if !self.shared.set_share_code(code) {
            warn!(code, "share code already set");
            return Ok(());
        }
        if !self.enter(SessionState::Live) {
            return Err(Stop::Cancelled);
        }
        *keepalive = Some(KeepAlive::start(
            self.config.keepalive_period,
            self.shared.keepalive_flag(),
        ));
        self.report_progress(PROGRESS_DONE);
        info!(share_code = code, "upload complete");
        self.observer.on_link(code);
        Ok(())
    }

    async fn ping(&self, conn: &Connection) {
        if !conn.is_open() {
            debug!("connection not open, skipping keep-alive");
            return;
        }
        if let Err(e) = conn.send(&ClientMessage::Ping).await {
            warn!("keep-alive ping failed: {e}");
        }
    }

    /// Applies a transition and notifies the observer. Returns `false` when
    /// the edge is not allowed from the current state.
    fn enter(&self, next: SessionState) -> bool {
        match self.shared.transition(next) {
            Ok(previous) => {
                debug!(from = %previous, to = %next, "state change");
                self.observer.on_state_change(next);
                true
            }
            Err(current) => {
                debug!(%current, rejected = %next, "transition not allowed");
                false
            }
        }
    }

    fn report_progress(&self, percent: u8) {
        if self.shared.advance_progress(percent) {
            self.observer.on_progress(percent);
        }
    }
}
