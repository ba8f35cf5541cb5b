use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

use dropshare_transfer::{FileRef, validate_file_size};

use crate::config::SessionConfig;
use crate::driver::Driver;
use crate::error::SessionError;
use crate::observer::SessionObserver;
use crate::state::SessionState;

/// State shared between the session handle and its driver task.
pub(crate) struct Shared {
    inner: RwLock<SharedInner>,
    keepalive_active: Arc<AtomicBool>,
    connection_open: AtomicBool,
}

struct SharedInner {
    state: SessionState,
    chunks_sent: u64,
    bytes_sent: u64,
    progress: u8,
    share_code: Option<String>,
    download_count: u64,
}

impl Shared {
    fn new() -> Self {
        Self {
            inner: RwLock::new(SharedInner {
                state: SessionState::Idle,
                chunks_sent: 0,
                bytes_sent: 0,
                progress: 0,
                share_code: None,
                download_count: 0,
            }),
            keepalive_active: Arc::new(AtomicBool::new(false)),
            connection_open: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SharedInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SharedInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> SessionState {
        self.read().state
    }

    /// Applies `next` if it is an edge from the current state.
    ///
    /// Returns the previous state, or the current one if the edge is rejected.
    pub(crate) fn transition(&self, next: SessionState) -> Result<SessionState, SessionState> {
        let mut s = self.write();
        let current = s.state;
        if current.can_transition_to(next) {
            s.state = next;
            Ok(current)
        } else {
            Err(current)
        }
    }

    /// Records one queued chunk and returns the number sent so far.
    pub(crate) fn record_chunk(&self, bytes: usize) -> u64 {
        let mut s = self.write();
        s.chunks_sent += 1;
        s.bytes_sent += bytes as u64;
        s.chunks_sent
    }

    /// Raises progress to `percent`. Returns `false` if that would not be an
    /// increase.
    pub(crate) fn advance_progress(&self, percent: u8) -> bool {
        let mut s = self.write();
        if percent > s.progress {
            s.progress = percent;
            true
        } else {
            false
        }
    }

    /// Stores the share code. Only the first call has any effect.
    pub(crate) fn set_share_code(&self, code: &str) -> bool {
        let mut s = self.write();
        if s.share_code.is_some() {
            return false;
        }
        s.share_code = Some(code.to_string());
        true
    }

    pub(crate) fn set_download_count(&self, count: u64) {
        self.write().download_count = count;
    }

    pub(crate) fn keepalive_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.keepalive_active)
    }

    pub(crate) fn set_connection_open(&self, open: bool) {
        self.connection_open.store(open, Ordering::SeqCst);
    }
}

/// Uploads one file and then relays its download statistics.
///
/// The session owns its connection and keep-alive timer; neither is reachable
/// from outside. Dropping the session disposes of it: the driver task is
/// aborted and every resource it holds is released.
pub struct TransferSession {
    id: Uuid,
    config: SessionConfig,
    observer: Arc<dyn SessionObserver>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl TransferSession {
    /// Creates an idle session.
    pub fn new(config: SessionConfig, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            observer,
            shared: Arc::new(Shared::new()),
            cancel: CancellationToken::new(),
            driver: Mutex::new(None),
        }
    }

    /// Starts uploading `file`.
    ///
    /// Oversize and empty files are rejected here, before any network
    /// activity, and leave the session `Idle`. Otherwise the session moves to `Connecting`
    /// and a driver task takes over; must be called from within a tokio
    /// runtime.
    pub fn start(&self, file: FileRef) -> Result<(), SessionError> {
        let state = self.shared.state();
        if state != SessionState::Idle {
            return Err(SessionError::InvalidState(state));
        }

        let rejected = match validate_file_size(file.size(), self.config.max_file_size) {
            Err(e) => Some(SessionError::from(e)),
            Ok(()) if file.size() == 0 => Some(SessionError::EmptyFile),
            Ok(()) => None,
        };
        if let Some(err) = rejected {
            warn!(session_id = %self.id, file = file.name(), "rejected before upload: {err}");
            self.observer.on_error(err.kind(), &err.to_string());
            return Err(err);
        }

        if let Err(current) = self.shared.transition(SessionState::Connecting) {
            return Err(SessionError::InvalidState(current));
        }
        self.observer.on_state_change(SessionState::Connecting);

        let span = info_span!(
            "session",
            session_id = %self.id,
            file = file.name(),
            size = file.size()
        );
        let driver = Driver::new(
            self.config.clone(),
            Arc::clone(&self.observer),
            Arc::clone(&self.shared),
            self.cancel.clone(),
        );
        let handle = tokio::spawn(driver.run(file).instrument(span));
        *self.driver.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Ends the session.
    ///
    /// Stops the keep-alive timer, closes the connection and abandons any
    /// chunks not yet sent. Returns once all of that has happened. A failed
    /// session stays `Failed`; every other state becomes `Closed`.
    pub async fn clear(&self) {
        self.cancel.cancel();
        let handle = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(session_id = %self.id, "session driver ended abnormally: {e}");
            }
        }
        if self.shared.transition(SessionState::Closed).is_ok() {
            self.observer.on_state_change(SessionState::Closed);
        }
    }

    /// Session id, as used in log spans.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Last reported progress in percent.
    pub fn progress(&self) -> u8 {
        self.shared.read().progress
    }

    pub fn chunks_sent(&self) -> u64 {
        self.shared.read().chunks_sent
    }

    pub fn bytes_sent(&self) -> u64 {
        self.shared.read().bytes_sent
    }

    /// Share code issued by the server, once `Live`.
    pub fn share_code(&self) -> Option<String> {
        self.shared.read().share_code.clone()
    }

    /// Latest download count relayed from the server.
    pub fn download_count(&self) -> u64 {
        self.shared.read().download_count
    }

    /// Whether the keep-alive timer currently exists.
    pub fn is_keepalive_active(&self) -> bool {
        self.shared.keepalive_active.load(Ordering::SeqCst)
    }

    /// Whether the session currently holds an open connection.
    pub fn is_connection_open(&self) -> bool {
        self.shared.connection_open.load(Ordering::SeqCst)
    }
}

impl Drop for TransferSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        let slot = self
            .driver
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}
