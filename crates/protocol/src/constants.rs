use std::time::Duration;

/// Size of one upload chunk before base64 encoding (64 KiB).
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Largest file the client will attempt to upload (100 MiB).
///
/// Enforced before any connection is opened.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Interval between application-level pings once a share code is issued.
pub const KEEPALIVE_PERIOD: Duration = Duration::from_millis(500);

/// Upper bound on establishing the WebSocket connection.
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Progress reported while chunks are in flight never exceeds this value.
///
/// Only a `link` frame from the server moves progress to 100.
pub const PROGRESS_CAP: u8 = 95;

/// Progress once the server has confirmed the upload.
pub const PROGRESS_DONE: u8 = 100;

/// Maximum inbound text frame accepted by the client (1 MiB).
///
/// Server frames are tiny; anything larger is dropped.
pub const WS_MAX_INBOUND_SIZE: usize = 1024 * 1024;

/// Path of the upload socket relative to the page origin.
pub const WS_PATH: &str = "/ws";
