//! Chunked transfer session.
//!
//! A [`TransferSession`] uploads one file over one connection, then stays
//! connected to relay download statistics until it is cleared or dropped.
//!
//! ```text
//! Idle -> Connecting -> Sending -> AwaitingLink -> Live -> Closed
//!            \______________\____________\__________\---> Failed
//! ```

pub mod config;
mod driver;
pub mod error;
mod keepalive;
pub mod observer;
mod session;
pub mod state;
mod stats;

pub use config::{ConfigError, SessionConfig, endpoint_from_origin, share_url};
pub use error::{ErrorKind, SessionError};
pub use observer::{ChannelObserver, ObserverEvent, SessionObserver};
pub use session::TransferSession;
pub use state::SessionState;

pub use dropshare_transfer::FileRef;
