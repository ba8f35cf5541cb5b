//! Wire protocol types for the dropshare upload channel.
//!
//! Every frame is a JSON text envelope. Client frames are tagged by
//! `action`, server frames by `type`.

pub mod constants;
pub mod messages;

// Re-export primary types for convenience.
pub use messages::{ClientMessage, ServerMessage};
