//! Persistent duplex connection to the upload endpoint.
//!
//! A [`Connection`] owns one WebSocket. Outbound frames are serialised by a
//! single write pump; inbound text frames are handed, in arrival order, to
//! the one registered message handler.

mod pumps;
pub mod types;
pub mod ws_client;

pub use types::ConnectionState;
pub use ws_client::{Connection, ConnectionError, DisconnectHandler, MessageHandler};
