//! File references, chunking and progress arithmetic for uploads.

mod chunked;
mod progress;
mod types;
mod validation;

pub use chunked::{ChunkReader, chunk_count, decode_payload, encode_payload, reassemble};
pub use progress::capped_progress;
pub use types::{Chunk, FileRef};
pub use validation::validate_file_size;

pub use dropshare_protocol::constants::{CHUNK_SIZE, MAX_FILE_SIZE};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("invalid chunk payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
