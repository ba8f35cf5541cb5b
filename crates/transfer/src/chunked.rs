use std::io::Read;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::types::{Chunk, FileRef};
use crate::{CHUNK_SIZE, TransferError};

// ---------------------------------------------------------------------------
// Payload encoding
// ---------------------------------------------------------------------------

/// Encodes raw bytes as standard base64 for the JSON envelope.
pub fn encode_payload(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes a chunk payload back to raw bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, TransferError> {
    Ok(STANDARD.decode(payload)?)
}

/// Rebuilds file content from payloads given in index order.
///
/// This is what the server does on receipt of the last chunk.
pub fn reassemble<'a, I>(payloads: I) -> Result<Vec<u8>, TransferError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for payload in payloads {
        out.extend_from_slice(&decode_payload(payload)?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Chunk arithmetic
// ---------------------------------------------------------------------------

fn effective_chunk_size(chunk_size: usize) -> usize {
    if chunk_size == 0 { CHUNK_SIZE } else { chunk_size }
}

/// Number of chunks needed for `file_size` bytes: `ceil(file_size / chunk_size)`.
///
/// An empty file has zero chunks. A `chunk_size` of 0 means [`CHUNK_SIZE`].
pub fn chunk_count(file_size: u64, chunk_size: usize) -> u64 {
    file_size.div_ceil(effective_chunk_size(chunk_size) as u64)
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Lazily slices a [`FileRef`] into fixed-size [`Chunk`]s.
///
/// Each byte range is read exactly once, in order, so the reader is a
/// single-pass sequence: there is no way to rewind it. Every chunk except the
/// last is exactly `chunk_size` bytes long.
pub struct ChunkReader {
    reader: Box<dyn Read + Send>,
    owner_name: String,
    chunk_size: usize,
    file_size: u64,
    offset: u64,
    next_index: u64,
    total_chunks: u64,
    failed: bool,
}

impl ChunkReader {
    /// Opens `file` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`CHUNK_SIZE`] (64 KiB) is used.
    pub fn new(file: &FileRef, chunk_size: usize) -> Result<Self, TransferError> {
        let chunk_size = effective_chunk_size(chunk_size);
        Ok(Self {
            reader: file.open()?,
            owner_name: file.name().to_string(),
            chunk_size,
            file_size: file.size(),
            offset: 0,
            next_index: 0,
            total_chunks: chunk_count(file.size(), chunk_size),
            failed: false,
        })
    }

    /// Reads the next chunk. Returns `None` once all chunks were produced.
    ///
    /// A source that turns out shorter than the size captured at selection
    /// time yields an `UnexpectedEof` I/O error.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        if self.failed || self.next_index >= self.total_chunks {
            return Ok(None);
        }

        let remaining = self.file_size - self.offset;
        let read_size = std::cmp::min(remaining, self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; read_size];
        if let Err(e) = self.reader.read_exact(&mut buf) {
            self.failed = true;
            return Err(e.into());
        }

        let chunk = Chunk {
            index: self.next_index,
            total_chunks: self.total_chunks,
            data: buf,
            owner_name: self.owner_name.clone(),
        };
        self.offset += read_size as u64;
        self.next_index += 1;
        Ok(Some(chunk))
    }

    /// Total number of chunks this reader will produce.
    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// Index of the next chunk to be produced.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> u64 {
        self.file_size - self.offset
    }
}

impl Iterator for ChunkReader {
    type Item = Result<Chunk, TransferError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
