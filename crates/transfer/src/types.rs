use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use dropshare_protocol::ClientMessage;

use crate::TransferError;

#[derive(Debug, Clone)]
enum Source {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// Read-only handle to a file picked for upload.
///
/// `size` and `name` are captured at selection time and never change; the
/// bytes themselves are read lazily by [`ChunkReader`](crate::ChunkReader).
#[derive(Debug, Clone)]
pub struct FileRef {
    name: String,
    size: u64,
    source: Source,
}

impl FileRef {
    /// Wraps an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            source: Source::Memory(bytes),
        }
    }

    /// References a file on disk. The display name is the final path component.
    pub fn from_path(path: &Path) -> Result<Self, TransferError> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(TransferError::InvalidPath(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TransferError::InvalidPath(path.display().to_string()))?;
        Ok(Self {
            name,
            size: meta.len(),
            source: Source::Disk(path.to_path_buf()),
        })
    }

    /// Display name sent alongside every chunk.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total length in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn open(&self) -> Result<Box<dyn Read + Send>, TransferError> {
        match &self.source {
            Source::Memory(bytes) => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
            Source::Disk(path) => Ok(Box::new(std::fs::File::open(path)?)),
        }
    }
}

/// One ordered slice of a file, ready to be framed for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position; always `< total_chunks`.
    pub index: u64,
    pub total_chunks: u64,
    /// Raw bytes of this slice.
    pub data: Vec<u8>,
    /// Name of the file this chunk belongs to.
    pub owner_name: String,
}

impl Chunk {
    /// Base64 text form of `data`.
    pub fn encode_payload(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Builds the `upload_chunk` frame for this slice.
    pub fn to_message(&self) -> ClientMessage {
        ClientMessage::UploadChunk {
            name: self.owner_name.clone(),
            chunk: self.encode_payload(),
            chunk_index: self.index,
            total_chunks: self.total_chunks,
        }
    }

    /// Length of the raw slice in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_bytes_captures_size() {
        let file = FileRef::from_bytes("a.txt", b"hello".to_vec());
        assert_eq!(file.name(), "a.txt");
        assert_eq!(file.size(), 5);
    }

    #[test]
    fn from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[0u8; 300])
            .unwrap();

        let file = FileRef::from_path(&path).unwrap();
        assert_eq!(file.name(), "report.pdf");
        assert_eq!(file.size(), 300);
    }

    #[test]
    fn from_path_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileRef::from_path(dir.path());
        assert!(matches!(result, Err(TransferError::InvalidPath(_))));
    }

    #[test]
    fn from_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileRef::from_path(&dir.path().join("nope.bin"));
        assert!(matches!(result, Err(TransferError::Io(_))));
    }

    #[test]
    fn chunk_message_carries_index_and_payload() {
        let chunk = Chunk {
            index: 1,
            total_chunks: 3,
            data: b"Hello".to_vec(),
            owner_name: "greeting.txt".into(),
        };
        match chunk.to_message() {
            ClientMessage::UploadChunk {
                name,
                chunk,
                chunk_index,
                total_chunks,
            } => {
                assert_eq!(name, "greeting.txt");
                assert_eq!(chunk, "SGVsbG8=");
                assert_eq!(chunk_index, 1);
                assert_eq!(total_chunks, 3);
            }
            other => panic!("expected upload_chunk, got {other:?}"),
        }
    }
}
