use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Frames sent by the uploading client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One base64-encoded slice of the file.
    ///
    /// The server concatenates chunks in arrival order, so they must be sent
    /// with strictly increasing `chunk_index`.
    UploadChunk {
        name: String,
        chunk: String,
        #[serde(rename = "chunkIndex")]
        chunk_index: u64,
        #[serde(rename = "totalChunks")]
        total_chunks: u64,
    },
    /// Liveness ping. The server answers with a `stats` frame once a share
    /// code exists.
    Ping,
}

impl ClientMessage {
    /// Serializes the frame to its JSON text form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Frames pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Upload complete; `code` addresses the stored file.
    Link { code: String },
    /// Current download count of the shared file.
    Stats { downloads: u64 },
    /// The server rejected the upload.
    Error { message: String },
    /// Forward compatibility: unknown `type` tags deserialize here.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Parses a server frame from its JSON text form.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
