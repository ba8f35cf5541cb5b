//! Session configuration and endpoint derivation.

use std::time::Duration;

use url::Url;

use dropshare_protocol::constants::{
    CHUNK_SIZE, KEEPALIVE_PERIOD, MAX_FILE_SIZE, OPEN_TIMEOUT, WS_PATH,
};

/// Errors from building a session configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid origin {origin:?}: {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {0:?} (expected http, https, ws or wss)")]
    UnsupportedScheme(String),
}

/// Tunables of one transfer session.
///
/// [`Default`] is the reference transfer profile: 64 KiB chunks, a 100 MiB
/// size limit, a 500 ms keep-alive and a 5 s connection timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// WebSocket URL of the upload endpoint.
    pub endpoint: String,
    pub chunk_size: usize,
    pub max_file_size: u64,
    pub keepalive_period: Duration,
    pub open_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("ws://localhost:8080{WS_PATH}"),
            chunk_size: CHUNK_SIZE,
            max_file_size: MAX_FILE_SIZE,
            keepalive_period: KEEPALIVE_PERIOD,
            open_timeout: OPEN_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Reference profile pointed at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Reference profile for the page served at `origin`.
    pub fn from_origin(origin: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(endpoint_from_origin(origin)?))
    }
}

/// Derives the upload socket URL from the origin serving the page.
///
/// `http` maps to `ws` and `https` to `wss`, with the path set to `/ws`.
/// `ws`/`wss` URLs are taken as already complete.
pub fn endpoint_from_origin(origin: &str) -> Result<String, ConfigError> {
    let mut url = Url::parse(origin).map_err(|source| ConfigError::InvalidOrigin {
        origin: origin.to_string(),
        source,
    })?;

    let scheme = match url.scheme() {
        "ws" | "wss" => return Ok(url.into()),
        "http" => "ws",
        "https" => "wss",
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    };

    // http(s) -> ws(s) stays within the special schemes, so this cannot fail.
    let _ = url.set_scheme(scheme);
    url.set_path(WS_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.into())
}

/// Public download URL for `code` on the server at `origin`.
pub fn share_url(origin: &str, code: &str) -> String {
    format!("{}/{}", origin.trim_end_matches('/'), code)
}
