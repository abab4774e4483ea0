// Error types for the server and the client library.

use std::io;
use std::path::PathBuf;

use tile_duel_protocol::ProtocolError;

/// Failures starting or configuring the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failures seen by a `Client`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    /// The server closed the connection before sending anything, which is
    /// how it turns away a third player.
    #[error("server is full")]
    ServerFull,

    #[error("connection closed by server")]
    Disconnected,

    #[error("timed out waiting for a snapshot")]
    Timeout,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
