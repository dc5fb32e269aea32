use thiserror::Error;

/// Errors that can occur while talking to a remote server.
///
/// The harvest pipeline never lets one of these escape an item boundary:
/// each is recorded as a `fetch_failed` failure and the run continues.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be sent or the body could not be read
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The server answered but sent nothing usable
    #[error("{url} returned an empty body")]
    EmptyBody { url: String },
}

/// Diagnostic recorded when a content stream has to be read as raw bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream was not a valid zlib/deflate payload
    #[error("inflate failed: {0}")]
    Inflate(String),
}

/// Errors that halt a whole run.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Reading the input document or writing an output file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A dataset document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A network collaborator could not be constructed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The primary input document yielded nothing at all
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),
}
