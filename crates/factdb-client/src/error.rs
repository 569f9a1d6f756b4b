//! Error types for FactDB client operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors raised while constructing a [`crate::Client`] or talking to a
/// FactDB instance.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A configured server URL could not be parsed.
    #[error("the provided server url was invalid: '{url}': {source}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// The CLI config file was present but unreadable or malformed.
    #[error("failed to load config file '{}': {detail}", path.display())]
    Config {
        /// Path of the config file.
        path: PathBuf,
        /// Human-readable reason the file was rejected.
        detail: String,
    },
    /// The connection settings resolved to an empty endpoint list.
    #[error("no server urls configured")]
    NoEndpoints,
    /// The token file could not be read.
    #[error("failed to read token file '{}': {source}", path.display())]
    Token {
        /// Path of the token file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Building the HTTP client failed, usually bad certificate material.
    #[error("failed to build HTTP client: {detail}")]
    Build {
        /// Human-readable build failure detail.
        detail: String,
    },
    /// A local filesystem operation on an archive path failed.
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        /// Path of the file being read or written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The remote endpoint could not be reached.
    #[error("failed to connect to the server: {source}")]
    Connection {
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("remote API error (status {status}): {body}")]
    Api {
        /// HTTP status code of the error response.
        status: u16,
        /// Response body text.
        body: String,
    },
    /// A success response carried a body that could not be decoded.
    #[error("failed to decode response body: {source}")]
    Decode {
        /// Underlying decode error.
        source: reqwest::Error,
    },
}
