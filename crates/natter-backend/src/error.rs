//! Error types for natter-backend

use thiserror::Error;

/// Result type alias using natter-backend Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while requesting or consuming a reply stream
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed at the transport level
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response carried no streamable body
    #[error("response carried no streamable body")]
    EmptyBody,

    /// Backend signalled an error record mid-stream
    #[error("stream error: {0}")]
    Stream(String),
}
