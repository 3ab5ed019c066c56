use thiserror::Error;

/// Errors surfaced by the MangaDex content source.
///
/// Nothing here is retried by this layer; retry policy belongs to the
/// caller or an outer request scheduler.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection-level failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status from the MangaDex API, surfaced unmodified.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Caller passed a home-section id the source does not define.
    #[error("unknown home section: {0}")]
    InvalidSection(String),
}
