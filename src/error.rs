//! Content API error types

use thiserror::Error;

/// Errors raised while talking to the content API
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content API returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid JSON from content API: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },

    #[error("Content API did not advertise a master ref")]
    MissingMasterRef,

    #[error("Content API endpoint is not configured")]
    MissingEndpoint,

    #[error("Invalid page cursor {cursor:?}: {source}")]
    InvalidCursor {
        cursor: String,
        #[source]
        source: url::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
