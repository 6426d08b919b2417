use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PatentError {
    #[error("malformed query record {path}: {reason}")]
    #[diagnostic(help("query records must be JSON objects with an optional `citations_by_examiner` string array"))]
    MalformedInput { path: String, reason: String },

    #[error("invalid patent id: {0}")]
    InvalidPatentId(String),

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("patent page request failed: {0}")]
    FetchHttp(String),

    #[error("patent page returned status {status}: {message}")]
    FetchStatus { status: u16, message: String },

    #[error("front image unavailable: {0}")]
    AssetUnavailable(String),

    #[error("filesystem error: {0}")]
    Persistence(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl PatentError {
    /// Errors confined to a single query record; the batch moves on.
    pub fn is_per_query(&self) -> bool {
        matches!(self, PatentError::MalformedInput { .. })
    }

    pub(crate) fn malformed(path: impl ToString, reason: impl ToString) -> Self {
        PatentError::MalformedInput {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
