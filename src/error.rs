use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection failures, timeouts, DNS errors. Never retried.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid json content: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("expected a json response, got text: {0}")]
    UnexpectedBody(String),

    #[error("field `{0}` is missing, request the matching query options")]
    MissingField(&'static str),

    #[error("change {0} not found")]
    ChangeNotFound(String),

    #[error("invalid glob pattern: {0}")]
    InvalidGlob(#[from] globset::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }
}
