use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("Invalid request: {0}")]
    Http(#[from] http::Error),

    #[error("Invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid uri: {0}")]
    Uri(#[from] http::uri::InvalidUri),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Url has no host: {0}")]
    MissingHost(String),

    #[error("Expected file ending to be http: {}", .0.display())]
    NotHttpFile(PathBuf),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
