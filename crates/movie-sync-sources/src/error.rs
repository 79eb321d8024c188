use thiserror::Error;

/// Failure of a single call to an external service
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse failure classes callers decide skip-vs-abort on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TransportFailure,
    MalformedResponse,
    NotFound,
    ConfigurationInvalid,
}

impl SourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::Transport(_) | SourceError::Status { .. } => ErrorKind::TransportFailure,
            SourceError::Malformed(_) => ErrorKind::MalformedResponse,
            SourceError::NotFound(_) => ErrorKind::NotFound,
            SourceError::InvalidRequest(_) => ErrorKind::ConfigurationInvalid,
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Malformed(e.to_string())
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(e: quick_xml::Error) -> Self {
        SourceError::Malformed(format!("XML parse error: {}", e))
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
