//! Error types for the analyzer client

/// Result type for analyzer client operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Error types for analyzer client operations
#[derive(thiserror::Error, Debug)]
pub enum AnalyzerError {
    #[error("Not a video file: {name} ({mime})")]
    InvalidSelection { name: String, mime: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Server returned HTTP {status}")]
    Server { status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// How a failed upload is reported back to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable, connection error or timeout
    Transport,
    /// Non-2xx response
    Server,
    /// 2xx response whose body is not an analysis result
    MalformedResponse,
}

impl AnalyzerError {
    /// Classify an error raised while performing an upload.
    ///
    /// Local read failures happen before anything reaches the wire and are
    /// reported like a transport failure.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AnalyzerError::Server { .. } => FailureKind::Server,
            AnalyzerError::MalformedResponse(_) => FailureKind::MalformedResponse,
            AnalyzerError::Transport(_)
            | AnalyzerError::Io(_)
            | AnalyzerError::InvalidSelection { .. }
            | AnalyzerError::Config(_) => FailureKind::Transport,
        }
    }
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalyzerError::Transport(format!("request timed out: {}", e))
        } else if let Some(status) = e.status() {
            AnalyzerError::Server { status: status.as_u16() }
        } else if e.is_decode() {
            AnalyzerError::MalformedResponse(e.to_string())
        } else {
            AnalyzerError::Transport(e.to_string())
        }
    }
}
