use thiserror::Error;

/// Failures reported by a classification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    #[error("network error: {0}")]
    Network(String),

    #[error("classifier did not answer within {0} ms")]
    Timeout(u64),

    #[error("classifier returned HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("malformed classifier response: {0}")]
    Malformed(String),

    #[error("request was cancelled")]
    Cancelled,
}

/// Failures of a single analysis attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("no image selected")]
    MissingFile,

    #[error("an analysis is already running")]
    AlreadyRunning,

    #[error("the picked image is still being read")]
    ReadingFile,

    #[error(transparent)]
    Collaborator(#[from] ClassifierError),

    #[error("response superseded by a newer selection")]
    Superseded,

    #[error("workflow was disposed before the analysis finished")]
    Detached,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid classifier endpoint {value:?}: {reason}")]
    InvalidEndpoint { value: String, reason: String },

    #[error("invalid number for {key}: {value:?}")]
    InvalidNumber { key: String, value: String },
}
