use crate::protocol::{ErrorKind, Outcome};
use crate::session::SessionError;

/// Everything that can go wrong between receiving arguments and producing
/// an [`Outcome`]. Converted into a failed outcome at the adapter boundary.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("missing required parameter '{0}'")]
    MissingParam(String),

    #[error("unknown parameter '{0}'")]
    UnknownParam(String),

    #[error("invalid parameter '{param}': {reason}")]
    InvalidParam { param: String, reason: String },

    #[error("path does not exist: {path} (parameter '{param}')")]
    PathNotFound { param: String, path: String },

    #[error("'{program}' is not installed or not on PATH")]
    DependencyMissing { program: String },

    #[error("configuration value '{0}' is not set")]
    MissingVar(String),

    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Execution {
        message: String,
        raw_stderr: Option<String>,
    },

    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("unexpected output: {0}")]
    Parse(String),

    #[error("failed to prepare temporary file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AdapterError {
    pub fn invalid(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAnObject
            | Self::MissingParam(_)
            | Self::UnknownParam(_)
            | Self::InvalidParam { .. } => ErrorKind::ValidationError,
            Self::PathNotFound { .. } => ErrorKind::NotFound,
            Self::DependencyMissing { .. } | Self::MissingVar(_) => ErrorKind::DependencyMissing,
            Self::Launch { .. } | Self::Execution { .. } | Self::TempFile(_) => {
                ErrorKind::ExecutionError
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::Session(e) => e.kind(),
        }
    }
}

impl From<AdapterError> for Outcome {
    fn from(err: AdapterError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let raw = match err {
            AdapterError::Execution { raw_stderr, .. } => raw_stderr,
            _ => None,
        };
        Outcome::failure(kind, message).with_raw_stderr(raw)
    }
}
