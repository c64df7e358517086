use metacontext_graph::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, ResolverError>;

/// Coarse error category, stable across the exposed boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    StoreUnavailable,
    UnsupportedOperation,
    InvalidArgument,
    TypeUnknown,
}

impl ErrorKind {
    /// HTTP-style status code reported to callers.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound | ErrorKind::TypeUnknown => 404,
            ErrorKind::Unauthorized => 403,
            ErrorKind::StoreUnavailable => 503,
            ErrorKind::UnsupportedOperation => 501,
            ErrorKind::InvalidArgument => 400,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::UnsupportedOperation => "unsupported_operation",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::TypeUnknown => "type_unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolverError {
    #[error("{what} `{id}` not found")]
    NotFound { what: &'static str, id: String },
    #[error("user `{user}` is not authorized: {reason}")]
    Unauthorized { user: String, reason: String },
    #[error("metadata store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unknown type `{0}`")]
    TypeUnknown(String),
}

impl ResolverError {
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        ResolverError::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolverError::NotFound { .. } => ErrorKind::NotFound,
            ResolverError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ResolverError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            ResolverError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            ResolverError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ResolverError::TypeUnknown(_) => ErrorKind::TypeUnknown,
        }
    }

    /// Domain absence, as opposed to a fault that must abort a resolution.
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            ResolverError::NotFound { .. } | ResolverError::TypeUnknown(_)
        )
    }

    pub fn to_failure(&self) -> FailureDescriptor {
        let kind = self.kind();
        FailureDescriptor {
            status: kind.status_code(),
            kind,
            message: self.to_string(),
        }
    }
}

impl From<StoreError> for ResolverError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthorized { user, reason } => ResolverError::Unauthorized { user, reason },
            StoreError::Unavailable(msg) => ResolverError::StoreUnavailable(msg),
            StoreError::Unsupported(op) => ResolverError::UnsupportedOperation(op),
            StoreError::InvalidParameter(msg) => ResolverError::InvalidArgument(msg),
        }
    }
}

/// Structured failure handed across the exposed boundary instead of an error value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDescriptor {
    pub status: u16,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for FailureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status, self.kind, self.message)
    }
}

impl From<ResolverError> for FailureDescriptor {
    fn from(err: ResolverError) -> Self {
        err.to_failure()
    }
}
