use std::fmt;

use thiserror::Error;

/// Coarse classification of a [`SchemaError`].
///
/// Callers that only need to decide between "bad input", "nothing to load"
/// and "the manager itself is broken" can match on this instead of the
/// full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input, or a shape-validation failure.
    InvalidArgument,
    /// A requested optional capability (the default factory) is missing.
    NotFound,
    /// Manager misconfiguration or a converter logic error.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Error returned by every fallible operation of the migration engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The input could not be interpreted (null, missing version, bad range).
    #[error("{0}")]
    InvalidArgument(String),
    /// Data did not match the shape registered for its version.
    #[error("Schema validation failed for {name} version {version}: {diagnostic}")]
    ValidationFailed {
        name: String,
        version: u32,
        diagnostic: Diagnostic,
    },
    /// No default factory configured.
    #[error("{0}")]
    NotFound(String),
    /// The manager or one of its converters is broken.
    #[error("{0}")]
    Internal(String),
}

impl SchemaError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The kind of this error. Validation failures count as invalid arguments.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::ValidationFailed { .. } => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Field-level diagnostics, if this is a validation failure.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::ValidationFailed { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

/// A single problem found while validating a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Dotted path to the offending field, `$` for the root.
    pub path: String,
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Structured validation failure produced by a [`Validator`](crate::Validator).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    pub issues: Vec<Issue>,
}

impl Diagnostic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostic with a single issue.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![Issue::new(path, message)],
        }
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue::new(path, message));
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns `Ok(())` when no issue was recorded.
    pub fn into_result(self) -> Result<(), Diagnostic> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "no issues");
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl From<serde_json::Error> for Diagnostic {
    fn from(e: serde_json::Error) -> Self {
        Self::single("$", e.to_string())
    }
}
