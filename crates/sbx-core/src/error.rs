//! Validation errors raised by the path layer.

use thiserror::Error;

/// Rejection of a specific input. Deterministic: retrying the same input
/// fails the same way, so callers surface these instead of retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("invalid project id {id:?}: {reason}")]
    InvalidProjectId { id: String, reason: &'static str },

    #[error("invalid upload filename {name:?}: {reason}")]
    InvalidFilename { name: String, reason: &'static str },

    #[error("path {path:?} escapes workspace {boundary}")]
    PathEscape { path: String, boundary: String },
}

impl WorkspaceError {
    pub(crate) fn invalid_project_id(id: &str, reason: &'static str) -> Self {
        Self::InvalidProjectId { id: id.to_string(), reason }
    }

    pub(crate) fn invalid_filename(name: &str, reason: &'static str) -> Self {
        Self::InvalidFilename { name: name.to_string(), reason }
    }

    pub(crate) fn path_escape(path: impl Into<String>, boundary: impl Into<String>) -> Self {
        Self::PathEscape { path: path.into(), boundary: boundary.into() }
    }
}

/// Configuration problems detected while building [`crate::Settings`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("workspace root must be absolute, got {0:?}")]
    RelativeRoot(String),

    #[error("workspace root must not contain NUL bytes")]
    NulInRoot,

    #[error("unknown sandbox provider {0:?} (expected daytona or local_process)")]
    UnknownProvider(String),
}

pub type Result<T, E = WorkspaceError> = std::result::Result<T, E>;
