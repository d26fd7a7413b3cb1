//! Value types for project ids, roots and normalized sandbox paths.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, SettingsError, WorkspaceError};
use crate::safety;

// ─────────────────────────────────────────────────────────────────────────────
// ProjectId
// ─────────────────────────────────────────────────────────────────────────────

/// Validated project identifier.
///
/// Used as a namespace key and, after validation, as exactly one path
/// segment. It can never contain a separator or a traversal sequence, so
/// joining it onto a root cannot climb out of that root. Surrounding
/// whitespace is dropped, so `" proj1 "` and `"proj1"` are the same project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let raw = id.into();
        let id = raw.trim();
        if id.is_empty() {
            return Err(WorkspaceError::invalid_project_id(&raw, "must not be empty"));
        }
        if id.contains(['/', '\\']) {
            return Err(WorkspaceError::invalid_project_id(id, "must not contain path separators"));
        }
        if id == "." || id.contains("..") {
            return Err(WorkspaceError::invalid_project_id(id, "must not contain traversal sequences"));
        }
        if id.chars().any(char::is_control) {
            return Err(WorkspaceError::invalid_project_id(id, "must not contain control characters"));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectId {
    type Err = WorkspaceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SandboxPath
// ─────────────────────────────────────────────────────────────────────────────

/// Absolute, lexically normalized path inside a sandbox filesystem.
///
/// Always starts with `/`, never contains `.`/`..` segments, empty segments
/// or a trailing separator (except the root itself).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SandboxPath(String);

impl SandboxPath {
    /// Normalize an absolute path. Returns `None` for relative input.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.starts_with(safety::SEPARATOR)
            .then(|| Self(safety::normalize_absolute(raw)))
    }

    pub(crate) fn from_normalized(path: String) -> Self {
        debug_assert_eq!(path, safety::normalize_absolute(&path));
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        safety::segments(&self.0)
    }

    /// Append one segment. The segment must already be a plain name.
    pub(crate) fn child(&self, segment: &str) -> Self {
        debug_assert!(!segment.is_empty() && !segment.contains(safety::SEPARATOR));
        if self.0 == "/" {
            Self(format!("/{segment}"))
        } else {
            Self(format!("{}/{segment}", self.0))
        }
    }

    /// Lexically resolve `raw` against this path.
    pub fn resolve(&self, raw: &str) -> Self {
        Self(safety::resolve_lexically(&self.0, raw))
    }

    /// Segment-wise containment; `self` counts as inside itself.
    pub fn starts_with(&self, base: &SandboxPath) -> bool {
        safety::is_within(&self.0, &base.0)
    }

    /// Segments of `self` below `base`, or `None` when not contained.
    pub fn strip_prefix<'a>(&'a self, base: &SandboxPath) -> Option<Vec<&'a str>> {
        if !self.starts_with(base) {
            return None;
        }
        Some(self.segments().skip(base.segments().count()).collect())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    pub fn parent(&self) -> Option<Self> {
        let segments: Vec<&str> = self.segments().collect();
        let (_, rest) = segments.split_last()?;
        Some(Self(safety::join_segments(rest)))
    }
}

impl fmt::Display for SandboxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SandboxPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BaseRoot / ProviderMode
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_WORKSPACE_ROOT: &str = "/workspace";

/// Absolute root every workspace is derived from. Fixed for the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BaseRoot(SandboxPath);

impl BaseRoot {
    pub fn new(raw: &str) -> std::result::Result<Self, SettingsError> {
        if raw.contains('\0') {
            return Err(SettingsError::NulInRoot);
        }
        let trimmed = raw.trim();
        SandboxPath::parse(trimmed)
            .map(Self)
            .ok_or_else(|| SettingsError::RelativeRoot(raw.to_string()))
    }

    pub fn path(&self) -> &SandboxPath {
        &self.0
    }
}

impl Default for BaseRoot {
    fn default() -> Self {
        Self(SandboxPath::from_normalized(DEFAULT_WORKSPACE_ROOT.to_string()))
    }
}

impl fmt::Display for BaseRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Directory layout family of the active sandbox provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderMode {
    /// One filesystem shared by all projects; projects live in subdirectories.
    #[default]
    SharedRoot,
    /// Each project gets its own root directory.
    PerProjectRoot,
}

impl ProviderMode {
    /// Provider name as it appears in `SANDBOX_PROVIDER`.
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::SharedRoot => "daytona",
            Self::PerProjectRoot => "local_process",
        }
    }
}

impl FromStr for ProviderMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> std::result::Result<Self, SettingsError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daytona" => Ok(Self::SharedRoot),
            "local_process" | "local_docker" => Ok(Self::PerProjectRoot),
            _ => Err(SettingsError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SafetyVerdict
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnsafeReason {
    /// Resolves outside the workspace subtree.
    EscapesWorkspace,
    /// Input carries a NUL byte.
    NulByte,
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EscapesWorkspace => f.write_str("path escapes the workspace"),
            Self::NulByte => f.write_str("path contains a NUL byte"),
        }
    }
}

/// Outcome of a safety check, with the path it was computed for.
#[must_use = "a safety verdict must be checked before the path is used"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    path: SandboxPath,
    boundary: SandboxPath,
    reason: Option<UnsafeReason>,
}

impl SafetyVerdict {
    pub(crate) fn new(path: SandboxPath, boundary: SandboxPath, reason: Option<UnsafeReason>) -> Self {
        Self { path, boundary, reason }
    }

    pub fn is_safe(&self) -> bool {
        self.reason.is_none()
    }

    pub fn reason(&self) -> Option<UnsafeReason> {
        self.reason
    }

    /// The normalized path the verdict is about (possibly outside the boundary).
    pub fn path(&self) -> &SandboxPath {
        &self.path
    }

    pub fn boundary(&self) -> &SandboxPath {
        &self.boundary
    }

    /// The verified path, or `PathEscape`.
    pub fn into_result(self) -> Result<SandboxPath> {
        match self.reason {
            None => Ok(self.path),
            Some(_) => Err(WorkspaceError::path_escape(self.path.0, self.boundary.0)),
        }
    }
}
