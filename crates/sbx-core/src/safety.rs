//! Traversal and escape detection.
//!
//! Everything here is lexical: sandbox filesystems may be remote, so no
//! `stat`/`canonicalize` is possible. Paths use `/` as the only separator.
//! Containment is decided on segment lists, never on raw string prefixes,
//! otherwise `/workspace/proj1x` would pass a check meant for
//! `/workspace/proj1`.

use crate::model::{SafetyVerdict, SandboxPath, UnsafeReason};

pub const SEPARATOR: char = '/';

/// Non-empty segments of `path`, in order.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Join segments into an absolute path. No segments yields `/`.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    if segments.is_empty() {
        return SEPARATOR.to_string();
    }
    let mut out = String::new();
    for segment in segments {
        out.push(SEPARATOR);
        out.push_str(segment.as_ref());
    }
    out
}

/// Resolve `.`, `..` and redundant separators, treating `path` as absolute.
/// `..` at the filesystem root stays at the root.
pub fn normalize_absolute(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in segments(path) {
        match segment {
            "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }
    join_segments(&stack)
}

/// Segments of tool input relative to `workspace`. A leading separator
/// carries no meaning, and leading copies of the workspace segments are
/// dropped, so `/workspace/p/a`, `workspace/p/a`, `/a` and `a` all land on
/// `<workspace>/a`. `.` and `..` are kept for the caller to resolve.
pub fn workspace_relative<'a>(raw: &'a str, workspace: &str) -> Vec<&'a str> {
    let prefix: Vec<&str> = segments(workspace).collect();
    let mut rest: Vec<&str> = segments(raw).collect();
    if prefix.is_empty() {
        return rest;
    }
    while rest.starts_with(&prefix) {
        rest.drain(..prefix.len());
    }
    rest
}

/// Resolve `raw` against `base`. Absolute inputs keep their absolute meaning.
pub fn resolve_lexically(base: &str, raw: &str) -> String {
    if raw.starts_with(SEPARATOR) {
        normalize_absolute(raw)
    } else {
        let mut joined = String::with_capacity(base.len() + raw.len() + 1);
        joined.push_str(base);
        joined.push(SEPARATOR);
        joined.push_str(raw);
        normalize_absolute(&joined)
    }
}

/// True iff the segment list of `root` is a leading sublist of the segment
/// list of `candidate` (equality included). Both sides are normalized first.
pub fn is_within(candidate: &str, root: &str) -> bool {
    let candidate = normalize_absolute(candidate);
    let root = normalize_absolute(root);
    let mut candidate_segments = segments(&candidate);
    segments(&root).all(|r| candidate_segments.next() == Some(r))
}

/// Judge an already-normalized `resolved` path against `boundary`.
/// `raw` is the untrusted input it came from.
pub fn check(raw: &str, resolved: SandboxPath, boundary: &SandboxPath) -> SafetyVerdict {
    let reason = if raw.contains('\0') {
        Some(UnsafeReason::NulByte)
    } else if !is_within(resolved.as_str(), boundary.as_str()) {
        Some(UnsafeReason::EscapesWorkspace)
    } else {
        None
    };
    SafetyVerdict::new(resolved, boundary.clone(), reason)
}

