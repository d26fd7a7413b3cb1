//! Request parameter helpers and error mapping shared by the services.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use sbx_core::{ProjectId, WorkspaceError};
use sbx_protocol::{RpcError, RpcErrorCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::fs::FsError;

static UNICODE_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").expect("unicode escape pattern compiles"));

pub(crate) fn parse_params<T: DeserializeOwned>(params: Option<serde_json::Value>) -> Result<T, RpcError> {
    match params {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| RpcError::invalid_params(format!("Invalid parameters: {e}"))),
        None => Err(RpcError::invalid_params("Parameters required")),
    }
}

pub(crate) fn project_id(raw: &str) -> Result<ProjectId, RpcError> {
    ProjectId::new(raw).map_err(workspace_error)
}

/// Undo transport encoding on a client-supplied path: percent-escapes
/// (`%C3%A4`) and literal `\uXXXX` sequences. Undecodable input is returned
/// unchanged; the result is still untrusted and goes through the safety
/// check like any other path.
pub fn decode_request_path(raw: &str) -> Cow<'_, str> {
    let decoded = match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!("Keeping undecodable path {raw:?}: {e}");
            Cow::Borrowed(raw)
        }
    };

    if !UNICODE_ESCAPE.is_match(&decoded) {
        return decoded;
    }
    let expanded = UNICODE_ESCAPE.replace_all(&decoded, |caps: &regex::Captures<'_>| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    Cow::Owned(expanded.into_owned())
}

pub fn workspace_error(err: WorkspaceError) -> RpcError {
    let message = err.to_string();
    match err {
        WorkspaceError::InvalidProjectId { id, .. } => {
            RpcError::new(RpcErrorCode::InvalidProjectId, message).with_data(json!({ "projectId": id }))
        }
        WorkspaceError::InvalidFilename { name, .. } => {
            RpcError::new(RpcErrorCode::InvalidFilename, message).with_data(json!({ "filename": name }))
        }
        WorkspaceError::PathEscape { path, boundary } => RpcError::new(RpcErrorCode::PathEscape, message)
            .with_data(json!({ "path": path, "boundary": boundary })),
    }
}

pub fn fs_error(err: FsError) -> RpcError {
    let data = match &err {
        FsError::NotFound { path } | FsError::OutsideRoot { path } | FsError::Io { path, .. } => {
            json!({ "path": path })
        }
    };
    RpcError::file_system(err.to_string()).with_data(data)
}
