//! File service: sandbox file transfer behind the workspace safety check.
//!
//! Every client path is decoded, cleaned and resolved through a
//! [`ToolPathAccessor`] before the filesystem collaborator sees it.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sbx_core::{SandboxPath, ToolPathAccessor, WorkspaceConfig, sanitize_filename};
use sbx_protocol::{HandlerResult, Methods, RpcError};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::Service;
use crate::fs::{FileEntry, SandboxFs};
use crate::params::{decode_request_path, fs_error, parse_params, project_id, workspace_error};

pub struct FileService<F> {
    config: Arc<WorkspaceConfig>,
    fs: Arc<F>,
}

impl<F: SandboxFs> FileService<F> {
    pub fn new(config: Arc<WorkspaceConfig>, fs: Arc<F>) -> Self {
        Self { config, fs }
    }

    fn accessor(&self, raw_project_id: &str) -> Result<ToolPathAccessor, RpcError> {
        Ok(ToolPathAccessor::new(self.config.clone(), project_id(raw_project_id)?))
    }

    /// Decode, clean and verify a client path.
    fn guard(&self, accessor: &ToolPathAccessor, raw: &str) -> Result<SandboxPath, RpcError> {
        let decoded = decode_request_path(raw);
        let cleaned = accessor.clean_path(&decoded);
        accessor.resolve_path(&cleaned).map_err(|e| {
            warn!("Rejected path for project {}: {raw:?} ({e})", accessor.project_id());
            workspace_error(e)
        })
    }
}

impl<F: SandboxFs> Service for FileService<F> {
    fn namespace(&self) -> &str {
        "file"
    }

    async fn handle(&self, method: &str, params: Option<serde_json::Value>) -> HandlerResult {
        match method {
            Methods::FILE_UPLOAD => {
                let p: UploadParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let path = match p.path.as_deref() {
                    Some(dir) if !dir.trim().is_empty() => {
                        let dir = self.guard(&accessor, dir)?;
                        let name = sanitize_filename(&p.filename).map_err(workspace_error)?;
                        let target = dir.resolve(name);
                        accessor.resolve_path(target.as_str()).map_err(workspace_error)?
                    }
                    _ => accessor.upload_path(&p.filename).map_err(workspace_error)?,
                };
                let content = p.encoding.decode(&p.content)?;

                self.fs.upload_file(&content, &path).await.map_err(fs_error)?;
                debug!("File created at {path} for project {}", accessor.project_id());
                Ok(json!({ "status": "success", "created": true, "path": path }))
            }

            Methods::FILE_WRITE => {
                let p: WriteParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let path = self.guard(&accessor, &p.path)?;
                let content = p.encoding.decode(&p.content)?;

                self.fs.upload_file(&content, &path).await.map_err(fs_error)?;
                debug!("File updated at {path} for project {}", accessor.project_id());
                Ok(json!({ "status": "success", "updated": true, "path": path }))
            }

            Methods::FILE_READ => {
                let p: ReadParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let path = self.guard(&accessor, &p.path)?;

                let bytes = self.fs.download_file(&path).await.map_err(fs_error)?;
                let (content, encoding) = match p.encoding {
                    ContentEncoding::Utf8 => match String::from_utf8(bytes) {
                        Ok(text) => (text, ContentEncoding::Utf8),
                        Err(e) => (BASE64.encode(e.into_bytes()), ContentEncoding::Base64),
                    },
                    ContentEncoding::Base64 => (BASE64.encode(bytes), ContentEncoding::Base64),
                };
                Ok(json!({
                    "path": path,
                    "filename": path.file_name(),
                    "content": content,
                    "encoding": encoding.as_str(),
                }))
            }

            Methods::FILE_LIST => {
                let p: PathParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let path = self.guard(&accessor, &p.path)?;

                let infos = self.fs.list_files(&path).await.map_err(fs_error)?;
                let entries: Vec<FileEntry> = infos
                    .iter()
                    .map(|info| FileEntry::from_info(&path, info))
                    .collect();
                Ok(json!({ "path": path, "files": entries }))
            }

            Methods::FILE_DELETE => {
                let p: PathParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let path = self.guard(&accessor, &p.path)?;

                if &path == accessor.workspace_path() {
                    return Err(RpcError::invalid_params(format!(
                        "Refusing to delete workspace root {path}"
                    )));
                }

                self.fs.delete_file(&path).await.map_err(fs_error)?;
                debug!("File deleted at {path} for project {}", accessor.project_id());
                Ok(json!({ "status": "success", "deleted": true, "path": path }))
            }

            Methods::FILE_INFO => {
                let p: PathParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let path = self.guard(&accessor, &p.path)?;

                let info = self.fs.get_file_info(&path).await.map_err(fs_error)?;
                let entry = path
                    .parent()
                    .map(|parent| FileEntry::from_info(&parent, &info));
                Ok(json!({ "path": path, "info": info, "entry": entry }))
            }

            _ => Err(RpcError::method_not_found(method)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
enum ContentEncoding {
    #[default]
    Utf8,
    Base64,
}

impl ContentEncoding {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Base64 => "base64",
        }
    }

    fn decode(&self, content: &str) -> Result<Vec<u8>, RpcError> {
        match self {
            Self::Utf8 => Ok(content.as_bytes().to_vec()),
            Self::Base64 => BASE64
                .decode(content)
                .map_err(|e| RpcError::invalid_params(format!("Invalid base64 content: {e}"))),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathParams {
    project_id: String,
    path: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadParams {
    project_id: String,
    path: String,
    #[serde(default)]
    encoding: ContentEncoding,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteParams {
    project_id: String,
    path: String,
    content: String,
    #[serde(default)]
    encoding: ContentEncoding,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadParams {
    project_id: String,
    /// Target directory; the project directory when absent.
    #[serde(default)]
    path: Option<String>,
    filename: String,
    content: String,
    #[serde(default)]
    encoding: ContentEncoding,
}
