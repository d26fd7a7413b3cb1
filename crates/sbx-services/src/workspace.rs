//! Workspace service: path layout, normalization and safety checks.

use std::sync::Arc;

use sbx_core::{ToolPathAccessor, WorkspaceConfig};
use sbx_protocol::{HandlerResult, Methods, RpcError};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::Service;
use crate::fs::SandboxFs;
use crate::params::{decode_request_path, fs_error, parse_params, project_id, workspace_error};

pub struct WorkspaceService<F> {
    config: Arc<WorkspaceConfig>,
    fs: Arc<F>,
}

impl<F: SandboxFs> WorkspaceService<F> {
    pub fn new(config: Arc<WorkspaceConfig>, fs: Arc<F>) -> Self {
        Self { config, fs }
    }

    fn accessor(&self, raw_project_id: &str) -> Result<ToolPathAccessor, RpcError> {
        Ok(ToolPathAccessor::new(self.config.clone(), project_id(raw_project_id)?))
    }
}

impl<F: SandboxFs> Service for WorkspaceService<F> {
    fn namespace(&self) -> &str {
        "workspace"
    }

    async fn handle(&self, method: &str, params: Option<serde_json::Value>) -> HandlerResult {
        match method {
            Methods::WORKSPACE_PATHS => {
                let p: ProjectParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                Ok(json!({
                    "projectId": accessor.project_id(),
                    "workspacePath": accessor.workspace_path(),
                    "projectDirectory": accessor.project_directory(),
                    "mode": self.config.mode(),
                    "provider": self.config.mode().provider_name(),
                }))
            }

            Methods::WORKSPACE_UPLOAD_PATH => {
                let p: UploadPathParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let path = accessor.upload_path(&p.filename).map_err(workspace_error)?;
                Ok(json!({ "path": path }))
            }

            Methods::WORKSPACE_NORMALIZE => {
                let p: PathParams = parse_params(params)?;
                let id = project_id(&p.project_id)?;
                let raw = decode_request_path(&p.path);
                let path = self.config.normalize_path(&raw, &id);
                Ok(json!({ "path": path }))
            }

            Methods::WORKSPACE_IS_SAFE => {
                let p: PathParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let raw = decode_request_path(&p.path);
                let verdict = accessor.is_path_safe(&raw);
                Ok(json!({
                    "safe": verdict.is_safe(),
                    "path": verdict.path(),
                    "boundary": verdict.boundary(),
                    "reason": verdict.reason(),
                }))
            }

            Methods::WORKSPACE_RESOLVE => {
                let p: PathParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let raw = decode_request_path(&p.path);
                let cleaned = accessor.clean_path(&raw);
                let path = accessor.resolve_path(&cleaned).map_err(workspace_error)?;
                Ok(json!({ "path": path, "cleaned": cleaned }))
            }

            Methods::WORKSPACE_ENSURE => {
                let p: ProjectParams = parse_params(params)?;
                let accessor = self.accessor(&p.project_id)?;
                let dir = accessor.project_directory();
                self.fs.create_folder(dir).await.map_err(fs_error)?;
                debug!("Ensured project directory exists: {dir}");
                Ok(json!({ "path": dir }))
            }

            _ => Err(RpcError::method_not_found(method)),
        }
    }

    async fn init(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            "Workspace service ready: root={}, provider={}",
            self.config.base_root(),
            self.config.mode()
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectParams {
    project_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathParams {
    project_id: String,
    path: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadPathParams {
    project_id: String,
    filename: String,
}
