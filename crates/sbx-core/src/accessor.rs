//! Per-invocation path helper for sandbox tools.

use std::sync::Arc;

use tracing::debug;

use crate::config::WorkspaceConfig;
use crate::error::Result;
use crate::model::{ProjectId, SafetyVerdict, SandboxPath};
use crate::safety;

/// Path facade bound to a single project for the lifetime of one tool call.
///
/// The workspace path and project directory are computed once at
/// construction and never change afterwards. Instances are cheap; build a new
/// one per invocation instead of sharing.
#[derive(Debug, Clone)]
pub struct ToolPathAccessor {
    config: Arc<WorkspaceConfig>,
    project_id: ProjectId,
    workspace_path: SandboxPath,
    project_directory: SandboxPath,
}

impl ToolPathAccessor {
    pub fn new(config: Arc<WorkspaceConfig>, project_id: ProjectId) -> Self {
        let layout = config.layout(&project_id);
        Self {
            config,
            project_id,
            workspace_path: layout.workspace_path,
            project_directory: layout.project_directory,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn workspace_path(&self) -> &SandboxPath {
        &self.workspace_path
    }

    pub fn project_directory(&self) -> &SandboxPath {
        &self.project_directory
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Cosmetic cleanup of tool input: trims whitespace, drops leading and
    /// redundant separators, and strips leading copies of the workspace path
    /// so `/workspace/a.txt` and `a.txt` clean the same way. Resolving the
    /// result lands where [`WorkspaceConfig::normalize_path`] puts the raw
    /// input.
    ///
    /// Not a security boundary. `..` survives and is judged by
    /// [`ToolPathAccessor::resolve_path`].
    pub fn clean_path(&self, user_input: &str) -> String {
        let cleaned = safety::workspace_relative(user_input.trim(), self.workspace_path.as_str()).join("/");
        debug!("Cleaned path: {user_input:?} -> {cleaned:?}");
        cleaned
    }

    /// Absolute, verified path for `cleaned`. Escaping input is refused.
    pub fn resolve_path(&self, cleaned: &str) -> Result<SandboxPath> {
        let resolved = self.config.normalize_path(cleaned, &self.project_id);
        safety::check(cleaned, resolved, &self.workspace_path).into_result()
    }

    pub fn is_path_safe(&self, user_input: &str) -> SafetyVerdict {
        self.config.is_path_safe(user_input, &self.project_id)
    }

    pub fn upload_path(&self, filename: &str) -> Result<SandboxPath> {
        self.config.get_file_upload_path(&self.project_id, filename)
    }
}
