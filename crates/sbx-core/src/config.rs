//! Workspace configuration: layout derivation and safety checks.

use tracing::debug;

use crate::error::{Result, WorkspaceError};
use crate::model::{BaseRoot, ProjectId, ProviderMode, SafetyVerdict, SandboxPath};
use crate::safety;
use crate::settings::Settings;
use crate::strategy::{Layout, ProviderStrategy, Strategy};

/// Immutable configuration shared by every tool invocation.
///
/// Built once at process start and passed around (usually as
/// `Arc<WorkspaceConfig>`). All operations are pure functions of the base
/// root, the provider mode and their arguments, so the value can be used
/// from any number of tasks without locking.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    root: BaseRoot,
    strategy: Strategy,
}

impl WorkspaceConfig {
    pub fn new(root: BaseRoot, mode: ProviderMode) -> Self {
        debug!("WorkspaceConfig initialized: root={root}, provider={mode}");
        Self {
            root,
            strategy: Strategy::for_mode(mode),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.workspace_root.clone(), settings.provider)
    }

    pub fn base_root(&self) -> &BaseRoot {
        &self.root
    }

    pub fn mode(&self) -> ProviderMode {
        self.strategy.mode()
    }

    pub fn layout(&self, project_id: &ProjectId) -> Layout {
        self.strategy.layout(&self.root, project_id)
    }

    /// Directory the tool may operate in.
    ///
    /// Shared root: `<root>`. Per-project root: `<root>/<project>`.
    pub fn get_project_workspace_path(&self, project_id: &ProjectId) -> SandboxPath {
        self.layout(project_id).workspace_path
    }

    /// Directory the project's files are stored in. Always inside the
    /// workspace path.
    pub fn get_project_directory_path(&self, project_id: &ProjectId) -> SandboxPath {
        self.layout(project_id).project_directory
    }

    /// Target path for an uploaded file. Any directory part of `filename` is
    /// discarded, so uploads always land directly in the project directory.
    pub fn get_file_upload_path(&self, project_id: &ProjectId, filename: &str) -> Result<SandboxPath> {
        let name = sanitize_filename(filename)?;
        let project_dir = self.get_project_directory_path(project_id);
        let target = project_dir.child(name);
        if !target.starts_with(&project_dir) {
            return Err(WorkspaceError::path_escape(target.as_str(), project_dir.as_str()));
        }
        Ok(target)
    }

    /// Lexically resolve `raw_path` against the project's workspace path.
    ///
    /// Absolute and relative inputs are both taken relative to the workspace;
    /// a leading copy of the workspace path is dropped first (see
    /// [`safety::workspace_relative`]). Never fails and never touches a
    /// filesystem. `..` can still climb out of the workspace; use
    /// [`WorkspaceConfig::is_path_safe`] or
    /// [`WorkspaceConfig::resolve_absolute_path`] to decide.
    pub fn normalize_path(&self, raw_path: &str, project_id: &ProjectId) -> SandboxPath {
        rebase(&self.get_project_workspace_path(project_id), raw_path)
    }

    pub fn is_path_safe(&self, raw_path: &str, project_id: &ProjectId) -> SafetyVerdict {
        let boundary = self.get_project_workspace_path(project_id);
        let resolved = rebase(&boundary, raw_path);
        let verdict = safety::check(raw_path, resolved, &boundary);
        if let Some(reason) = verdict.reason() {
            debug!("Unsafe path for project {project_id}: {raw_path:?} -> {} ({reason})", verdict.path());
        }
        verdict
    }

    /// Normalize and verify in one step; escaping input is an error.
    pub fn resolve_absolute_path(&self, raw_path: &str, project_id: &ProjectId) -> Result<SandboxPath> {
        self.is_path_safe(raw_path, project_id).into_result()
    }
}

fn rebase(workspace: &SandboxPath, raw_path: &str) -> SandboxPath {
    let relative = safety::workspace_relative(raw_path, workspace.as_str()).join("/");
    workspace.resolve(&relative)
}

/// Reduce an upload name to its final segment. Both `/` and `\` count as
/// separators here since the name comes from arbitrary clients.
pub fn sanitize_filename(filename: &str) -> Result<&str> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err(WorkspaceError::invalid_filename(filename, "empty after stripping directories"));
    }
    if name == "." || name == ".." {
        return Err(WorkspaceError::invalid_filename(filename, "traversal token"));
    }
    if name.chars().any(char::is_control) {
        return Err(WorkspaceError::invalid_filename(filename, "contains control characters"));
    }
    Ok(name)
}
