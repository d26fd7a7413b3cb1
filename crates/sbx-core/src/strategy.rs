//! Provider-specific directory layout.

use crate::model::{BaseRoot, ProjectId, ProviderMode, SandboxPath};

/// Workspace path and project directory of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub workspace_path: SandboxPath,
    pub project_directory: SandboxPath,
}

/// Computes where a project lives under a base root.
///
/// Implementations are pure and total: the project id has already been
/// validated by construction, so joining it always yields one child segment.
pub trait ProviderStrategy: Send + Sync + std::fmt::Debug {
    fn mode(&self) -> ProviderMode;

    fn layout(&self, root: &BaseRoot, project_id: &ProjectId) -> Layout;
}

/// Remote sandboxes share one filesystem namespace, so projects are kept
/// apart by subdirectory: the tool works from the shared root and stores
/// project files in `<root>/<project>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedRootStrategy;

impl ProviderStrategy for SharedRootStrategy {
    fn mode(&self) -> ProviderMode {
        ProviderMode::SharedRoot
    }

    fn layout(&self, root: &BaseRoot, project_id: &ProjectId) -> Layout {
        Layout {
            workspace_path: root.path().clone(),
            project_directory: root.path().child(project_id.as_str()),
        }
    }
}

/// Local sandboxes have no namespace of their own; `<root>/<project>` is both
/// the working directory and the storage area.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerProjectRootStrategy;

impl ProviderStrategy for PerProjectRootStrategy {
    fn mode(&self) -> ProviderMode {
        ProviderMode::PerProjectRoot
    }

    fn layout(&self, root: &BaseRoot, project_id: &ProjectId) -> Layout {
        let workspace_path = root.path().child(project_id.as_str());
        Layout {
            project_directory: workspace_path.clone(),
            workspace_path,
        }
    }
}

/// Strategy chosen once at startup from the configured [`ProviderMode`].
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    SharedRoot(SharedRootStrategy),
    PerProjectRoot(PerProjectRootStrategy),
}

impl Strategy {
    pub fn for_mode(mode: ProviderMode) -> Self {
        match mode {
            ProviderMode::SharedRoot => Self::SharedRoot(SharedRootStrategy),
            ProviderMode::PerProjectRoot => Self::PerProjectRoot(PerProjectRootStrategy),
        }
    }

    fn inner(&self) -> &dyn ProviderStrategy {
        match self {
            Self::SharedRoot(s) => s,
            Self::PerProjectRoot(s) => s,
        }
    }
}

impl ProviderStrategy for Strategy {
    fn mode(&self) -> ProviderMode {
        self.inner().mode()
    }

    fn layout(&self, root: &BaseRoot, project_id: &ProjectId) -> Layout {
        self.inner().layout(root, project_id)
    }
}
