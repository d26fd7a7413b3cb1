//! Sandbox workspace paths
//!
//! Resolves and validates the paths that sandbox tools operate on, so the
//! same tool code runs against a shared-root remote sandbox and a
//! per-project local one. Everything in this crate is pure: no I/O, no
//! global state, no locking.

pub mod accessor;
pub mod config;
pub mod error;
pub mod model;
pub mod safety;
pub mod settings;
pub mod strategy;

pub use accessor::ToolPathAccessor;
pub use config::{WorkspaceConfig, sanitize_filename};
pub use error::{SettingsError, WorkspaceError};
pub use model::{
    BaseRoot, ProjectId, ProviderMode, SafetyVerdict, SandboxPath, UnsafeReason,
    DEFAULT_WORKSPACE_ROOT,
};
pub use settings::Settings;
pub use strategy::{
    Layout, PerProjectRootStrategy, ProviderStrategy, SharedRootStrategy, Strategy,
};
