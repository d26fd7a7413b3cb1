//! Process-start configuration.
//!
//! Read once, turned into a [`crate::WorkspaceConfig`], and never consulted
//! again. Nothing in this crate reads the environment on its own.

use crate::error::SettingsError;
use crate::model::{BaseRoot, ProviderMode};

pub const ENV_WORKSPACE_ROOT: &str = "SANDBOX_WORKSPACE_ROOT";
pub const ENV_PROVIDER: &str = "SANDBOX_PROVIDER";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub workspace_root: BaseRoot,
    pub provider: ProviderMode,
}

impl Settings {
    /// Look up `SANDBOX_WORKSPACE_ROOT` and `SANDBOX_PROVIDER` through
    /// `lookup`, falling back to `/workspace` and `daytona` when unset or
    /// blank. The binary passes values already merged from flags and env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let workspace_root = match lookup(ENV_WORKSPACE_ROOT) {
            Some(raw) if !raw.trim().is_empty() => BaseRoot::new(&raw)?,
            _ => BaseRoot::default(),
        };
        let provider = match lookup(ENV_PROVIDER) {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => ProviderMode::default(),
        };
        Ok(Self { workspace_root, provider })
    }
}
