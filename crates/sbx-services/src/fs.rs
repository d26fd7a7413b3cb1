//! Sandbox filesystem collaborator.
//!
//! Providers implement [`SandboxFs`]; this repository only ever hands it
//! paths that already passed the workspace safety check. [`LocalFs`] is the
//! local-process implementation, mapping the sandbox root onto a host
//! directory.

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use sbx_core::{BaseRoot, SandboxPath};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("{path}: no such file or directory")]
    NotFound { path: String },

    #[error("{path} is outside the sandbox root")]
    OutsideRoot { path: String },

    #[error("failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    fn io(op: &'static str, path: &SandboxPath, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path: path.to_string() }
        } else {
            Self::Io { op, path: path.to_string(), source }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata as reported by a shared-root (remote) sandbox.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFileInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    /// Remote timestamp, passed through verbatim.
    pub mod_time: String,
    pub permissions: Option<String>,
}

/// Metadata as reported by a local sandbox.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFileInfo {
    /// Path relative to the sandbox root.
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// File metadata from either provider family. Downstream code branches on
/// the variant, never on which fields happen to be present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "provider", rename_all = "camelCase")]
pub enum FileInfo {
    Shared(SharedFileInfo),
    Local(LocalFileInfo),
}

impl FileInfo {
    pub fn shared(
        name: impl Into<String>,
        is_dir: bool,
        size: u64,
        mod_time: impl Into<String>,
        permissions: Option<String>,
    ) -> Self {
        Self::Shared(SharedFileInfo {
            name: name.into(),
            is_dir,
            size,
            mod_time: mod_time.into(),
            permissions,
        })
    }

    pub fn local(name: impl Into<String>, is_dir: bool, size: u64, modified: DateTime<Utc>) -> Self {
        Self::Local(LocalFileInfo {
            name: name.into(),
            is_dir,
            size,
            modified,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Shared(info) => &info.name,
            Self::Local(info) => &info.name,
        }
    }

    /// Last segment of [`FileInfo::name`]. Local names are root-relative
    /// paths, shared names are already bare.
    pub fn base_name(&self) -> &str {
        let name = self.name();
        name.rsplit('/').find(|s| !s.is_empty()).unwrap_or(name)
    }

    pub fn is_dir(&self) -> bool {
        match self {
            Self::Shared(info) => info.is_dir,
            Self::Local(info) => info.is_dir,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Self::Shared(info) => info.size,
            Self::Local(info) => info.size,
        }
    }
}

/// Provider-neutral listing entry returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    pub mod_time: String,
    pub permissions: Option<String>,
}

impl FileEntry {
    /// Entry for `info` listed inside `dir`.
    pub fn from_info(dir: &SandboxPath, info: &FileInfo) -> Self {
        let name = info.base_name().to_string();
        let path = dir.resolve(&name).to_string();
        let (mod_time, permissions) = match info {
            FileInfo::Shared(s) => (s.mod_time.clone(), s.permissions.clone()),
            FileInfo::Local(l) => (l.modified.to_rfc3339(), None),
        };
        Self {
            name,
            path,
            is_dir: info.is_dir(),
            size: info.size(),
            mod_time,
            permissions,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator interface
// ─────────────────────────────────────────────────────────────────────────────

pub trait SandboxFs: Send + Sync {
    fn upload_file(
        &self,
        content: &[u8],
        path: &SandboxPath,
    ) -> impl std::future::Future<Output = Result<(), FsError>> + Send;

    fn download_file(
        &self,
        path: &SandboxPath,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, FsError>> + Send;

    fn list_files(
        &self,
        path: &SandboxPath,
    ) -> impl std::future::Future<Output = Result<Vec<FileInfo>, FsError>> + Send;

    fn delete_file(
        &self,
        path: &SandboxPath,
    ) -> impl std::future::Future<Output = Result<(), FsError>> + Send;

    fn get_file_info(
        &self,
        path: &SandboxPath,
    ) -> impl std::future::Future<Output = Result<FileInfo, FsError>> + Send;

    fn create_folder(
        &self,
        path: &SandboxPath,
    ) -> impl std::future::Future<Output = Result<(), FsError>> + Send;
}

// ─────────────────────────────────────────────────────────────────────────────
// Local implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Local-process sandbox filesystem backed by `tokio::fs`.
///
/// Sandbox path `<root>/a/b` lives at `<host_root>/a/b`. Paths outside the
/// sandbox root are refused.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: SandboxPath,
    host_root: PathBuf,
}

impl LocalFs {
    pub fn new(root: &BaseRoot, host_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.path().clone(),
            host_root: host_root.into(),
        }
    }

    /// Host location of a sandbox path. Each segment must be a single plain
    /// component on the host too (a `\` segment is a separator on Windows).
    pub fn host_path(&self, path: &SandboxPath) -> Result<PathBuf, FsError> {
        let outside = || FsError::OutsideRoot { path: path.to_string() };
        let relative = path.strip_prefix(&self.root).ok_or_else(outside)?;

        let mut host = self.host_root.clone();
        for segment in relative {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => host.push(segment),
                _ => return Err(outside()),
            }
        }
        Ok(host)
    }

    fn info_for(&self, path: &SandboxPath, meta: &Metadata) -> FileInfo {
        let name = path
            .strip_prefix(&self.root)
            .map(|segments| segments.join("/"))
            .unwrap_or_else(|| path.to_string());
        let modified = meta.modified().map(DateTime::<Utc>::from).unwrap_or_default();
        FileInfo::local(name, meta.is_dir(), meta.len(), modified)
    }
}

impl SandboxFs for LocalFs {
    async fn upload_file(&self, content: &[u8], path: &SandboxPath) -> Result<(), FsError> {
        let host = self.host_path(path)?;
        if let Some(parent) = host.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FsError::io("create directory for", path, e))?;
        }
        tokio::fs::write(&host, content)
            .await
            .map_err(|e| FsError::io("write", path, e))?;
        debug!("Uploaded {} bytes to {path}", content.len());
        Ok(())
    }

    async fn download_file(&self, path: &SandboxPath) -> Result<Vec<u8>, FsError> {
        let host = self.host_path(path)?;
        tokio::fs::read(&host).await.map_err(|e| FsError::io("read", path, e))
    }

    async fn list_files(&self, path: &SandboxPath) -> Result<Vec<FileInfo>, FsError> {
        let host = self.host_path(path)?;
        let exists = tokio::fs::try_exists(&host)
            .await
            .map_err(|e| FsError::io("list", path, e))?;
        if !exists {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&host)
            .await
            .map_err(|e| FsError::io("list", path, e))?;
        let mut infos = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FsError::io("list", path, e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let child = path.resolve(&name);
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                // Removed between read_dir and stat.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(FsError::io("stat", &child, e)),
            };
            infos.push(self.info_for(&child, &meta));
        }
        infos.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(infos)
    }

    async fn delete_file(&self, path: &SandboxPath) -> Result<(), FsError> {
        let host = self.host_path(path)?;
        match tokio::fs::metadata(&host).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&host)
                .await
                .map_err(|e| FsError::io("delete directory", path, e)),
            Ok(_) => tokio::fs::remove_file(&host)
                .await
                .map_err(|e| FsError::io("delete", path, e)),
            // Already gone.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsError::io("stat", path, e)),
        }
    }

    async fn get_file_info(&self, path: &SandboxPath) -> Result<FileInfo, FsError> {
        let host = self.host_path(path)?;
        let meta = tokio::fs::metadata(&host)
            .await
            .map_err(|e| FsError::io("stat", path, e))?;
        Ok(self.info_for(path, &meta))
    }

    async fn create_folder(&self, path: &SandboxPath) -> Result<(), FsError> {
        let host = self.host_path(path)?;
        tokio::fs::create_dir_all(&host)
            .await
            .map_err(|e| FsError::io("create directory", path, e))
    }
}
