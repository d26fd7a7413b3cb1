//! Method name constants, grouped by namespace.
//!
//! Each constant is the exact string sent as the `method` field of a
//! request.

pub struct Methods;

impl Methods {
    // ── Workspace ───────────────────────────────────────────────────────
    pub const WORKSPACE_PATHS: &str = "workspace/paths";
    pub const WORKSPACE_UPLOAD_PATH: &str = "workspace/uploadPath";
    pub const WORKSPACE_NORMALIZE: &str = "workspace/normalize";
    pub const WORKSPACE_IS_SAFE: &str = "workspace/isSafe";
    pub const WORKSPACE_RESOLVE: &str = "workspace/resolve";
    pub const WORKSPACE_ENSURE: &str = "workspace/ensure";

    // ── File ────────────────────────────────────────────────────────────
    pub const FILE_UPLOAD: &str = "file/upload";
    pub const FILE_WRITE: &str = "file/write";
    pub const FILE_READ: &str = "file/read";
    pub const FILE_LIST: &str = "file/list";
    pub const FILE_DELETE: &str = "file/delete";
    pub const FILE_INFO: &str = "file/info";
}

/// Returns true if the given string is a known method.
pub fn is_known_method(method: &str) -> bool {
    matches!(
        method,
        Methods::WORKSPACE_PATHS
            | Methods::WORKSPACE_UPLOAD_PATH
            | Methods::WORKSPACE_NORMALIZE
            | Methods::WORKSPACE_IS_SAFE
            | Methods::WORKSPACE_RESOLVE
            | Methods::WORKSPACE_ENSURE
            | Methods::FILE_UPLOAD
            | Methods::FILE_WRITE
            | Methods::FILE_READ
            | Methods::FILE_LIST
            | Methods::FILE_DELETE
            | Methods::FILE_INFO
    )
}
