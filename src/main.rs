//! sandbox-ws: workspace path resolution for sandbox tools
//!
//! Computes where a project's files live inside a sandbox and whether a
//! tool-supplied path stays inside its workspace. One-shot commands print
//! JSON to stdout; `serve` exposes the same operations plus file transfer
//! as JSON-RPC 2.0 over stdio.
//!
//! Usage:
//!   sandbox-ws paths proj1                            # Layout for a project
//!   sandbox-ws check proj1 ../proj2/x                 # Exit code 1 when unsafe
//!   sandbox-ws --provider local_process resolve proj1 notes.md
//!   sandbox-ws serve --host-root /srv/sandbox         # JSON-RPC on stdin/stdout

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sbx_core::settings::{ENV_PROVIDER, ENV_WORKSPACE_ROOT};
use sbx_core::{ProjectId, Settings, ToolPathAccessor, WorkspaceConfig};
use sbx_server::{SandboxServer, serve_stdio};
use sbx_services::file::FileService;
use sbx_services::fs::LocalFs;
use sbx_services::workspace::WorkspaceService;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sandbox-ws", about = "Sandbox workspace path resolution and safety checks")]
struct Cli {
    /// Base root every workspace is derived from [default: /workspace]
    #[arg(long, global = true, env = ENV_WORKSPACE_ROOT)]
    workspace_root: Option<String>,

    /// Sandbox provider: daytona (shared root) or local_process (per-project root) [default: daytona]
    #[arg(long, global = true, env = ENV_PROVIDER)]
    provider: Option<String>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Write logs to a file (defaults to ~/.sandbox-ws/logs/sandbox-ws.log if no path given)
    #[arg(long, global = true, default_missing_value = "DEFAULT", num_args = 0..=1)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the workspace path and project directory of a project
    Paths { project: String },

    /// Lexically resolve a path against the project's workspace
    Normalize { project: String, path: String },

    /// Check whether a path stays inside the project's workspace
    Check { project: String, path: String },

    /// Clean and resolve a tool path, failing when it escapes
    Resolve { project: String, path: String },

    /// Print the upload target for a filename
    UploadPath { project: String, filename: String },

    /// Serve JSON-RPC requests on stdin/stdout
    Serve {
        /// Host directory backing the sandbox base root
        #[arg(long)]
        host_root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr or a file. stdout carries command output and JSON-RPC.
fn init_tracing(verbose: bool, log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let Some(log_file_arg) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    };

    let log_path = if log_file_arg == "DEFAULT" {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".sandbox-ws/logs/sandbox-ws.log")
    } else {
        PathBuf::from(log_file_arg)
    };

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    eprintln!("Logging to {}", log_path.display());
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Flags and environment are already merged by clap; unset values take defaults.
    let settings = Settings::from_lookup(|key| match key {
        ENV_WORKSPACE_ROOT => cli.workspace_root.clone(),
        ENV_PROVIDER => cli.provider.clone(),
        _ => None,
    })
    .context("Invalid workspace configuration")?;
    let config = Arc::new(WorkspaceConfig::from_settings(&settings));

    let accessor = |project: &str| -> anyhow::Result<ToolPathAccessor> {
        let id = ProjectId::new(project)?;
        Ok(ToolPathAccessor::new(config.clone(), id))
    };

    match cli.command {
        Command::Paths { project } => {
            let accessor = accessor(&project)?;
            print_json(&json!({
                "projectId": accessor.project_id(),
                "workspacePath": accessor.workspace_path(),
                "projectDirectory": accessor.project_directory(),
                "mode": config.mode(),
                "provider": config.mode().provider_name(),
            }))?;
        }

        Command::Normalize { project, path } => {
            let id = ProjectId::new(&project)?;
            let normalized = config.normalize_path(&path, &id);
            print_json(&json!({ "path": normalized }))?;
        }

        Command::Check { project, path } => {
            let verdict = accessor(&project)?.is_path_safe(&path);
            print_json(&json!({
                "safe": verdict.is_safe(),
                "path": verdict.path(),
                "boundary": verdict.boundary(),
                "reason": verdict.reason(),
            }))?;
            if !verdict.is_safe() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Resolve { project, path } => {
            let accessor = accessor(&project)?;
            let cleaned = accessor.clean_path(&path);
            let resolved = accessor.resolve_path(&cleaned)?;
            print_json(&json!({ "path": resolved, "cleaned": cleaned }))?;
        }

        Command::UploadPath { project, filename } => {
            let target = accessor(&project)?.upload_path(&filename)?;
            print_json(&json!({ "path": target }))?;
        }

        Command::Serve { host_root } => serve(config.clone(), host_root).await?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn serve(config: Arc<WorkspaceConfig>, host_root: PathBuf) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&host_root)
        .await
        .with_context(|| format!("Failed to create host root {}", host_root.display()))?;
    let host_root = host_root.canonicalize().unwrap_or(host_root);

    info!("Sandbox root {} backed by {}", config.base_root(), host_root.display());
    let fs = Arc::new(LocalFs::new(config.base_root(), host_root));

    let mut server = SandboxServer::new(config.clone());
    server.register_service(WorkspaceService::new(config.clone(), fs.clone()));
    server.register_service(FileService::new(config, fs));
    server
        .initialize()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize services: {e}"))?;

    let served = serve_stdio(&server).await;
    server.shutdown().await;

    let responses = served.context("stdio transport failed")?;
    info!("Served {responses} requests");
    Ok(())
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
