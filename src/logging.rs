use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Used when RUST_LOG is unset
pub const DEFAULT_FILTER: &str = "promptmaster=info,promptmaster_core=info,reqwest=warn,hyper=warn";

/// Log to a file; the terminal belongs to the TUI
pub fn init() -> Result<PathBuf> {
    let log_dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("promptmaster");
    let (file, log_path) = open_log_file(&log_dir)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!(path = ?log_path, "Logging initialized");
    Ok(log_path)
}

fn open_log_file(log_dir: &Path) -> Result<(File, PathBuf)> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Could not create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join("promptmaster.log");
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
        .with_context(|| format!("Could not open log file {}", log_path.display()))?;
    Ok((file, log_path))
}
