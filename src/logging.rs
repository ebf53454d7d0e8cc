use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::http_cache::app_cache_dir;

const LOG_FILE: &str = "h2h_terminal.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Batch binaries log to stderr.
pub fn init_stderr() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .try_init();
}

/// The terminal UI owns stdout/stderr, so it logs to a file in the cache dir.
/// Returns the console line describing where logs go; without a cache dir the
/// UI keeps running with file logging off.
pub fn init_file() -> String {
    match open_log_file(app_cache_dir()) {
        Ok((path, file)) => {
            let _ = fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
            format!("[INFO] Logging to {}", path.display())
        }
        Err(err) => format!("[WARN] File logging disabled: {err:#}"),
    }
}

fn open_log_file(dir: Option<PathBuf>) -> Result<(PathBuf, File)> {
    let dir = dir.context("no cache dir for log file")?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    Ok((path, file))
}
