//! Log file setup
//!
//! The terminal belongs to the TUI, so tracing output goes to a file instead
//! of stderr. `RUST_LOG` overrides the default `info` filter.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

/// Log file name inside the platform data directory
pub const LOG_FILE_NAME: &str = "trafficdash.log";

/// Default log location, e.g. `~/.local/share/trafficdash/trafficdash.log`
///
/// Returns `None` when no home directory can be determined.
pub fn default_log_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "trafficdash")?;
    Some(project_dirs.data_dir().join(LOG_FILE_NAME))
}

/// Opens `path` for appending, creating parent directories as needed
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global tracing subscriber writing to `path`
///
/// Errors if the file cannot be opened or a subscriber is already installed.
pub fn init_logging(path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = open_log_file(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()?;

    tracing::info!(path = %path.display(), "Logging initialised");
    Ok(())
}
