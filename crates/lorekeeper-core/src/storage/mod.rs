mod config;
pub mod memory;
pub mod timeline_db;

pub use config::Config;
pub use memory::MemoryStore;
pub use timeline_db::{StoredNode, TimelineDb};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/lorekeeper[-dev]/` based on LOREKEEPER_ENV.
///
/// Set LOREKEEPER_ENV=dev to use the development data directory, or
/// LOREKEEPER_HOME to point at an explicit directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("LOREKEEPER_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("LOREKEEPER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("lorekeeper-dev")
            } else {
                base_dir.join("lorekeeper")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
