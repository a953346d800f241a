use std::path::{Path, PathBuf};

use tracing::debug;

use crate::store::JsonConfigStore;

/// Shared config document, relative to the data directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Relay counters, relative to the data directory.
pub const STATS_FILENAME: &str = "telegram_stats.json";

/// Resolved on-disk locations for the relay's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayPaths {
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub stats_file: PathBuf,
}

impl RelayPaths {
    /// Resolve paths under `data_dir`, defaulting to the working directory.
    pub fn resolve(data_dir: Option<&Path>) -> Self {
        let data_dir = data_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let paths = Self {
            config_file: data_dir.join(CONFIG_FILENAME),
            stats_file: data_dir.join(STATS_FILENAME),
            data_dir,
        };
        debug!(
            config = %paths.config_file.display(),
            stats = %paths.stats_file.display(),
            "resolved relay paths"
        );
        paths
    }

    /// Config store bound to the shared document.
    pub fn config_store(&self) -> JsonConfigStore {
        JsonConfigStore::new(&self.config_file)
    }
}
