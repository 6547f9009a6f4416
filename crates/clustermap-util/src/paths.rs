//! Default paths for clustermap components
//!
//! - Config: `$XDG_CONFIG_HOME/clustermap/config.toml` or `~/.config/clustermap/config.toml`
//! - Source databases: `$CLUSTERMAP_DATA_DIR` or `/var/lib/clustermap`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const CLUSTERMAP_DATA_DIR_ENV: &str = "CLUSTERMAP_DATA_DIR";

/// Application subdirectory name
const APP_DIR: &str = "clustermap";

/// Data directory used when `$CLUSTERMAP_DATA_DIR` is unset
const SYSTEM_DATA_DIR: &str = "/var/lib/clustermap";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Filename of the seat/session and host health database
pub const CLUSTER_DB_FILENAME: &str = "cluster.db";

/// Filename of the exam session database
pub const EXAM_DB_FILENAME: &str = "exam.db";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/clustermap/config.toml`
/// 2. `~/.config/clustermap/config.toml`
/// 3. `/etc/clustermap/config.toml` (no home directory)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory holding the source databases.
///
/// `$CLUSTERMAP_DATA_DIR` if set, otherwise `/var/lib/clustermap`.
pub fn default_data_dir() -> PathBuf {
    match std::env::var(CLUSTERMAP_DATA_DIR_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(SYSTEM_DATA_DIR),
    }
}
