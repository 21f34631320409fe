//! Default paths for tutorhub components
//!
//! Paths are user-writable by default (no root required):
//! - Socket: `$XDG_RUNTIME_DIR/tutorhub/tutorhubd.sock` or `/tmp/tutorhub-$USER/tutorhubd.sock`
//! - Data: `$XDG_DATA_HOME/tutorhub` or `~/.local/share/tutorhub`
//! - Config: `$XDG_CONFIG_HOME/tutorhub/config.toml` or `~/.config/tutorhub/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const TUTORHUB_SOCKET_ENV: &str = "TUTORHUB_SOCKET";

/// Environment variable for overriding the data directory
pub const TUTORHUB_DATA_DIR_ENV: &str = "TUTORHUB_DATA_DIR";

/// Socket filename within the socket directory
const SOCKET_FILENAME: &str = "tutorhubd.sock";

/// Application subdirectory name
const APP_DIR: &str = "tutorhub";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$TUTORHUB_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/tutorhub/tutorhubd.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/tutorhub-$USER/tutorhubd.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(TUTORHUB_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking the TUTORHUB_SOCKET env var.
/// Used for default values in configs where the env var is checked separately.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$TUTORHUB_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/tutorhub` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/tutorhub` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(TUTORHUB_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the TUTORHUB_DATA_DIR env var.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default configuration file path.
///
/// `$XDG_CONFIG_HOME/tutorhub/config.toml` or `~/.config/tutorhub/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    PathBuf::from("/etc").join(APP_DIR).join("config.toml")
}
