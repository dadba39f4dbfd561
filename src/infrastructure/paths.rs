//! Filesystem locations for persisted state, logs and configuration.
//!
//! Directories follow the platform conventions reported by `dirs` (XDG on
//! Linux, `~/Library/Application Support` on macOS, `%APPDATA%` on Windows).
//! When the platform directory is unknown, a `.rentadmin` directory in the
//! working directory is used instead.

use std::path::PathBuf;

const APP_DIR: &str = "rentadmin";

/// Returns the data directory holding the persisted stores.
///
/// # Examples
///
/// ```
/// use rentadmin::infrastructure::data_dir;
///
/// assert!(data_dir().ends_with("rentadmin"));
/// ```
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".rentadmin"), |dir| dir.join(APP_DIR))
}

/// Default directory for the log and span files.
#[must_use]
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Store of the country and state selection.
#[must_use]
pub fn selection_file() -> PathBuf {
    data_dir().join("selection.json")
}

/// Store of pending upload bookkeeping.
#[must_use]
pub fn uploads_file() -> PathBuf {
    data_dir().join("uploads.json")
}

/// Default configuration file, read when `--config` is not given.
#[must_use]
pub fn config_file() -> PathBuf {
    dirs::config_dir().map_or_else(|| PathBuf::from(".rentadmin"), |dir| dir.join(APP_DIR)).join("config.toml")
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a tilde, and all paths when the home directory is unknown,
/// are returned unchanged.
///
/// # Examples
///
/// ```
/// use rentadmin::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/absolute/path"), std::path::PathBuf::from("/absolute/path"));
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return PathBuf::from(path);
    };
    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_the_data_dir() {
        assert!(selection_file().starts_with(data_dir()));
        assert_ne!(selection_file(), uploads_file());
        assert!(log_dir().starts_with(data_dir()));
        assert!(config_file().ends_with("rentadmin/config.toml"));
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/fixtures.json"), home.join("fixtures.json"));
            assert_eq!(expand_tilde("~"), home);
        }
        assert_eq!(expand_tilde("fixtures.json"), PathBuf::from("fixtures.json"));
    }
}
