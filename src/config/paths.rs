//! Where the page reader keeps its files.
//!
//! Only the settings file lives on disk; it sits in the platform config
//! directory resolved by `dirs`:
//!
//!   Windows: %APPDATA%\page-reader\settings.toml
//!   macOS:   ~/Library/Application Support/page-reader/settings.toml
//!   Linux:   ~/.config/page-reader/settings.toml

use std::path::{Path, PathBuf};

const APP_DIR: &str = "page-reader";
const SETTINGS_FILE: &str = "settings.toml";

/// Resolved on-disk locations.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
}

impl AppPaths {
    /// Platform locations, or `./page-reader/` when the platform has no
    /// config directory.
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::rooted_at(&base.join(APP_DIR))
    }

    /// Locations under an explicit directory.
    pub fn rooted_at(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            settings_file: config_dir.join(SETTINGS_FILE),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
