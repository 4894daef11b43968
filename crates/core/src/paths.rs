//! Well-known locations of the configuration layers.
//!
//! - User file: `$SCRIPTDECK_CONFIG_DIR/config.json`, falling back to the
//!   platform config directory (`~/.config/scriptdeck`, `~/Library/Application Support/scriptdeck`, ...)
//! - Bundled defaults: `$SCRIPTDECK_RESOURCES/default_config.json`, falling back to
//!   the `Resources` directory of a macOS app bundle or a `resources` directory
//!   next to the executable

use std::env;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "scriptdeck";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const BUNDLED_CONFIG_FILE_NAME: &str = "default_config.json";

/// Locations of the bundled and user configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Authoritative user layer, rewritten on every mutation
    pub user: PathBuf,

    /// Shipped defaults, never written
    pub bundled: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn new(user: impl Into<PathBuf>, bundled: Option<PathBuf>) -> Self {
        Self { user: user.into(), bundled }
    }

    /// Resolve both layers from the environment and platform conventions.
    pub fn discover() -> Self {
        Self::in_dir(&Self::default_config_dir())
    }

    /// User layer inside `dir`, bundled layer from the usual resources location.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            user: dir.join(CONFIG_FILE_NAME),
            bundled: Self::default_resources_dir().map(|d| d.join(BUNDLED_CONFIG_FILE_NAME)),
        }
    }

    /// Directory holding the user configuration file.
    pub fn default_config_dir() -> PathBuf {
        if let Ok(dir) = env::var("SCRIPTDECK_CONFIG_DIR")
            && !dir.is_empty()
        {
            return PathBuf::from(dir);
        }

        dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR_NAME)
    }

    /// Directory holding resources shipped with the application.
    pub fn default_resources_dir() -> Option<PathBuf> {
        if let Ok(dir) = env::var("SCRIPTDECK_RESOURCES")
            && !dir.is_empty()
        {
            return Some(PathBuf::from(dir));
        }

        let exe = env::current_exe().ok()?;
        let exe_dir = exe.parent()?;

        let bundle_resources = exe_dir.join("..").join("Resources");
        if bundle_resources.is_dir() {
            return Some(bundle_resources);
        }
        Some(exe_dir.join("resources"))
    }

    /// Directory the user file lives in.
    pub fn config_dir(&self) -> PathBuf {
        self.user.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    }

    /// Directory for rolling log files, next to the user file.
    pub fn log_dir(&self) -> PathBuf {
        self.config_dir().join("logs")
    }
}
