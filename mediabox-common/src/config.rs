//! Configuration file resolution and loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Steps 1 and 2 are handled by each binary's argument parser; this module
//! locates and parses the TOML file and supplies OS-dependent defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the configuration file inside an application config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Locate the TOML configuration file for `app_name`
///
/// An explicit path (from CLI or environment) wins and must exist. Otherwise
/// the user config directory is tried first, then `/etc/<app_name>/`.
/// Returns `Ok(None)` when no file is present, which is not an error: every
/// setting has a compiled default.
pub fn locate_config_file(explicit: Option<&Path>, app_name: &str) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let user_config = dirs::config_dir().map(|d| d.join(app_name).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.is_file() {
            return Ok(Some(path));
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc").join(app_name).join(CONFIG_FILE_NAME);
        if system_config.is_file() {
            return Ok(Some(system_config));
        }
    }

    debug!("No config file found for {}", app_name);
    Ok(None)
}

/// Parse a TOML file into `T`
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    let parsed = toml::from_str::<T>(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(parsed)
}

/// Locate and parse the config file, falling back to `T::default()`
pub fn load_or_default<T: DeserializeOwned + Default>(
    explicit: Option<&Path>,
    app_name: &str,
) -> Result<T> {
    match locate_config_file(explicit, app_name)? {
        Some(path) => load_toml(&path),
        None => Ok(T::default()),
    }
}

/// Get OS-dependent default data folder for `app_name`
pub fn default_data_dir(app_name: &str) -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/<app> (or /var/lib/<app> when no home is available)
        dirs::data_local_dir()
            .map(|d| d.join(app_name))
            .unwrap_or_else(|| PathBuf::from("/var/lib").join(app_name))
    } else {
        dirs::data_local_dir()
            .map(|d| d.join(app_name))
            .unwrap_or_else(|| PathBuf::from(format!("./{}_data", app_name)))
    }
}
