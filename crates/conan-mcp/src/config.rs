//! Server configuration
//!
//! Loaded from a TOML file. Lookup order: an explicit path, then
//! `$CONAN_MCP_CONFIG`, then `<config dir>/conan-mcp/config.toml`. When no
//! file exists the defaults apply.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "CONAN_MCP_CONFIG";

const CONFIG_DIR_NAME: &str = "conan-mcp";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings for the MCP server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Path to the `conan` executable. Searched on `PATH` when unset.
    pub conan_path: Option<PathBuf>,

    /// Directory relative paths are resolved against. Defaults to the
    /// process working directory.
    pub work_dir: Option<PathBuf>,

    /// Upper bound for a single conan invocation. No limit when unset.
    pub timeout_secs: Option<u64>,

    /// `tracing` filter directives, e.g. `"conan_mcp=debug"`.
    pub log_filter: Option<String>,
}

impl ServerConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content, path)
    }

    /// Find and load the active configuration.
    ///
    /// An explicit or environment-provided path must exist; the per-user
    /// default file is optional.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Self::load(Path::new(&path));
        }

        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "Loading user config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The configured working directory, or the current directory.
    pub fn resolve_work_dir(&self) -> Result<PathBuf> {
        match &self.work_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

/// `<config dir>/conan-mcp/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
