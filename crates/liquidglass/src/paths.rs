use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "LIQUIDGLASS_CONFIG_DIR";
pub const CONFIG_FILE: &str = "glass.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "LiquidGlass";
const APPLICATION: &str = "liquidglass";

/// Where liquidglass looks for its files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    /// `$LIQUIDGLASS_CONFIG_DIR` when set and non-empty, otherwise the
    /// platform config directory.
    pub fn discover() -> Result<Self> {
        Self::with_override(env::var_os(ENV_CONFIG_DIR))
    }

    fn with_override(config_override: Option<OsString>) -> Result<Self> {
        if let Some(value) = config_override.filter(|value| !value.is_empty()) {
            return Ok(Self {
                config_dir: PathBuf::from(value),
            });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}
