//! Where the configuration file lives.
//!
//! ## Platform-specific locations
//!
//! - `$PDFEBC_CONFIG_DIR` if set (relative paths are resolved against the
//!   current directory)
//! - otherwise `<user config dir>/pdfebc`, e.g. `~/.config/pdfebc` on Linux

use std::ffi::OsString;
use std::path::PathBuf;

use crate::errors::{PdfebcError, Result};

pub const APP_NAME: &str = "pdfebc";
pub const CONFIG_FILENAME: &str = "config.cnf";
pub const CONFIG_DIR_ENV: &str = "PDFEBC_CONFIG_DIR";

/// Source of the configuration directory
pub trait ConfigPathProvider {
    fn config_dir(&self) -> Result<PathBuf>;

    fn config_path(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(CONFIG_FILENAME))
    }
}

/// The per-user configuration directory of the platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserConfigDir;

impl ConfigPathProvider for UserConfigDir {
    fn config_dir(&self) -> Result<PathBuf> {
        resolve_config_dir(std::env::var_os(CONFIG_DIR_ENV), dirs::config_dir())
    }
}

/// A fixed directory, handy for tests and embedding.
#[derive(Debug, Clone)]
pub struct FixedConfigDir(pub PathBuf);

impl ConfigPathProvider for FixedConfigDir {
    fn config_dir(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}

fn resolve_config_dir(override_dir: Option<OsString>, platform_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(v) = override_dir.filter(|v| !v.is_empty()) {
        let p = PathBuf::from(v);
        let abs = if p.is_absolute() { p } else { std::env::current_dir()?.join(p) };
        return Ok(abs);
    }

    platform_dir
        .map(|d| d.join(APP_NAME))
        .ok_or_else(|| PdfebcError::NotFound("Failed to determine user config directory".to_string()))
}
