//! Configuration file support.
//!
//! All settings have GoldSrc defaults, so the file is optional. Example:
//!
//! ```toml
//! source_root = "/srv/hlds/cstrike"
//! mirror_root = "/var/www/fastdl"
//! exclude_list = "/srv/hlds/fastdl_blacklist_goldsrc.txt"
//! compression = "gzip"
//! level = 6
//!
//! [[folder]]
//! name = "maps"
//! extensions = [".bsp", ".nav", ".txt"]
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{FastDlError, Result};
use crate::sync::compare::DEFAULT_CHUNK_SIZE;
use crate::sync::compression::{CompressionLevel, CompressionType};
use crate::sync::engine::SyncOptions;
use crate::sync::folders::{goldsrc_folders, FolderSpec};

/// Run configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source_root: PathBuf,
    pub mirror_root: PathBuf,
    pub exclude_list: PathBuf,
    pub compression: CompressionType,
    pub level: CompressionLevel,
    pub chunk_size: usize,
    #[serde(rename = "folder")]
    pub folders: Vec<FolderSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("./cstrike"),
            mirror_root: PathBuf::from("./www/fastdl"),
            exclude_list: PathBuf::from("./fastdl_blacklist_goldsrc.txt"),
            compression: CompressionType::Gzip,
            level: CompressionLevel::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            folders: goldsrc_folders(),
        }
    }
}

impl Config {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FastDlError::io(e, "reading config", path))?;
        Self::parse(&content, path)
    }

    /// Parse configuration content; `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| FastDlError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if config.chunk_size == 0 {
            return Err(FastDlError::Config {
                path: path.to_path_buf(),
                message: "chunk_size must be greater than zero".to_string(),
            });
        }
        Ok(config)
    }

    /// Engine options for this configuration.
    pub fn sync_options(&self, full_check: bool) -> SyncOptions {
        SyncOptions {
            source_root: self.source_root.clone(),
            mirror_root: self.mirror_root.clone(),
            compression: self.compression,
            level: self.level,
            full_check,
            chunk_size: self.chunk_size,
        }
    }
}
