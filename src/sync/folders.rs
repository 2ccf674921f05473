//! Folder table: which subtrees are published and which extensions they carry.

use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A subfolder of the game tree together with the extensions published from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderSpec {
    /// Subfolder relative to both roots. Empty means the root itself.
    #[serde(default)]
    pub name: String,
    /// Dot-prefixed, case-sensitive extensions, e.g. `.bsp`.
    pub extensions: Vec<String>,
}

impl FolderSpec {
    pub fn new<I, S>(name: &str, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Directory of this folder under `root`.
    pub fn dir_under(&self, root: &Path) -> PathBuf {
        if self.name.is_empty() {
            root.to_path_buf()
        } else {
            root.join(&self.name)
        }
    }

    /// Whether a file name carries one of the eligible extensions.
    pub fn matches(&self, file_name: &OsStr) -> bool {
        let Some(ext) = Path::new(file_name).extension().and_then(OsStr::to_str) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.strip_prefix('.') == Some(ext))
    }

    /// Name shown in output.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<root>"
        } else {
            &self.name
        }
    }
}

/// Built-in table for GoldSrc games (Counter-Strike 1.6 and friends).
pub fn goldsrc_folders() -> Vec<FolderSpec> {
    vec![
        FolderSpec::new("maps", [".bsp", ".nav", ".txt", ".cfg", ".res", ".gmr", ".gsr"]),
        FolderSpec::new("gfx", [".tga", ".bmp"]),
        FolderSpec::new("overviews", [".bmp", ".tga", ".txt"]),
        FolderSpec::new("models", [".mdl", ".bmp"]),
        FolderSpec::new("sprites", [".spr"]),
        FolderSpec::new("sound", [".mp3", ".wav", ".ogg"]),
        FolderSpec::new("", [".wad"]),
    ]
}
