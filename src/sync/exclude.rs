//! Exclusion list for published files.
//!
//! The list holds bare file names, one per line. Matching is done on the
//! file name only, so `barney.mdl` excludes every `barney.mdl` in the tree.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::io;
use std::path::Path;

use crate::error::{FastDlError, Result};

/// Set of file names that are never published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    /// Load an exclusion list from disk.
    ///
    /// A missing file is a normal configuration and yields `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(Self::parse(&content))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FastDlError::io(e, "reading exclusion list", path)),
        }
    }

    /// Parse exclusion list content (one file name per line).
    pub fn parse(content: &str) -> Self {
        let names = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
            .map(str::to_string)
            .collect();
        Self { names }
    }

    /// Check a file name (not a path) against the set.
    pub fn contains(&self, file_name: &OsStr) -> bool {
        file_name
            .to_str()
            .is_some_and(|name| self.names.contains(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
