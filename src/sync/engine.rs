//! Mirror synchronization engine.
//!
//! For every folder of the table the engine runs three phases:
//! publish new or changed source files, prune mirror files whose source is
//! gone, then prune mirror directories left empty. The first failing folder
//! aborts the run; work already done is kept and reported.

use jwalk::{Parallelism, WalkDir};
use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{FastDlError, Result, RootRole};
use crate::sync::compare::{files_equal, Comparison, DEFAULT_CHUNK_SIZE};
use crate::sync::compression::{
    estimated_compress_time, write_entry, CompressionLevel, CompressionType,
};
use crate::sync::exclude::ExclusionSet;
use crate::sync::folders::FolderSpec;
use crate::sync::report::{FolderOutcome, FolderReport, RunCounters, SyncReport};

/// Engine settings for a run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Game installation root.
    pub source_root: PathBuf,
    /// FastDL root.
    pub mirror_root: PathBuf,
    /// Mirror representation. `None` publishes raw copies.
    pub compression: CompressionType,
    pub level: CompressionLevel,
    /// Verify the content of existing mirror entries (slow).
    pub full_check: bool,
    /// Chunk size for content comparison.
    pub chunk_size: usize,
}

impl SyncOptions {
    pub fn new(source_root: impl Into<PathBuf>, mirror_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            mirror_root: mirror_root.into(),
            compression: CompressionType::default(),
            level: CompressionLevel::default(),
            full_check: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Something the engine did or noticed, in the order it happened.
#[derive(Debug, Clone, Copy)]
pub enum SyncEvent<'a> {
    FolderStarted { folder: &'a FolderSpec },
    DirectoryCreated { path: &'a Path },
    Excluded { path: &'a Path },
    Added { source: &'a Path },
    Changed { source: &'a Path },
    Compressing { source: &'a Path, estimate: Duration },
    Compared { source: &'a Path, comparison: Comparison, compressed: bool },
    Removed { source: &'a Path },
    DirectoryRemoved { path: &'a Path },
}

/// Type alias for the event callback
pub type EventCallback = Box<dyn Fn(&SyncEvent<'_>)>;

/// Work accumulated while a folder is processed.
#[derive(Debug, Default)]
struct FolderProgress {
    counters: RunCounters,
    bytes_written: u64,
}

/// Engine mirroring the configured folders of a source tree.
pub struct SyncEngine {
    options: SyncOptions,
    event_callback: Option<EventCallback>,
}

impl SyncEngine {
    pub fn new(options: SyncOptions) -> Self {
        Self {
            options,
            event_callback: None,
        }
    }

    /// Set a callback receiving every [`SyncEvent`]
    pub fn with_event_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SyncEvent<'_>) + 'static,
    {
        self.event_callback = Some(Box::new(callback));
        self
    }

    fn emit(&self, event: SyncEvent<'_>) {
        if let Some(callback) = &self.event_callback {
            callback(&event);
        }
    }

    /// Fail fast if either root is missing.
    pub fn check_roots(&self) -> Result<()> {
        let roots = [
            (RootRole::Source, &self.options.source_root),
            (RootRole::Mirror, &self.options.mirror_root),
        ];
        for (role, path) in roots {
            if !path.exists() {
                return Err(FastDlError::MissingRoot {
                    role,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run all folders in order.
    ///
    /// Only a missing root is returned as `Err`. Failures while processing a
    /// folder are recorded in the report, which then lists the folders that
    /// were not attempted.
    pub fn sync(&self, folders: &[FolderSpec], exclusions: Option<&ExclusionSet>) -> Result<SyncReport> {
        self.check_roots()?;

        let start = Instant::now();
        let mut report = SyncReport::default();

        for (index, folder) in folders.iter().enumerate() {
            self.emit(SyncEvent::FolderStarted { folder });
            let _span = tracing::debug_span!("folder", name = folder.display_name()).entered();

            let mut progress = FolderProgress::default();
            let outcome = match self.sync_folder(folder, exclusions, &mut progress) {
                Ok(()) => FolderOutcome::Completed,
                Err(e) => {
                    tracing::warn!(error = %e, "aborting run");
                    FolderOutcome::Failed(e)
                }
            };
            let failed = matches!(outcome, FolderOutcome::Failed(_));

            report.folders.push(FolderReport {
                folder: folder.display_name().to_string(),
                counters: progress.counters,
                bytes_written: progress.bytes_written,
                outcome,
            });

            if failed {
                report.skipped = folders[index + 1..]
                    .iter()
                    .map(|f| f.display_name().to_string())
                    .collect();
                break;
            }
        }

        report.elapsed = start.elapsed();
        Ok(report)
    }

    fn sync_folder(
        &self,
        folder: &FolderSpec,
        exclusions: Option<&ExclusionSet>,
        progress: &mut FolderProgress,
    ) -> Result<()> {
        self.publish(folder, exclusions, progress)?;
        self.prune_stale_files(folder, progress)?;
        self.prune_empty_dirs(folder)
    }

    /// Phase A: create missing mirror entries and, with `full_check`,
    /// rewrite the ones whose content differs from the source.
    fn publish(
        &self,
        folder: &FolderSpec,
        exclusions: Option<&ExclusionSet>,
        progress: &mut FolderProgress,
    ) -> Result<()> {
        let opts = &self.options;
        let source_dir = folder.dir_under(&opts.source_root);

        for source in walk(&source_dir, EntryKind::File)? {
            let Some(file_name) = source.file_name() else {
                continue;
            };
            if !folder.matches(file_name) {
                continue;
            }
            if exclusions.is_some_and(|set| set.contains(file_name)) {
                self.emit(SyncEvent::Excluded { path: &source });
                continue;
            }

            let relative = relative_to(&source, &opts.source_root);
            let mirror_dir = match relative.parent() {
                Some(parent) => opts.mirror_root.join(parent),
                None => opts.mirror_root.clone(),
            };
            if !mirror_dir.is_dir() {
                self.emit(SyncEvent::DirectoryCreated { path: &mirror_dir });
                fs::create_dir_all(&mirror_dir)
                    .map_err(|e| FastDlError::io(e, "creating directory", &mirror_dir))?;
            }

            let mirror = mirror_dir.join(opts.compression.mirror_name(file_name));
            if !mirror.exists() {
                self.emit(SyncEvent::Added { source: &source });
                self.produce(&source, &mirror, progress)?;
                progress.counters.added += 1;
            } else if opts.full_check && !self.mirror_matches(&source, &mirror)? {
                self.emit(SyncEvent::Changed { source: &source });
                self.produce(&source, &mirror, progress)?;
                progress.counters.changed += 1;
            }
        }

        Ok(())
    }

    /// Write `mirror` from `source` in the configured representation.
    fn produce(&self, source: &Path, mirror: &Path, progress: &mut FolderProgress) -> Result<()> {
        let opts = &self.options;
        if opts.compression.is_compressed() {
            let size = fs::metadata(source)
                .map_err(|e| FastDlError::io(e, "reading metadata of", source))?
                .len();
            self.emit(SyncEvent::Compressing {
                source,
                estimate: estimated_compress_time(size),
            });
        }

        let written = write_entry(source, mirror, opts.compression, opts.level)?;
        tracing::debug!(source = %source.display(), mirror = %mirror.display(), written, "mirror entry written");
        progress.bytes_written += written;
        Ok(())
    }

    /// Content check of an existing mirror entry.
    fn mirror_matches(&self, source: &Path, mirror: &Path) -> Result<bool> {
        let opts = &self.options;
        let compressed = opts.compression.is_compressed();

        // Raw copies of a different size cannot be equal.
        if !compressed {
            let source_len = fs::metadata(source)
                .map_err(|e| FastDlError::io(e, "reading metadata of", source))?
                .len();
            let mirror_len = fs::metadata(mirror)
                .map_err(|e| FastDlError::io(e, "reading metadata of", mirror))?
                .len();
            if source_len != mirror_len {
                return Ok(false);
            }
        }

        let comparison = files_equal(source, mirror, opts.compression, opts.chunk_size)?;
        self.emit(SyncEvent::Compared {
            source,
            comparison,
            compressed,
        });
        Ok(comparison.equal)
    }

    /// Phase B: delete mirror files whose source file no longer exists.
    ///
    /// Every file in the mirror subtree is a candidate, whatever its
    /// extension or exclusion status.
    fn prune_stale_files(&self, folder: &FolderSpec, progress: &mut FolderProgress) -> Result<()> {
        let opts = &self.options;
        let mirror_dir = folder.dir_under(&opts.mirror_root);

        for mirror in walk(&mirror_dir, EntryKind::File)? {
            let Some(file_name) = mirror.file_name() else {
                continue;
            };
            let relative = relative_to(&mirror, &opts.mirror_root);
            let source_dir = match relative.parent() {
                Some(parent) => opts.source_root.join(parent),
                None => opts.source_root.clone(),
            };
            let source = source_dir.join(opts.compression.logical_name(file_name));

            if !source.exists() {
                self.emit(SyncEvent::Removed { source: &source });
                fs::remove_file(&mirror).map_err(|e| FastDlError::io(e, "removing", &mirror))?;
                progress.counters.removed += 1;
            }
        }

        Ok(())
    }

    /// Phase C: remove empty directories, deepest first, so a parent emptied
    /// by removing its children goes too. The mirror root is kept.
    fn prune_empty_dirs(&self, folder: &FolderSpec) -> Result<()> {
        let opts = &self.options;
        let mirror_dir = folder.dir_under(&opts.mirror_root);

        let mut dirs = walk(&mirror_dir, EntryKind::Dir)?;
        dirs.sort_by_key(|dir| Reverse(dir.components().count()));
        if !folder.name.is_empty() && mirror_dir.is_dir() {
            dirs.push(mirror_dir);
        }

        for dir in dirs {
            let is_empty = fs::read_dir(&dir)
                .map_err(|e| FastDlError::io(e, "listing", &dir))?
                .next()
                .is_none();
            if is_empty {
                self.emit(SyncEvent::DirectoryRemoved { path: &dir });
                fs::remove_dir(&dir).map_err(|e| FastDlError::io(e, "removing directory", &dir))?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
}

/// Collect files or directories below `root` (the root itself excluded),
/// sorted, without following directory symlinks. A missing root yields
/// nothing.
fn walk(root: &Path, kind: EntryKind) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .parallelism(Parallelism::Serial)
        .sort(true)
        .skip_hidden(false)
    {
        let entry = entry.map_err(|e| FastDlError::Walk {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_dir = entry.file_type().is_dir();

        match kind {
            EntryKind::Dir if is_dir => paths.push(path),
            EntryKind::File if !is_dir && path.is_file() => paths.push(path),
            _ => {}
        }
    }
    Ok(paths)
}

/// Path of `path` relative to `base`, or `path` itself if it lies elsewhere.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Run one synchronization with default level and chunk size.
pub fn sync(
    source_root: &Path,
    mirror_root: &Path,
    folders: &[FolderSpec],
    exclusions: Option<&ExclusionSet>,
    full_check: bool,
    use_compression: bool,
) -> Result<SyncReport> {
    let mut options = SyncOptions::new(source_root, mirror_root);
    options.full_check = full_check;
    options.compression = if use_compression {
        CompressionType::Gzip
    } else {
        CompressionType::None
    };
    SyncEngine::new(options).sync(folders, exclusions)
}
