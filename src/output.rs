// Console output for the command line front end
// Maps engine events to messages gated by verbosity level

use colored::Colorize;
use std::path::Path;

use crate::sync::engine::SyncEvent;
use crate::sync::exclude::ExclusionSet;
use crate::sync::report::SyncReport;

/// Verbosity levels:
/// 0 - only changes to the mirror;
/// 1 - header, footer and changes;
/// 2 - also exclusion notices, comparison timings and compression estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Verbosity(pub u8);

impl Verbosity {
    pub const CHANGES: Verbosity = Verbosity(0);
    pub const SUMMARY: Verbosity = Verbosity(1);
    pub const DETAIL: Verbosity = Verbosity(2);

    pub fn shows(&self, level: Verbosity) -> bool {
        *self >= level
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::DETAIL
    }
}

/// Level and message for an engine event.
pub fn describe(event: &SyncEvent<'_>) -> (Verbosity, String) {
    match event {
        SyncEvent::FolderStarted { folder } => (
            Verbosity::DETAIL,
            format!("Processing {}...", folder.display_name()).dimmed().to_string(),
        ),
        SyncEvent::DirectoryCreated { path } => (
            Verbosity::CHANGES,
            format!("Directory {} wasn't found on fastdl path, creating...", path.display()),
        ),
        SyncEvent::Excluded { path } => (
            Verbosity::DETAIL,
            format!("Found {} which is blacklisted, ignoring...", file_name(path)),
        ),
        SyncEvent::Added { source } => (
            Verbosity::CHANGES,
            format!("Adding {} to fastdl...", source.display()).green().to_string(),
        ),
        SyncEvent::Changed { source } => (
            Verbosity::CHANGES,
            format!("Found changed file {}, replacing...", source.display())
                .yellow()
                .to_string(),
        ),
        SyncEvent::Compressing { source, estimate } => (
            Verbosity::DETAIL,
            format!(
                "Compressing {}, ETC: {:.2} seconds...",
                source.display(),
                estimate.as_secs_f64()
            ),
        ),
        SyncEvent::Compared { source, comparison, compressed } => (
            Verbosity::DETAIL,
            format!(
                "{} {} compared in {:.2} seconds",
                if *compressed { "Compressed file" } else { "File" },
                source.display(),
                comparison.elapsed.as_secs_f64()
            ),
        ),
        SyncEvent::Removed { source } => (
            Verbosity::CHANGES,
            format!("Found removed file {}, deleting...", source.display())
                .red()
                .to_string(),
        ),
        SyncEvent::DirectoryRemoved { path } => (
            Verbosity::CHANGES,
            format!("Found empty directory {} on fastdl, removing...", path.display()),
        ),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Prints engine events and run summaries at a verbosity level.
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    verbosity: Verbosity,
}

impl Printer {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn event(&self, event: &SyncEvent<'_>) {
        let (level, message) = describe(event);
        if self.verbosity.shows(level) {
            println!("{}", message);
        }
    }

    /// Header line about the exclusion list.
    pub fn exclusion_list(&self, path: &Path, loaded: Option<&ExclusionSet>) {
        if !self.verbosity.shows(Verbosity::SUMMARY) {
            return;
        }
        match loaded {
            Some(set) => println!(
                "BlackList found at {}. Parsed {} files.",
                path.display(),
                set.len()
            ),
            None => println!("BlackList not found at {}. ignoring...", path.display()),
        }
    }

    /// Footer with counters, elapsed time and bytes written.
    pub fn summary(&self, report: &SyncReport) {
        if !self.verbosity.shows(Verbosity::SUMMARY) {
            return;
        }
        println!("{}", report);
        println!(
            "Wrote {}.",
            humansize::format_size(report.bytes_written(), humansize::BINARY)
        );
    }
}
