//! Run summary: counters, per-folder outcomes and the final report.

use std::fmt;
use std::ops::{Add, AddAssign};
use std::time::Duration;

use crate::error::FastDlError;

/// Tally of mirror entries touched by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub added: usize,
    pub changed: usize,
    pub removed: usize,
}

impl RunCounters {
    pub fn new(added: usize, changed: usize, removed: usize) -> Self {
        Self { added, changed, removed }
    }

    /// True when the run left the mirror untouched.
    pub fn is_zero(&self) -> bool {
        self.added == 0 && self.changed == 0 && self.removed == 0
    }
}

impl Add for RunCounters {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            added: self.added + other.added,
            changed: self.changed + other.changed,
            removed: self.removed + other.removed,
        }
    }
}

impl AddAssign for RunCounters {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Result of processing one folder.
#[derive(Debug)]
pub enum FolderOutcome {
    Completed,
    /// Processing stopped at `error`; counters hold the work done before it.
    Failed(FastDlError),
}

/// Work done on a single folder of the table.
#[derive(Debug)]
pub struct FolderReport {
    pub folder: String,
    pub counters: RunCounters,
    pub bytes_written: u64,
    pub outcome: FolderOutcome,
}

impl FolderReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FolderOutcome::Failed(_))
    }
}

/// Result of a whole run.
///
/// A run stops at the first failing folder; later folders do not appear in
/// `folders` and are listed in `skipped`.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub folders: Vec<FolderReport>,
    pub skipped: Vec<String>,
    pub elapsed: Duration,
}

impl SyncReport {
    /// Counters summed over every processed folder, including a failed one.
    pub fn counters(&self) -> RunCounters {
        self.folders
            .iter()
            .fold(RunCounters::default(), |acc, f| acc + f.counters)
    }

    pub fn bytes_written(&self) -> u64 {
        self.folders.iter().map(|f| f.bytes_written).sum()
    }

    /// The error that aborted the run, if any.
    pub fn failure(&self) -> Option<&FastDlError> {
        self.folders.iter().find_map(|f| match &f.outcome {
            FolderOutcome::Failed(e) => Some(e),
            FolderOutcome::Completed => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let counters = self.counters();
        if self.is_success() {
            writeln!(
                f,
                "Fastdl was updated successfully. (Took {:.2} seconds to complete)",
                self.elapsed.as_secs_f64()
            )?;
        } else {
            writeln!(
                f,
                "Fastdl update was aborted. (Ran for {:.2} seconds)",
                self.elapsed.as_secs_f64()
            )?;
        }
        writeln!(f, "Was added {} entries.", counters.added)?;
        writeln!(f, "Was changed {} entries.", counters.changed)?;
        write!(f, "Was removed {} entries.", counters.removed)?;
        if !self.skipped.is_empty() {
            write!(f, "\nSkipped folders: {}", self.skipped.join(", "))?;
        }
        Ok(())
    }
}
