//! Mirror synchronization.
//!
//! Publishes selected folders of a game tree into a FastDL directory,
//! compressing eligible files and keeping the mirror consistent with the
//! source across runs.

pub mod compare;
pub mod compression;
pub mod engine;
pub mod exclude;
pub mod folders;
pub mod report;

pub use compare::{files_equal, Comparison};
pub use compression::{CompressionLevel, CompressionType, CompressedReader, CompressedWriter};
pub use engine::{sync, SyncEngine, SyncEvent, SyncOptions};
pub use exclude::ExclusionSet;
pub use folders::{goldsrc_folders, FolderSpec};
pub use report::{FolderOutcome, FolderReport, RunCounters, SyncReport};
