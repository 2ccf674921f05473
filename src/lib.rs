// Library module for fastdl
// Re-exports modules for use in integration tests and the binary

pub mod config;
pub mod error;
pub mod output;
pub mod sync;

pub use config::Config;
pub use error::{FastDlError, RootRole};
