//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Neither a test directory nor explicit input paths
    #[error(
        "no inputs: pass --test-dir (or set test.dir) or configure every path under [inputs]"
    )]
    NoInputs,
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}
