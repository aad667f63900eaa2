//! ArtifactSink trait - Dispatcher output interface
//!
//! Artifacts are fully rendered before any sink sees them; sinks stage
//! them on `write` and make them visible on `commit`. A commit stays
//! revertible until `finish`, so a later sink failing can `rollback`
//! the ones already committed.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Kind of output artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ArtifactKind {
    /// Full merged time series
    Trace,
    /// Frame-indexed export for one camera
    Export { camera: String },
    /// Per-edge timing differences
    Diagnostics,
}

/// A rendered output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,

    /// File name, no directory component
    pub file_name: String,

    /// Rendered text, header included
    pub contents: String,

    /// Data rows (header excluded)
    pub rows: usize,
}

/// Artifact output trait
///
/// All sink implementations must implement this trait.
pub trait ArtifactSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Stage an artifact
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn write(&mut self, artifact: &Artifact) -> Result<(), ContractError>;

    /// Publish everything staged so far
    fn commit(&mut self) -> Result<(), ContractError>;

    /// Discard everything staged so far
    fn abort(&mut self);

    /// Revert the last successful `commit`, restoring what it replaced
    fn rollback(&mut self) {}

    /// Make the last successful `commit` permanent
    fn finish(&mut self) {}
}
