//! LogSink - logs artifact summaries via tracing

use contracts::{Artifact, ArtifactSink, ContractError};
use tracing::{info, instrument};

/// Sink that logs what would be written, useful for dry runs
pub struct LogSink {
    name: String,
    staged: Vec<(String, usize, usize)>,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            staged: Vec::new(),
        }
    }
}

impl ArtifactSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, artifact),
        fields(sink = %self.name, file = %artifact.file_name)
    )]
    fn write(&mut self, artifact: &Artifact) -> Result<(), ContractError> {
        self.staged.push((
            artifact.file_name.clone(),
            artifact.rows,
            artifact.contents.len(),
        ));
        Ok(())
    }

    #[instrument(name = "log_sink_commit", skip(self))]
    fn commit(&mut self) -> Result<(), ContractError> {
        for (file, rows, bytes) in self.staged.drain(..) {
            info!(sink = %self.name, file = %file, rows, bytes, "Artifact");
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.staged.clear();
    }
}
