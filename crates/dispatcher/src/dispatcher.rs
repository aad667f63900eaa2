//! Dispatcher - fan-out of rendered artifacts to sinks
//!
//! Writes are all-or-nothing: every sink stages every artifact first, and
//! only when all of them succeeded is anything committed. A commit failing
//! rolls back the sinks committed before it.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use contracts::{Artifact, ArtifactSink, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::sinks::{FileSink, FileSinkConfig, LogSink};

/// What a successful dispatch wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Artifacts handed to each sink
    pub artifacts: usize,
    /// Data rows across all artifacts
    pub rows: usize,
    pub sinks: Vec<String>,
}

/// Create a sink from configuration
#[instrument(
    name = "dispatcher_create_sink",
    skip(config, output_dir),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn create_sink(
    config: &SinkConfig,
    output_dir: &Path,
) -> Result<Box<dyn ArtifactSink>, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(Box::new(LogSink::new(&config.name))),
        SinkType::File => {
            let sink = FileSink::new(
                &config.name,
                FileSinkConfig {
                    base_path: output_dir.to_path_buf(),
                },
            )
            .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(Box::new(sink))
        }
    }
}

/// Routes artifacts to every configured sink
pub struct Dispatcher {
    sinks: Vec<Box<dyn ArtifactSink>>,
    output_dir: PathBuf,
}

impl Dispatcher {
    /// Build the sinks of `configs`, file sinks writing into `output_dir`
    #[instrument(
        name = "dispatcher_create",
        skip(configs),
        fields(sink_count = configs.len(), output_dir = %output_dir.display())
    )]
    pub fn from_configs(configs: &[SinkConfig], output_dir: &Path) -> Result<Self, DispatcherError> {
        let sinks = configs
            .iter()
            .map(|config| create_sink(config, output_dir))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            sinks,
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Create a dispatcher with custom sinks (for testing)
    pub fn with_sinks(sinks: Vec<Box<dyn ArtifactSink>>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            sinks,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    /// Write every artifact to every sink, then commit all of them
    ///
    /// On the first failure every sink is aborted or rolled back, so the
    /// previous output stays in place.
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, artifacts),
        fields(artifacts = artifacts.len(), sinks = self.sinks.len())
    )]
    pub fn dispatch(&mut self, artifacts: &[Artifact]) -> Result<DispatchReport, DispatcherError> {
        if let Err(e) = self.write_all(artifacts) {
            self.abort_all();
            return Err(e);
        }

        for idx in 0..self.sinks.len() {
            if let Err(e) = self.sinks[idx].commit() {
                warn!(sink = %self.sinks[idx].name(), error = %e, "Commit failed, aborting remaining sinks");
                for sink in &mut self.sinks[idx + 1..] {
                    sink.abort();
                }
                for sink in self.sinks[..idx].iter_mut().rev() {
                    sink.rollback();
                }
                return Err(e.into());
            }
        }
        for sink in &mut self.sinks {
            sink.finish();
        }

        let report = DispatchReport {
            artifacts: artifacts.len(),
            rows: artifacts.iter().map(|a| a.rows).sum(),
            sinks: self.sink_names(),
        };
        info!(
            artifacts = report.artifacts,
            rows = report.rows,
            "Artifacts dispatched"
        );
        Ok(report)
    }

    fn write_all(&mut self, artifacts: &[Artifact]) -> Result<(), DispatcherError> {
        for sink in &mut self.sinks {
            for artifact in artifacts {
                let result = sink.write(artifact);
                observability::record_artifact_written(
                    sink.name(),
                    artifact.rows,
                    artifact.contents.len(),
                    result.is_ok(),
                );
                result?;
            }
        }
        Ok(())
    }

    fn abort_all(&mut self) {
        for sink in &mut self.sinks {
            sink.abort();
        }
    }
}
