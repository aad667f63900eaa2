//! Pipeline orchestrator - coordinates all components.
//!
//! load → sync → assemble → dispatch, each stage a fatal boundary.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{SinkConfig, SinkType, SyncBlueprint};
use dispatcher::{AssemblerConfig, Dispatcher, OutputAssembler};
use ingestion::DataLoader;
use observability::SyncSummary;
use sync_engine::SyncEngine;
use tracing::{info, instrument, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated configuration with CLI overrides applied
    pub blueprint: SyncBlueprint,

    /// Compute everything, write nothing
    pub dry_run: bool,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    #[instrument(name = "pipeline_run", skip(self), fields(test_id = %self.config.blueprint.test_id(), dry_run = self.config.dry_run))]
    pub fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Load inputs
        let resolved = DataLoader::resolve(blueprint).context("Failed to locate input files")?;
        info!(
            machine = %resolved.machine.display(),
            device = %resolved.device.display(),
            cameras = resolved.cameras.len(),
            "Inputs resolved"
        );
        let inputs =
            DataLoader::load_resolved(&resolved, blueprint).context("Failed to load input files")?;

        // Synchronize
        let engine = SyncEngine::new(blueprint.to_sync_engine_config());
        let outcome = engine
            .run(&inputs.machine, &inputs.device)
            .context("Synchronization failed")?;

        // Assemble
        let assembler = OutputAssembler::new(AssemblerConfig::from_blueprint(blueprint));
        let artifacts = assembler
            .assemble(&inputs.machine, &inputs.device, &outcome, &inputs.cameras)
            .context("Failed to assemble output tables")?;

        // Dispatch
        let output_dir = blueprint.output_dir();
        let sinks = self.active_sinks();
        if sinks.is_empty() {
            warn!("No sinks configured, nothing will be written");
        }
        let mut dispatcher = Dispatcher::from_configs(&sinks, &output_dir)
            .context("Failed to create output sinks")?;
        dispatcher
            .dispatch(&artifacts)
            .with_context(|| format!("Failed to write output to {}", output_dir.display()))?;

        let stats = PipelineStats {
            test_id: blueprint.test_id(),
            output_dir: (!self.config.dry_run).then_some(output_dir),
            machine_rows: inputs.machine.len(),
            device_rows: inputs.device.raw_rows,
            cameras: inputs.cameras.iter().map(|c| c.camera.clone()).collect(),
            artifacts: artifacts
                .iter()
                .map(|a| (a.file_name.clone(), a.rows))
                .collect(),
            active_sinks: dispatcher.sink_names(),
            duration: start_time.elapsed(),
            summary: SyncSummary::from_outcome(&outcome),
        };

        Ok(stats)
    }

    /// Dry runs keep only the log sinks
    fn active_sinks(&self) -> Vec<SinkConfig> {
        let sinks = &self.config.blueprint.output.sinks;
        if !self.config.dry_run {
            return sinks.clone();
        }
        let mut log_sinks: Vec<SinkConfig> = sinks
            .iter()
            .filter(|s| s.sink_type == SinkType::Log)
            .cloned()
            .collect();
        if log_sinks.is_empty() {
            log_sinks.push(SinkConfig {
                name: "dry_run".to_string(),
                sink_type: SinkType::Log,
            });
        }
        log_sinks
    }
}

