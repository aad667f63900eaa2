//! Main sync engine implementation.

use contracts::{ContractError, DeviceLog, MachineStream, SyncEngineConfig, SyncOutcome};
use metrics::histogram;
use tracing::{info, instrument};

use crate::clock::ClockAligner;
use crate::edges::TriggerEdgeExtractor;
use crate::frames::{frame_events, FrameAligner};

/// Trigger time-base reconciliation and frame alignment
///
/// Runs edge extraction, clock alignment and frame alignment in one pass.
/// Holds no state between runs.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    config: SyncEngineConfig,
}

impl SyncEngine {
    /// Create a new sync engine with the given configuration
    pub fn new(config: SyncEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncEngineConfig {
        &self.config
    }

    /// Synchronize one test
    ///
    /// # Errors
    /// - `CannotAlign` when no trigger edge is found or nothing pairs
    /// - `EdgeCountMismatch` in strict mode
    #[instrument(
        name = "sync_engine_run",
        skip_all,
        fields(machine_rows = stream.len(), device_frames = device.len())
    )]
    pub fn run(&self, stream: &MachineStream, device: &DeviceLog) -> Result<SyncOutcome, ContractError> {
        let started = std::time::Instant::now();

        let (edges, edge_quality) =
            TriggerEdgeExtractor::new(self.config.trailing_edge).extract(stream)?;

        let markers = device.trigger_markers(self.config.trigger_source);
        let alignment = ClockAligner::new(self.config.clock.clone()).align(&edges, &markers)?;

        let events = frame_events(&device.records, &alignment);
        let trace = FrameAligner.align(stream, &events)?;

        let outcome = SyncOutcome {
            edges,
            edge_quality,
            alignment,
            trace,
        };
        observability::record_sync_outcome(&outcome);
        histogram!("dic_sync_engine_duration_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        info!(
            edges = outcome.edges.len(),
            offset_ms = outcome.alignment.offset_ms,
            max_abs_difference_ms = outcome.alignment.max_abs_difference,
            frames = outcome.trace.frames.len(),
            "synchronization complete"
        );
        Ok(outcome)
    }
}
