//! `sync` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::SyncArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

use super::load_blueprint;

/// Execute the `sync` command
pub fn run_sync(args: &SyncArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;

    info!(
        test_id = %blueprint.test_id(),
        output_dir = %blueprint.output_dir().display(),
        mode = ?blueprint.clock.mode,
        model = ?blueprint.clock.model,
        offset_constant_ms = blueprint.clock.offset_constant_ms,
        sinks = blueprint.output.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - output files will not be written");
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        dry_run: args.dry_run,
    });

    let stats = pipeline.run().context("Sync failed")?;

    info!(
        frames = stats.summary.frames,
        edges = stats.summary.edges,
        offset_ms = stats.summary.offset_ms,
        duration_secs = stats.duration.as_secs_f64(),
        "Sync completed successfully"
    );
    if stats.summary.drift_warning {
        warn!(
            max_abs_difference_ms = stats.summary.max_abs_difference_ms,
            "Trigger timing drift exceeds threshold"
        );
    }

    if args.json {
        let json = serde_json::to_string_pretty(&stats.report())
            .context("Failed to serialize run summary")?;
        println!("{json}");
    } else {
        stats.print_summary();
    }

    Ok(())
}
