//! Pipeline statistics.

use std::path::PathBuf;
use std::time::Duration;

use observability::SyncSummary;
use serde::Serialize;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub test_id: String,

    /// Where the artifacts were written; `None` on a dry run
    pub output_dir: Option<PathBuf>,

    /// Genuine machine rows loaded
    pub machine_rows: usize,

    /// Raw device log rows read (before per-frame collapse)
    pub device_rows: usize,

    /// Camera names, primary first
    pub cameras: Vec<String>,

    /// `(file name, data rows)` of every artifact
    pub artifacts: Vec<(String, usize)>,

    /// Names of the sinks that received data
    pub active_sinks: Vec<String>,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Sync engine summary
    pub summary: SyncSummary,
}

/// Compact machine-readable form of the stats
#[derive(Debug, Serialize)]
pub struct StatsReport<'a> {
    pub test_id: &'a str,
    pub frames: usize,
    pub edges: usize,
    pub offset_ms: f64,
    pub max_abs_difference_ms: f64,
    pub drift_warning: bool,
    pub artifacts: Vec<&'a str>,
}

impl PipelineStats {
    /// Frames aligned per second of wall time
    pub fn frames_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.summary.frames as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn report(&self) -> StatsReport<'_> {
        StatsReport {
            test_id: &self.test_id,
            frames: self.summary.frames,
            edges: self.summary.edges,
            offset_ms: self.summary.offset_ms,
            max_abs_difference_ms: self.summary.max_abs_difference_ms,
            drift_warning: self.summary.drift_warning,
            artifacts: self.artifacts.iter().map(|(name, _)| name.as_str()).collect(),
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                       Sync Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Test: {}", self.test_id);
        println!("   ├─ Duration: {:.3}s", self.duration.as_secs_f64());
        println!("   ├─ Machine rows: {}", self.machine_rows);
        println!("   ├─ Device rows: {}", self.device_rows);
        println!("   ├─ Cameras: {}", self.cameras.join(", "));
        println!("   └─ Frames/s: {:.1}", self.frames_per_sec());

        println!("\n{}", self.summary);

        match &self.output_dir {
            Some(dir) => println!("📁 Output ({})", dir.display()),
            None => println!("📁 Output (dry run, nothing written)"),
        }
        for (idx, (name, rows)) in self.artifacts.iter().enumerate() {
            let branch = if idx + 1 == self.artifacts.len() {
                "└─"
            } else {
                "├─"
            };
            println!("   {branch} {name} ({rows} rows)");
        }

        if self.summary.drift_warning {
            println!("\n⚠️  Timing differences exceed the drift threshold, check the trigger data");
        }

        println!();
    }
}
