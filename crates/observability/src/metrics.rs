//! 同步结果指标收集模块
//!
//! 基于 SyncOutcome 记录运行指标，并汇总触发时间差统计。

use contracts::{FrameValueSource, SyncOutcome};
use metrics::{counter, gauge, histogram};

/// 从 SyncOutcome 记录指标
///
/// 每次同步运行结束时调用一次。
pub fn record_sync_outcome(outcome: &SyncOutcome) {
    let alignment = &outcome.alignment;
    let quality = &outcome.trace.quality;

    // 触发边沿
    counter!("dic_sync_edges_detected_total").increment(outcome.edges.len() as u64);
    if outcome.edge_quality.adjacent_edges > 0 {
        counter!("dic_sync_adjacent_edges_total")
            .increment(outcome.edge_quality.adjacent_edges as u64);
    }

    // 时钟校正
    gauge!("dic_sync_clock_offset_ms").set(alignment.offset_ms);
    gauge!("dic_sync_max_abs_difference_ms").set(alignment.max_abs_difference);
    for diff in &alignment.per_edge_difference {
        histogram!("dic_sync_trigger_difference_ms").record(diff.abs());
    }
    if alignment.drift_warning {
        counter!("dic_sync_drift_warnings_total").increment(1);
    }
    let unpaired = alignment.unpaired_edges + alignment.unpaired_markers;
    if unpaired > 0 {
        counter!("dic_sync_unpaired_triggers_total").increment(unpaired as u64);
    }

    // 帧对齐
    counter!("dic_sync_frames_aligned_total").increment(outcome.trace.frames.len() as u64);
    for frame in &outcome.trace.frames {
        let source = match frame.source {
            FrameValueSource::Exact => "exact",
            FrameValueSource::Interpolated { .. } => "interpolated",
            FrameValueSource::Held => "held",
        };
        counter!("dic_sync_frame_values_total", "source" => source).increment(1);
    }
    if quality.degenerate_intervals > 0 {
        counter!("dic_sync_degenerate_intervals_total")
            .increment(quality.degenerate_intervals as u64);
    }
}

/// 记录产物写出
pub fn record_artifact_written(sink_name: &str, rows: usize, bytes: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "dic_sync_artifacts_written_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    if success {
        histogram!("dic_sync_artifact_rows", "sink" => sink_name.to_string()).record(rows as f64);
        histogram!("dic_sync_artifact_bytes", "sink" => sink_name.to_string()).record(bytes as f64);
    }
}

/// 单次同步运行摘要
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub edges: usize,
    pub paired: usize,
    pub frames: usize,
    pub offset_ms: f64,
    pub max_abs_difference_ms: f64,
    pub drift_warning: bool,
    pub adjacent_edges: usize,
    pub dropped_trailing: bool,
    pub unpaired_edges: usize,
    pub unpaired_markers: usize,
    pub exact_matches: usize,
    pub interpolated: usize,
    pub degenerate_intervals: usize,
    pub clamped: usize,
    /// 触发时间差 (ms) 统计
    pub timing: StatsSummary,
}

impl SyncSummary {
    pub fn from_outcome(outcome: &SyncOutcome) -> Self {
        let alignment = &outcome.alignment;
        let quality = &outcome.trace.quality;

        let mut timing = RunningStats::default();
        for diff in &alignment.per_edge_difference {
            timing.push(*diff);
        }

        Self {
            edges: outcome.edges.len(),
            paired: alignment.pairs.len(),
            frames: outcome.trace.frames.len(),
            offset_ms: alignment.offset_ms,
            max_abs_difference_ms: alignment.max_abs_difference,
            drift_warning: alignment.drift_warning,
            adjacent_edges: outcome.edge_quality.adjacent_edges,
            dropped_trailing: outcome.edge_quality.dropped_trailing,
            unpaired_edges: alignment.unpaired_edges,
            unpaired_markers: alignment.unpaired_markers,
            exact_matches: quality.exact_matches,
            interpolated: quality.interpolated,
            degenerate_intervals: quality.degenerate_intervals,
            clamped: quality.clamped,
            timing: StatsSummary::from(&timing),
        }
    }
}

impl std::fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sync Summary ===")?;
        writeln!(
            f,
            "Trigger edges: {} (paired {}, adjacent {}{})",
            self.edges,
            self.paired,
            self.adjacent_edges,
            if self.dropped_trailing {
                ", trailing edge dropped"
            } else {
                ""
            }
        )?;
        if self.unpaired_edges + self.unpaired_markers > 0 {
            writeln!(
                f,
                "Unpaired: {} edges, {} device triggers",
                self.unpaired_edges, self.unpaired_markers
            )?;
        }
        writeln!(f, "Clock offset: {:.3} ms", self.offset_ms)?;
        writeln!(
            f,
            "Max |difference|: {:.2} ms{}",
            self.max_abs_difference_ms,
            if self.drift_warning {
                " (EXCEEDS THRESHOLD, check data)"
            } else {
                ""
            }
        )?;
        writeln!(f, "Timing difference (ms): {}", self.timing)?;
        writeln!(
            f,
            "Frames: {} (exact {}, interpolated {}, held {}, degenerate {})",
            self.frames,
            self.exact_matches,
            self.interpolated,
            self.clamped,
            self.degenerate_intervals
        )?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
