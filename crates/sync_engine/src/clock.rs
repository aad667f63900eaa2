//! Device → machine clock reconciliation.
//!
//! Baseline model is a single additive offset anchored on the first trigger
//! edge. The segmented model fits offset and scale per run of pairs.

use contracts::{
    AlignmentMode, ClockAlignment, ClockConfig, ClockModel, ClockSegment, ContractError,
    TriggerEdge, TriggerPair,
};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

const SVD_EPS: f64 = 1e-12;

/// Pairs trigger edges with device markers and derives the clock mapping
#[derive(Debug, Clone)]
pub struct ClockAligner {
    config: ClockConfig,
}

impl ClockAligner {
    pub fn new(config: ClockConfig) -> Self {
        Self { config }
    }

    /// Align `edges` (machine clock) with `markers` (device clock)
    ///
    /// # Errors
    /// - `EdgeCountMismatch` in strict mode when the counts differ
    /// - `CannotAlign` when nothing can be paired
    pub fn align(
        &self,
        edges: &[TriggerEdge],
        markers: &[f64],
    ) -> Result<ClockAlignment, ContractError> {
        let paired = self.paired_count(edges.len(), markers.len())?;
        let unpaired_edges = edges.len() - paired;
        let unpaired_markers = markers.len() - paired;
        let edges = &edges[..paired];
        let markers = &markers[..paired];

        let segments = match self.config.model {
            ClockModel::Offset => vec![self.offset_segment(edges, markers)],
            ClockModel::SegmentedScale => self.fit_segments(edges, markers),
        };

        let mut alignment = ClockAlignment {
            offset_ms: segments
                .first()
                .map(|s| s.intercept_ms)
                .unwrap_or(self.config.offset_constant_ms),
            per_edge_difference: Vec::with_capacity(paired),
            max_abs_difference: 0.0,
            pairs: Vec::with_capacity(paired),
            segments,
            drift_warning: false,
            unpaired_edges,
            unpaired_markers,
        };

        for (edge, &device_ms) in edges.iter().zip(markers) {
            let mapped_ms = alignment.map_device_time(device_ms);
            let difference_ms = edge.timestamp_ms - mapped_ms;
            alignment.per_edge_difference.push(difference_ms);
            alignment.pairs.push(TriggerPair {
                machine_ms: edge.timestamp_ms,
                device_ms,
                mapped_ms,
                difference_ms,
            });
        }

        alignment.max_abs_difference = alignment
            .per_edge_difference
            .iter()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));

        let drift = alignment.max_abs_difference - self.config.offset_constant_ms;
        if drift > self.config.drift_threshold_ms {
            alignment.drift_warning = true;
            warn!(
                max_abs_difference_ms = alignment.max_abs_difference,
                threshold_ms = self.config.drift_threshold_ms,
                "trigger timing difference exceeds threshold, data should be checked"
            );
        }

        debug!(
            offset_ms = alignment.offset_ms,
            pairs = paired,
            segments = alignment.segments.len(),
            max_abs_difference_ms = alignment.max_abs_difference,
            "clock aligned"
        );
        Ok(alignment)
    }

    fn paired_count(&self, edges: usize, markers: usize) -> Result<usize, ContractError> {
        if edges != markers {
            match self.config.mode {
                AlignmentMode::Strict => {
                    return Err(ContractError::EdgeCountMismatch {
                        edges,
                        device_triggers: markers,
                    });
                }
                AlignmentMode::BestEffort => {
                    warn!(
                        edges,
                        device_triggers = markers,
                        paired = edges.min(markers),
                        "trigger count mismatch, pairing common prefix"
                    );
                }
            }
        }

        let paired = edges.min(markers);
        if paired == 0 {
            return Err(ContractError::cannot_align(format!(
                "nothing to pair: {edges} edges, {markers} device triggers"
            )));
        }
        Ok(paired)
    }

    /// `offset = min(edge) + offset_constant`
    fn offset_segment(&self, edges: &[TriggerEdge], markers: &[f64]) -> ClockSegment {
        let first_edge = edges
            .iter()
            .map(|e| e.timestamp_ms)
            .fold(f64::INFINITY, f64::min);
        ClockSegment {
            device_start_ms: markers.first().copied().unwrap_or(0.0),
            intercept_ms: first_edge + self.config.offset_constant_ms,
            scale: 1.0,
        }
    }

    fn fit_segments(&self, edges: &[TriggerEdge], markers: &[f64]) -> Vec<ClockSegment> {
        let count = self.config.scale_segments.clamp(1, edges.len());
        let base = edges.len() / count;
        let extra = edges.len() % count;

        let mut segments = Vec::with_capacity(count);
        let mut start = 0;
        for seg in 0..count {
            let len = base + usize::from(seg < extra);
            let range = start..start + len;
            let machine: Vec<f64> = edges[range.clone()].iter().map(|e| e.timestamp_ms).collect();
            let (intercept, scale) = fit_line(&markers[range.clone()], &machine);
            segments.push(ClockSegment {
                device_start_ms: markers[range.start],
                intercept_ms: intercept + self.config.offset_constant_ms,
                scale,
            });
            start = range.end;
        }
        segments
    }
}

/// Least-squares `machine = intercept + scale * device`
///
/// Fewer than two points or no spread in device time fixes the scale at 1.
pub fn fit_line(device: &[f64], machine: &[f64]) -> (f64, f64) {
    let n = device.len().min(machine.len());
    if n == 0 {
        return (0.0, 1.0);
    }

    let mean_d = device[..n].iter().sum::<f64>() / n as f64;
    let spread = device[..n].iter().map(|d| (d - mean_d).powi(2)).sum::<f64>();
    if n < 2 || spread <= SVD_EPS {
        let intercept = (0..n).map(|i| machine[i] - device[i]).sum::<f64>() / n as f64;
        return (intercept, 1.0);
    }

    // 以均值为中心求解，避免大时间戳下的病态矩阵
    let design = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { device[r] - mean_d });
    let target = DVector::from_column_slice(&machine[..n]);
    match design.svd(true, true).solve(&target, SVD_EPS) {
        Ok(solution) => {
            let scale = solution[1];
            (solution[0] - scale * mean_d, scale)
        }
        Err(_) => {
            let intercept = (0..n).map(|i| machine[i] - device[i]).sum::<f64>() / n as f64;
            (intercept, 1.0)
        }
    }
}
