//! Sync engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::TriggerSource;

/// Sync engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncEngineConfig {
    /// Handling of the edge at the end of the machine stream
    #[serde(default)]
    pub trailing_edge: TrailingEdgePolicy,

    /// Device timestamps paired with the trigger edges
    #[serde(default)]
    pub trigger_source: TriggerSource,

    /// Clock reconciliation parameters
    #[serde(default)]
    pub clock: ClockConfig,
}

/// Trailing spurious edge handling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingEdgePolicy {
    /// Drop an edge found on the last sample of the stream
    #[default]
    FinalSample,
    /// Always drop the last detected edge
    Always,
    /// Keep every edge
    Never,
}

/// Edge/marker pairing strictness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMode {
    /// Counts must match exactly
    #[default]
    Strict,
    /// Pair the common prefix and warn
    BestEffort,
}

/// Device → machine clock model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockModel {
    /// Additive offset only
    #[default]
    Offset,
    /// Least-squares offset and scale per segment
    SegmentedScale,
}

/// Clock reconciliation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Systematic lag compensation (ms), deployment tuned
    #[serde(default = "default_offset_constant")]
    pub offset_constant_ms: f64,

    /// Drift beyond which a data-quality warning is raised (ms)
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold_ms: f64,

    #[serde(default)]
    pub mode: AlignmentMode,

    #[serde(default)]
    pub model: ClockModel,

    /// Segment count for `segmented_scale`
    #[serde(default = "default_scale_segments")]
    pub scale_segments: usize,
}

fn default_offset_constant() -> f64 {
    15.0
}

fn default_drift_threshold() -> f64 {
    100.0
}

fn default_scale_segments() -> usize {
    1
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            offset_constant_ms: default_offset_constant(),
            drift_threshold_ms: default_drift_threshold(),
            mode: AlignmentMode::default(),
            model: ClockModel::default(),
            scale_segments: default_scale_segments(),
        }
    }
}
