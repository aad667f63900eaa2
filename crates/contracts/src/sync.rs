//! Sync Engine outputs
//!
//! Trigger edges, clock alignment, and the frame-aligned trace.

use serde::{Deserialize, Serialize};

use crate::{DeviceTriggerRecord, MachineStream};

/// Rising transition of the trigger channel (machine clock)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerEdge {
    /// Timestamp of the first sample above zero (ms)
    pub timestamp_ms: f64,

    /// Row of that sample in the machine stream
    pub row_index: usize,
}

/// One edge paired with its device-side trigger marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerPair {
    /// Machine clock time of the edge (ms)
    pub machine_ms: f64,

    /// Device clock time of the marker (ms)
    pub device_ms: f64,

    /// Device time mapped onto the machine clock (ms)
    pub mapped_ms: f64,

    /// `machine_ms - mapped_ms`
    pub difference_ms: f64,
}

/// Device → machine clock mapping over one run of device time
///
/// `machine = intercept_ms + scale * device`, with the systematic lag
/// constant already folded into `intercept_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockSegment {
    /// First device time covered by this segment (ms)
    pub device_start_ms: f64,

    pub intercept_ms: f64,

    pub scale: f64,
}

impl ClockSegment {
    #[inline]
    pub fn map(&self, device_ms: f64) -> f64 {
        self.intercept_ms + self.scale * device_ms
    }
}

/// Result of reconciling the device clock with the machine clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockAlignment {
    /// Additive device → machine correction (ms)
    pub offset_ms: f64,

    /// `edge_i - mapped_device_i` for each pair
    pub per_edge_difference: Vec<f64>,

    /// `max(|per_edge_difference|)`
    pub max_abs_difference: f64,

    /// Paired edges and markers, in order
    pub pairs: Vec<TriggerPair>,

    /// Mapping segments, ascending by `device_start_ms`; never empty
    pub segments: Vec<ClockSegment>,

    /// Drift exceeded the configured threshold
    pub drift_warning: bool,

    /// Edges left without a marker (best-effort mode only)
    pub unpaired_edges: usize,

    /// Markers left without an edge (best-effort mode only)
    pub unpaired_markers: usize,
}

impl ClockAlignment {
    /// Map a device clock timestamp onto the machine clock
    pub fn map_device_time(&self, device_ms: f64) -> f64 {
        let segment = self
            .segments
            .iter()
            .rev()
            .find(|s| s.device_start_ms <= device_ms)
            .or_else(|| self.segments.first());

        match segment {
            Some(seg) => seg.map(device_ms),
            None => device_ms + self.offset_ms,
        }
    }
}

/// A device frame record placed on the machine clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEvent {
    /// Machine-clock-comparable timestamp (ms)
    pub timestamp_ms: f64,

    pub record: DeviceTriggerRecord,
}

/// How the channel values of an aligned frame were obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameValueSource {
    /// Frame time coincides with a genuine row, values copied
    Exact,
    /// Linear interpolation between the bracketing genuine rows
    Interpolated { ratio: f64 },
    /// Outside the machine stream, values held from the nearest row
    Held,
}

/// Synthetic row inserted at a frame's machine-clock timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedFrameRow {
    pub frame_index: u64,

    /// Machine clock (ms)
    pub timestamp_ms: f64,

    /// Non-trigger channel values, schema order
    pub channels: Vec<f64>,

    /// Trigger value held from the preceding genuine row
    pub trigger: f64,

    pub source: FrameValueSource,

    /// Device record, copied verbatim
    pub device: DeviceTriggerRecord,
}

/// Entry of the merged ascending-time sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEntry {
    /// Index into `MachineStream::rows`
    Genuine(usize),
    /// Index into `AlignedTrace::frames`
    Frame(usize),
}

/// Data-quality counters collected while aligning frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentQuality {
    pub exact_matches: usize,
    pub interpolated: usize,
    pub degenerate_intervals: usize,
    pub clamped: usize,
    pub reordered_events: bool,
}

/// Merged machine + frame sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTrace {
    /// Genuine rows and frames, ascending time
    pub entries: Vec<TraceEntry>,

    /// Aligned frames, capture order
    pub frames: Vec<AlignedFrameRow>,

    pub quality: AlignmentQuality,
}

impl AlignedTrace {
    /// Timestamp (ms) of a merged entry
    pub fn timestamp_of(&self, entry: TraceEntry, stream: &MachineStream) -> f64 {
        match entry {
            TraceEntry::Genuine(i) => stream.rows[i].timestamp_ms,
            TraceEntry::Frame(k) => self.frames[k].timestamp_ms,
        }
    }
}

/// Data-quality counters from trigger edge extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeQuality {
    /// Edges no more than two samples after the previous one
    pub adjacent_edges: usize,

    /// Trailing spurious edge removed
    pub dropped_trailing: bool,
}

/// Everything one synchronization run produced, ready for output assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub edges: Vec<TriggerEdge>,
    pub edge_quality: EdgeQuality,
    pub alignment: ClockAlignment,
    pub trace: AlignedTrace,
}
