//! DeviceTriggerRecord - Device trigger/ADC log (Input B) data model
//!
//! One record per captured frame, device clock domain.

use serde::{Deserialize, Serialize};

/// Number of ADC channels sampled by the trigger controller
pub const ADC_CHANNELS: usize = 4;

/// Linear calibration of one ADC channel: `gain * volts + offset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdcCalibration {
    /// Output column name, unit in brackets (e.g. `ADC_Force [kN]`)
    pub name: String,

    #[serde(default = "default_gain")]
    pub gain: f64,

    #[serde(default)]
    pub offset: f64,
}

fn default_gain() -> f64 {
    1.0
}

impl AdcCalibration {
    pub fn new(name: impl Into<String>, gain: f64, offset: f64) -> Self {
        Self {
            name: name.into(),
            gain,
            offset,
        }
    }

    #[inline]
    pub fn apply(&self, volts: f64) -> f64 {
        volts * self.gain + self.offset
    }

    /// `adc1 [V]` .. `adc4 [V]`, unity gain
    pub fn defaults() -> Vec<AdcCalibration> {
        (1..=ADC_CHANNELS)
            .map(|ch| AdcCalibration::new(format!("adc{ch} [V]"), 1.0, 0.0))
            .collect()
    }
}

/// Device-local bookkeeping fields, copied verbatim into aligned rows
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceAux {
    /// Frame counter of the ADC sub-sampling loop
    pub adc_frame_count: u64,

    /// Number of frame-rate stage changes so far
    pub fps_stage_change_count: u64,

    /// Device time of the latest frame-rate stage change (ms)
    pub fps_stage_change_time_ms: f64,

    /// Diagnostic field (sample delta)
    pub diagnostic: f64,
}

/// One captured frame as logged by the trigger controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTriggerRecord {
    /// Trigger frame counter
    pub frame_index: u64,

    /// Device clock, milliseconds since the controller started recording
    pub device_timestamp_ms: f64,

    /// Raw ADC voltages
    pub adc_values: [f64; ADC_CHANNELS],

    /// Calibrated ADC values, same order as `adc_values`
    pub calibrated: [f64; ADC_CHANNELS],

    pub aux: DeviceAux,
}

/// Which device-side timestamps pair with the machine trigger edges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// One marker per captured frame (its device timestamp)
    #[default]
    FrameTime,
    /// Distinct frame-rate stage change times, in order of appearance
    StageChangeTime,
}

/// Parsed device log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLog {
    /// One record per captured frame, capture order
    pub records: Vec<DeviceTriggerRecord>,

    /// Raw rows read (several per frame when the ADC sub-samples)
    pub raw_rows: usize,

    /// Calibrated ADC column names, channel order
    pub adc_names: Vec<String>,
}

impl DeviceLog {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Device-clock timestamps to be paired 1:1 with machine trigger edges
    pub fn trigger_markers(&self, source: TriggerSource) -> Vec<f64> {
        match source {
            TriggerSource::FrameTime => self
                .records
                .iter()
                .map(|r| r.device_timestamp_ms)
                .collect(),
            TriggerSource::StageChangeTime => {
                let mut markers: Vec<f64> = Vec::new();
                for record in &self.records {
                    let t = record.aux.fps_stage_change_time_ms;
                    if !markers.contains(&t) {
                        markers.push(t);
                    }
                }
                markers
            }
        }
    }
}
