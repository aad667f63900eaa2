//! Input B: trigger controller log
//!
//! Ten fields per row. The controller sub-samples its ADC between triggers,
//! so a frame spans several rows; the first row of each frame is kept.

use std::path::Path;

use contracts::{
    delimiter_char, AdcCalibration, DeviceAux, DeviceConfig, DeviceLog, DeviceTriggerRecord,
    ADC_CHANNELS,
};
use metrics::counter;
use tracing::{debug, instrument};

use crate::delimited::DelimitedText;
use crate::error::Result;

pub(crate) const ARTIFACT: &str = "device log";

/// Column names of the controller log, field order
pub const DEVICE_COLUMNS: [&str; 10] = [
    "trigger_frame_count",
    "adc_frame_count",
    "test_run_time",
    "fps_change_count",
    "fps_change_time",
    "adc.ch1_volts",
    "adc.ch2_volts",
    "adc.ch3_volts",
    "adc.ch4_volts",
    "data_delta",
];

/// Load and parse a device log file
#[instrument(name = "load_device_log", skip(config), fields(path = %path.display()))]
pub fn load_device_log(path: &Path, config: &DeviceConfig) -> Result<DeviceLog> {
    let delimiter = delimiter_char(&config.delimiter).unwrap_or(',');
    let text = DelimitedText::read(ARTIFACT, path, delimiter)?;
    let log = parse(&text, config)?;

    counter!("dic_sync_rows_loaded_total", "input" => "device").increment(log.raw_rows as u64);
    debug!(
        frames = log.len(),
        raw_rows = log.raw_rows,
        "device log loaded"
    );
    Ok(log)
}

/// Parse device log text already in memory
pub fn parse_device_log(content: &str, source: &Path, config: &DeviceConfig) -> Result<DeviceLog> {
    let delimiter = delimiter_char(&config.delimiter).unwrap_or(',');
    let text = DelimitedText::from_content(ARTIFACT, source, content, delimiter);
    parse(&text, config)
}

fn parse(text: &DelimitedText, config: &DeviceConfig) -> Result<DeviceLog> {
    let calibrations: Vec<AdcCalibration> = (0..ADC_CHANNELS)
        .map(|ch| {
            config.adc.get(ch).cloned().unwrap_or_else(|| {
                AdcCalibration::new(format!("adc{} [V]", ch + 1), 1.0, 0.0)
            })
        })
        .collect();

    let mut records: Vec<DeviceTriggerRecord> = Vec::new();
    let mut raw_rows = 0usize;
    let mut previous_frame: Option<u64> = None;

    let skip = usize::from(config.has_header);
    for record in text.records().skip(skip) {
        if record.fields.len() != DEVICE_COLUMNS.len() {
            return Err(text.error(
                record.line,
                format!(
                    "expected {} fields, found {}",
                    DEVICE_COLUMNS.len(),
                    record.fields.len()
                ),
            ));
        }
        raw_rows += 1;

        let frame_index = text.counter(&record, 0, DEVICE_COLUMNS[0])?;
        if previous_frame == Some(frame_index) {
            continue;
        }
        previous_frame = Some(frame_index);

        let device_timestamp_ms = text.number(&record, 2, DEVICE_COLUMNS[2])?;
        if let Some(last) = records.last() {
            if device_timestamp_ms < last.device_timestamp_ms {
                return Err(text.error(
                    record.line,
                    format!(
                        "frame {frame_index} at {device_timestamp_ms} ms precedes frame {} at {} ms",
                        last.frame_index, last.device_timestamp_ms
                    ),
                ));
            }
        }

        let mut adc_values = [0.0; ADC_CHANNELS];
        let mut calibrated = [0.0; ADC_CHANNELS];
        for ch in 0..ADC_CHANNELS {
            adc_values[ch] = text.number(&record, 5 + ch, DEVICE_COLUMNS[5 + ch])?;
            calibrated[ch] = calibrations[ch].apply(adc_values[ch]);
        }

        records.push(DeviceTriggerRecord {
            frame_index,
            device_timestamp_ms,
            adc_values,
            calibrated,
            aux: DeviceAux {
                adc_frame_count: text.counter(&record, 1, DEVICE_COLUMNS[1])?,
                fps_stage_change_count: text.counter(&record, 3, DEVICE_COLUMNS[3])?,
                fps_stage_change_time_ms: text.number(&record, 4, DEVICE_COLUMNS[4])?,
                diagnostic: text.number(&record, 9, DEVICE_COLUMNS[9])?,
            },
        });
    }

    Ok(DeviceLog {
        records,
        raw_rows,
        adc_names: calibrations.into_iter().map(|c| c.name).collect(),
    })
}
