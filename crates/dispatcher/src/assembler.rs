//! OutputAssembler - renders the synchronized run into delimited artifacts
//!
//! Artifacts of one run:
//! - `SyncedMachineData_<id>.csv`: genuine rows and frames, ascending time
//! - `MatchID_AcquisitionFile_<id>.csv`: one row per frame, primary camera
//! - `MatchID_AcquisitionFile_<id>_CAM_<name>.csv`: one per secondary camera
//! - `Trigger_Timing_Differences_<id>.csv`: per-edge timing report

use contracts::{
    delimiter_char, AlignedFrameRow, Artifact, ArtifactKind, CameraFrames, ContractError,
    DeviceLog, DeviceTriggerRecord, MachineStream, SyncBlueprint, SyncOutcome, TraceEntry,
    ADC_CHANNELS,
};
use tracing::{debug, instrument};

use crate::format::{format_counter, format_number};

/// Export delimiter fixed by the correlation tool's import format
pub const EXPORT_DELIMITER: char = ';';

const DIAGNOSTIC_DECIMALS: usize = 2;

/// Device columns appended to the full trace
const TRACE_DEVICE_HEADERS: [&str; 10] = [
    "Frame []",
    "adc_frame_count []",
    "test_run_time [msec]",
    "fps_change_count []",
    "fps_change_time [msec]",
    "adc.ch1_volts [V]",
    "adc.ch2_volts [V]",
    "adc.ch3_volts [V]",
    "adc.ch4_volts [V]",
    "data_delta []",
];

/// Output assembly settings
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub test_id: String,
    pub trace_delimiter: char,
    /// Machine channels in the export, by name or header; empty = all
    pub export_channels: Vec<String>,
    pub include_device_columns: bool,
    pub decimals: usize,
}

impl AssemblerConfig {
    pub fn from_blueprint(blueprint: &SyncBlueprint) -> Self {
        Self {
            test_id: blueprint.test_id(),
            trace_delimiter: delimiter_char(&blueprint.output.trace_delimiter).unwrap_or(','),
            export_channels: blueprint.output.export_channels.clone(),
            include_device_columns: blueprint.output.include_device_columns,
            decimals: blueprint.output.decimals,
        }
    }
}

/// Builds the artifacts of one run; nothing is written here
#[derive(Debug, Clone)]
pub struct OutputAssembler {
    config: AssemblerConfig,
}

impl OutputAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn trace_file_name(&self) -> String {
        format!("SyncedMachineData_{}.csv", self.config.test_id)
    }

    pub fn export_file_name(&self, camera: Option<&str>) -> String {
        match camera {
            None => format!("MatchID_AcquisitionFile_{}.csv", self.config.test_id),
            Some(name) => format!(
                "MatchID_AcquisitionFile_{}_CAM_{name}.csv",
                self.config.test_id
            ),
        }
    }

    pub fn diagnostics_file_name(&self) -> String {
        format!("Trigger_Timing_Differences_{}.csv", self.config.test_id)
    }

    /// Render every artifact
    ///
    /// `cameras[0]` is the primary camera.
    ///
    /// # Errors
    /// - `FilenameCountMismatch` when a camera lists a different number of frames
    /// - `ExportRowMismatch` when the export would not be one row per frame
    /// - `ConfigValidation` for an export channel missing from the stream
    #[instrument(
        name = "output_assemble",
        skip_all,
        fields(test_id = %self.config.test_id, cameras = cameras.len())
    )]
    pub fn assemble(
        &self,
        stream: &MachineStream,
        device: &DeviceLog,
        outcome: &SyncOutcome,
        cameras: &[CameraFrames],
    ) -> Result<Vec<Artifact>, ContractError> {
        let frames = &outcome.trace.frames;
        if frames.len() != device.len() {
            return Err(ContractError::ExportRowMismatch {
                rows: frames.len(),
                frames: device.len(),
            });
        }
        for camera in cameras {
            if camera.len() != frames.len() {
                return Err(ContractError::FilenameCountMismatch {
                    camera: camera.camera.clone(),
                    filenames: camera.len(),
                    frames: frames.len(),
                });
            }
        }
        if cameras.is_empty() {
            return Err(ContractError::Other("no camera frame list to export".into()));
        }

        let export_columns = self.export_columns(stream)?;

        let mut artifacts = Vec::with_capacity(cameras.len() + 2);
        artifacts.push(self.render_trace(stream, device, outcome));
        for (idx, camera) in cameras.iter().enumerate() {
            let name = (idx > 0).then_some(camera.camera.as_str());
            artifacts.push(self.render_export(
                stream,
                device,
                frames,
                camera,
                &export_columns,
                self.export_file_name(name),
            )?);
        }
        artifacts.push(self.render_diagnostics(outcome));

        debug!(artifacts = artifacts.len(), "artifacts assembled");
        Ok(artifacts)
    }

    /// Schema positions of the exported machine channels
    fn export_columns(&self, stream: &MachineStream) -> Result<Vec<usize>, ContractError> {
        if self.config.export_channels.is_empty() {
            return Ok((0..stream.schema.len()).collect());
        }
        self.config
            .export_channels
            .iter()
            .map(|key| {
                stream.schema.index_of(key).ok_or_else(|| {
                    ContractError::config_validation(
                        "output.export_channels",
                        format!("channel '{key}' not found in the machine stream"),
                    )
                })
            })
            .collect()
    }

    fn render_trace(
        &self,
        stream: &MachineStream,
        device: &DeviceLog,
        outcome: &SyncOutcome,
    ) -> Artifact {
        let schema = &stream.schema;
        let decimals = self.config.decimals;

        let mut header: Vec<String> = vec!["Time [sec]".to_string()];
        header.extend(schema.source_order().map(|slot| match slot {
            Some(i) => schema.channels[i].header(),
            None => schema.trigger.header(),
        }));
        header.extend(TRACE_DEVICE_HEADERS.iter().map(|h| h.to_string()));
        header.extend(device.adc_names.iter().cloned());
        let device_width = TRACE_DEVICE_HEADERS.len() + device.adc_names.len();

        let mut table = Table::new(self.config.trace_delimiter, header);
        for entry in &outcome.trace.entries {
            let mut cells = Vec::with_capacity(table.width());
            match *entry {
                TraceEntry::Genuine(i) => {
                    let row = &stream.rows[i];
                    cells.push(format_number(row.timestamp_ms / 1000.0, decimals));
                    cells.extend(schema.source_order().map(|slot| {
                        let value = slot.map_or(row.trigger, |c| row.channels[c]);
                        format_number(value, decimals)
                    }));
                    cells.extend(std::iter::repeat_n(String::new(), device_width));
                }
                TraceEntry::Frame(k) => {
                    let frame = &outcome.trace.frames[k];
                    cells.push(format_number(frame.timestamp_ms / 1000.0, decimals));
                    cells.extend(schema.source_order().map(|slot| {
                        let value = slot.map_or(frame.trigger, |c| frame.channels[c]);
                        format_number(value, decimals)
                    }));
                    cells.extend(trace_device_cells(&frame.device, decimals));
                    cells.extend(
                        frame.device.calibrated[..device.adc_names.len().min(ADC_CHANNELS)]
                            .iter()
                            .map(|v| format_number(*v, decimals)),
                    );
                }
            }
            table.push(cells);
        }

        table.into_artifact(ArtifactKind::Trace, self.trace_file_name())
    }

    fn render_export(
        &self,
        stream: &MachineStream,
        device: &DeviceLog,
        frames: &[AlignedFrameRow],
        camera: &CameraFrames,
        columns: &[usize],
        file_name: String,
    ) -> Result<Artifact, ContractError> {
        let schema = &stream.schema;
        let decimals = self.config.decimals;

        let mut header = vec!["File".to_string(), "TimeStamp".to_string()];
        header.extend(columns.iter().map(|&c| schema.channels[c].header()));
        if self.config.include_device_columns {
            header.extend(
                [
                    "Frame []",
                    "test_run_time [msec]",
                    "fps_change_count []",
                    "adc.ch1_volts [V]",
                    "adc.ch2_volts [V]",
                    "adc.ch3_volts [V]",
                    "adc.ch4_volts [V]",
                ]
                .iter()
                .map(|h| h.to_string()),
            );
            header.extend(device.adc_names.iter().cloned());
        }

        let mut table = Table::new(EXPORT_DELIMITER, header);
        for (frame, file) in frames.iter().zip(&camera.records) {
            let mut cells = vec![
                file.filename.clone(),
                format_number(frame.timestamp_ms / 1000.0, decimals),
            ];
            cells.extend(columns.iter().map(|&c| format_number(frame.channels[c], decimals)));
            if self.config.include_device_columns {
                let record = &frame.device;
                cells.push(format_counter(record.frame_index));
                cells.push(format_number(record.device_timestamp_ms, decimals));
                cells.push(format_counter(record.aux.fps_stage_change_count));
                cells.extend(record.adc_values.iter().map(|v| format_number(*v, decimals)));
                cells.extend(
                    record.calibrated[..device.adc_names.len().min(ADC_CHANNELS)]
                        .iter()
                        .map(|v| format_number(*v, decimals)),
                );
            }
            table.push(cells);
        }

        if table.rows != frames.len() {
            return Err(ContractError::ExportRowMismatch {
                rows: table.rows,
                frames: frames.len(),
            });
        }

        Ok(table.into_artifact(
            ArtifactKind::Export {
                camera: camera.camera.clone(),
            },
            file_name,
        ))
    }

    fn render_diagnostics(&self, outcome: &SyncOutcome) -> Artifact {
        let decimals = self.config.decimals;
        let header = [
            "Index",
            "MachineTrigTime [msec]",
            "DeviceTrigTime [msec]",
            "Difference [msec]",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();

        let mut table = Table::new(',', header);
        for (idx, pair) in outcome.alignment.pairs.iter().enumerate() {
            table.push(vec![
                idx.to_string(),
                format_number(pair.machine_ms, decimals),
                format_number(pair.mapped_ms, decimals),
                format_number(pair.difference_ms, DIAGNOSTIC_DECIMALS),
            ]);
        }
        table.into_artifact(ArtifactKind::Diagnostics, self.diagnostics_file_name())
    }
}

fn trace_device_cells(record: &DeviceTriggerRecord, decimals: usize) -> Vec<String> {
    let mut cells = vec![
        format_counter(record.frame_index),
        format_counter(record.aux.adc_frame_count),
        format_number(record.device_timestamp_ms, decimals),
        format_counter(record.aux.fps_stage_change_count),
        format_number(record.aux.fps_stage_change_time_ms, decimals),
    ];
    cells.extend(record.adc_values.iter().map(|v| format_number(*v, decimals)));
    cells.push(format_number(record.aux.diagnostic, decimals));
    cells
}

/// Delimited text being built row by row
struct Table {
    delimiter: char,
    width: usize,
    text: String,
    rows: usize,
}

impl Table {
    fn new(delimiter: char, header: Vec<String>) -> Self {
        let mut table = Self {
            delimiter,
            width: header.len(),
            text: String::new(),
            rows: 0,
        };
        table.write_line(&header);
        table
    }

    fn width(&self) -> usize {
        self.width
    }

    fn push(&mut self, cells: Vec<String>) {
        debug_assert_eq!(cells.len(), self.width);
        self.write_line(&cells);
        self.rows += 1;
    }

    fn write_line(&mut self, cells: &[String]) {
        let mut sep = [0u8; 4];
        let sep = self.delimiter.encode_utf8(&mut sep);
        self.text.push_str(&cells.join(sep));
        self.text.push('\n');
    }

    fn into_artifact(self, kind: ArtifactKind, file_name: String) -> Artifact {
        Artifact {
            kind,
            file_name,
            contents: self.text,
            rows: self.rows,
        }
    }
}
