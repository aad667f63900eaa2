//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 基于临时测试目录的 e2e 测试 (Raw_Data → Synced_Data)
//! - 计数契约与 "无部分输出" 规则

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_default_blueprint_is_valid() {
        let blueprint = contracts::SyncBlueprint::default();
        assert!(config_loader::ConfigLoader::validate(&blueprint).is_ok());
    }
}

/// Synthetic test directories
#[cfg(test)]
mod fixture {
    use std::fs;
    use std::path::{Path, PathBuf};

    use contracts::{ContractError, SyncBlueprint};
    use dispatcher::{AssemblerConfig, DispatchReport, Dispatcher, OutputAssembler};
    use ingestion::{DataLoader, IngestionError};
    use sync_engine::SyncEngine;

    pub const TEST_ID: &str = "T1";

    /// Machine stream: one row every 50 ms up to 600 ms, `Force = t / 10`,
    /// trigger pulses at 100, 300 and 500 ms
    pub fn machine_stream(pulses_ms: &[u32]) -> String {
        let mut text = String::from("Time\tForce\tDIC.trigger\tJaw\n(sec)\t(kN)\t(lbloo)\t()\n");
        for step in 0..=12u32 {
            let t_ms = step * 50;
            let trigger = u8::from(pulses_ms.contains(&t_ms));
            text.push_str(&format!(
                "{}\t{}\t{trigger}\t{}\n",
                f64::from(t_ms) / 1000.0,
                f64::from(t_ms) / 10.0,
                step % 2
            ));
        }
        text
    }

    /// Device log: two sub-sampled rows per frame, frames 200 ms apart
    pub fn device_log(frames: u32) -> String {
        let mut text = String::from(
            "frame,adc_frame_count,time_ms,fps_count,fps_time_ms,a1,a2,a3,a4,delta\n",
        );
        for frame in 0..frames {
            let t = frame * 200;
            text.push_str(&format!("{frame},{},{t},0,0,0.1,0.2,0.3,0.5,0\n", frame * 2));
            text.push_str(&format!(
                "{frame},{},{},0,0,0.1,0.2,0.3,0.5,5\n",
                frame * 2 + 1,
                t + 5
            ));
        }
        text
    }

    pub fn camera_list(frames: u32, camera: &str) -> String {
        let mut text = String::from("Frame\tFrame_Name\n");
        for frame in 0..frames {
            text.push_str(&format!("{frame}\t{TEST_ID}_{camera}_{frame:04}.tif\n"));
        }
        text
    }

    /// `<tmp>/T1/Raw_Data/{T1.d01, Arduino_Serial_Output_T1.txt, T1_CAM_<n>.txt}`
    pub fn write_test_dir(
        root: &Path,
        machine: &str,
        device: &str,
        cameras: &[(&str, String)],
    ) -> PathBuf {
        let test_dir = root.join(TEST_ID);
        let raw = test_dir.join("Raw_Data");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join(format!("{TEST_ID}.d01")), machine).unwrap();
        fs::write(raw.join(format!("Arduino_Serial_Output_{TEST_ID}.txt")), device).unwrap();
        for (name, contents) in cameras {
            fs::write(raw.join(format!("{TEST_ID}_CAM_{name}.txt")), contents).unwrap();
        }
        test_dir
    }

    pub fn blueprint(test_dir: &Path) -> SyncBlueprint {
        let mut blueprint = SyncBlueprint::default();
        blueprint.test.dir = Some(test_dir.to_path_buf());
        blueprint
    }

    /// Failure at any pipeline stage
    #[derive(Debug)]
    pub enum RunError {
        Ingestion(IngestionError),
        Contract(ContractError),
        Dispatch(dispatcher::DispatcherError),
    }

    impl RunError {
        pub fn contract(&self) -> Option<&ContractError> {
            match self {
                Self::Contract(e) => Some(e),
                _ => None,
            }
        }
    }

    /// load → sync → assemble → dispatch, as the binary runs it
    pub fn run(blueprint: &SyncBlueprint) -> Result<DispatchReport, RunError> {
        let inputs = DataLoader::load(blueprint).map_err(RunError::Ingestion)?;
        let outcome = SyncEngine::new(blueprint.to_sync_engine_config())
            .run(&inputs.machine, &inputs.device)
            .map_err(RunError::Contract)?;
        let artifacts = OutputAssembler::new(AssemblerConfig::from_blueprint(blueprint))
            .assemble(&inputs.machine, &inputs.device, &outcome, &inputs.cameras)
            .map_err(RunError::Contract)?;
        let mut dispatcher = Dispatcher::from_configs(&blueprint.output.sinks, &blueprint.output_dir())
            .map_err(RunError::Dispatch)?;
        dispatcher.dispatch(&artifacts).map_err(RunError::Dispatch)
    }

    pub fn read_output(test_dir: &Path, file: &str) -> String {
        fs::read_to_string(test_dir.join("Synced_Data").join(file)).unwrap()
    }

    /// Output file names, sorted; empty when the directory does not exist
    pub fn output_files(test_dir: &Path) -> Vec<String> {
        let Ok(entries) = fs::read_dir(test_dir.join("Synced_Data")) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Parse one delimited data line into numbers, skipping `skip` leading cells
    pub fn numbers(line: &str, delimiter: char, skip: usize) -> Vec<f64> {
        line.split(delimiter)
            .skip(skip)
            .map(|cell| cell.parse::<f64>().unwrap())
            .collect()
    }

    pub fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }
}

/// Reference scenarios on in-memory data
#[cfg(test)]
mod scenario_tests {
    use contracts::{
        Channel, ChannelSchema, ClockConfig, DeviceAux, DeviceTriggerRecord, FrameEvent,
        FrameValueSource, MachineStream, SampleRow, TrailingEdgePolicy, TriggerEdge,
    };
    use sync_engine::{ClockAligner, FrameAligner, TriggerEdgeExtractor};

    use crate::fixture::assert_close;

    fn stream(rows: &[(f64, f64, f64)]) -> MachineStream {
        MachineStream {
            schema: ChannelSchema {
                channels: vec![Channel::new("chA", "")],
                trigger: Channel::new("DIC.trigger", ""),
                trigger_position: 0,
            },
            rows: rows
                .iter()
                .map(|&(t, trig, a)| SampleRow {
                    timestamp_ms: t,
                    channels: vec![a],
                    trigger: trig,
                })
                .collect(),
        }
    }

    fn record(frame_index: u64, t: f64) -> DeviceTriggerRecord {
        DeviceTriggerRecord {
            frame_index,
            device_timestamp_ms: t,
            adc_values: [0.0; 4],
            calibrated: [0.0; 4],
            aux: DeviceAux::default(),
        }
    }

    #[test]
    fn scenario_single_rising_edge() {
        let s = stream(&[(0.0, 0.0, 10.0), (100.0, 1.0, 20.0), (200.0, 0.0, 30.0)]);
        let (edges, _) = TriggerEdgeExtractor::new(TrailingEdgePolicy::FinalSample)
            .extract(&s)
            .unwrap();
        assert_eq!(
            edges,
            vec![TriggerEdge {
                timestamp_ms: 100.0,
                row_index: 1
            }]
        );
    }

    #[test]
    fn scenario_interpolated_channel_value() {
        let s = stream(&[(0.0, 0.0, 10.0), (100.0, 1.0, 20.0), (200.0, 0.0, 30.0)]);
        let events = vec![FrameEvent {
            timestamp_ms: 150.0,
            record: record(0, 0.0),
        }];
        let trace = FrameAligner.align(&s, &events).unwrap();
        let frame = &trace.frames[0];
        assert_close(frame.channels[0], 25.0);
        assert!(matches!(frame.source, FrameValueSource::Interpolated { .. }));
    }

    #[test]
    fn scenario_offset_anchored_on_first_edge() {
        let edges = [1000.0, 1200.0]
            .iter()
            .enumerate()
            .map(|(i, &t)| TriggerEdge {
                timestamp_ms: t,
                row_index: i + 1,
            })
            .collect::<Vec<_>>();
        let alignment = ClockAligner::new(ClockConfig::default())
            .align(&edges, &[0.0, 200.0])
            .unwrap();

        assert_eq!(alignment.offset_ms, 1015.0);
        assert_eq!(alignment.pairs[0].mapped_ms, 1015.0);
        assert_eq!(alignment.pairs[1].mapped_ms, 1215.0);
        assert_eq!(alignment.per_edge_difference, vec![-15.0, -15.0]);
    }
}

/// Full runs over temporary test directories
#[cfg(test)]
mod e2e_tests {
    use std::fs;

    use std::path::PathBuf;

    use contracts::{AlignmentMode, ContractError, SinkConfig, SinkType};
    use ingestion::DataLoader;
    use observability::SyncSummary;
    use sync_engine::SyncEngine;

    use crate::fixture::*;

    const PULSES: [u32; 3] = [100, 300, 500];

    #[test]
    fn test_e2e_run_summary() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );
        let bp = blueprint(&test_dir);
        let inputs = DataLoader::load(&bp).unwrap();
        let outcome = SyncEngine::new(bp.to_sync_engine_config())
            .run(&inputs.machine, &inputs.device)
            .unwrap();

        let summary = SyncSummary::from_outcome(&outcome);
        assert_eq!(summary.edges, 3);
        assert_eq!(summary.paired, 3);
        assert_eq!(summary.frames, 3);
        assert_close(summary.offset_ms, 115.0);
        assert_close(summary.max_abs_difference_ms, 15.0);
        assert!(!summary.drift_warning);
        // 115/315/515 ms fall between 50 ms samples
        assert_eq!(summary.interpolated, 3);
        assert_eq!(summary.exact_matches + summary.clamped, 0);
        assert_eq!(summary.timing.count, 3);
        assert_close(summary.timing.mean, -15.0);
    }

    #[test]
    fn test_e2e_rerun_with_output_in_raw_dir() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1")), ("2", camera_list(3, "2"))],
        );
        let mut bp = blueprint(&test_dir);
        bp.output.dir = Some(PathBuf::from("Raw_Data"));

        run(&bp).unwrap();
        let raw = test_dir.join("Raw_Data");
        assert!(raw.join("MatchID_AcquisitionFile_T1_CAM_2.csv").exists());
        let first = fs::read_to_string(raw.join("SyncedMachineData_T1.csv")).unwrap();

        // Previous exports must not be picked up as camera lists
        let report = run(&bp).unwrap();
        assert_eq!(report.artifacts, 4);
        let second = fs::read_to_string(raw.join("SyncedMachineData_T1.csv")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_e2e_writes_every_artifact() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );

        let report = run(&blueprint(&test_dir)).unwrap();
        assert_eq!(report.artifacts, 3);

        assert_eq!(
            output_files(&test_dir),
            vec![
                "MatchID_AcquisitionFile_T1.csv",
                "SyncedMachineData_T1.csv",
                "Trigger_Timing_Differences_T1.csv",
            ]
        );
    }

    #[test]
    fn test_e2e_export_row_per_frame() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );
        run(&blueprint(&test_dir)).unwrap();

        let export = read_output(&test_dir, "MatchID_AcquisitionFile_T1.csv");
        let lines: Vec<&str> = export.lines().collect();
        assert_eq!(lines.len(), 1 + 3);
        assert!(lines[0].starts_with("File;TimeStamp;Force [kN];Jaw [];Frame []"));

        // offset = first edge (100) + 15, frames at device 0/200/400 ms
        for (k, line) in lines[1..].iter().enumerate() {
            assert!(line.starts_with(&format!("T1_1_{k:04}.tif;")));
            let values = numbers(line, ';', 1);
            let t_ms = 115.0 + 200.0 * k as f64;
            assert_close(values[0], t_ms / 1000.0);
            assert_close(values[1], t_ms / 10.0);
            assert_close(values[3], k as f64);
        }
    }

    #[test]
    fn test_e2e_trace_is_sorted_and_complete() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );
        run(&blueprint(&test_dir)).unwrap();

        let trace = read_output(&test_dir, "SyncedMachineData_T1.csv");
        let lines: Vec<&str> = trace.lines().collect();
        assert!(lines[0].starts_with("Time [sec],Force [kN],DIC.trigger [lbloo],Jaw []"));
        // 13 genuine rows + 3 frames
        assert_eq!(lines.len(), 1 + 13 + 3);

        let times: Vec<f64> = lines[1..]
            .iter()
            .map(|l| l.split(',').next().unwrap().parse().unwrap())
            .collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));

        let frame_rows = lines[1..]
            .iter()
            .filter(|l| !l.split(',').nth(4).unwrap_or("").is_empty())
            .count();
        assert_eq!(frame_rows, 3);
    }

    #[test]
    fn test_e2e_timing_differences() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );
        run(&blueprint(&test_dir)).unwrap();

        let diag = read_output(&test_dir, "Trigger_Timing_Differences_T1.csv");
        let lines: Vec<&str> = diag.lines().collect();
        assert_eq!(
            lines[0],
            "Index,MachineTrigTime [msec],DeviceTrigTime [msec],Difference [msec]"
        );
        assert_eq!(lines.len(), 4);
        for (k, line) in lines[1..].iter().enumerate() {
            let values = numbers(line, ',', 0);
            assert_close(values[0], k as f64);
            assert_close(values[1], 100.0 + 200.0 * k as f64);
            assert_close(values[2], 115.0 + 200.0 * k as f64);
            assert_close(values[3], -15.0);
        }
    }

    #[test]
    fn test_e2e_edge_count_mismatch_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(2),
            &[("1", camera_list(2, "1"))],
        );

        let err = run(&blueprint(&test_dir)).unwrap_err();
        assert!(matches!(
            err.contract(),
            Some(ContractError::EdgeCountMismatch {
                edges: 3,
                device_triggers: 2
            })
        ));
        assert!(output_files(&test_dir).is_empty());
    }

    #[test]
    fn test_e2e_best_effort_pairs_prefix() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(2),
            &[("1", camera_list(2, "1"))],
        );
        let mut bp = blueprint(&test_dir);
        bp.clock.mode = AlignmentMode::BestEffort;

        run(&bp).unwrap();
        let diag = read_output(&test_dir, "Trigger_Timing_Differences_T1.csv");
        assert_eq!(diag.lines().count(), 1 + 2);
        let export = read_output(&test_dir, "MatchID_AcquisitionFile_T1.csv");
        assert_eq!(export.lines().count(), 1 + 2);
    }

    #[test]
    fn test_e2e_filename_count_mismatch_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1")), ("2", camera_list(2, "2"))],
        );

        let err = run(&blueprint(&test_dir)).unwrap_err();
        assert!(matches!(
            err.contract(),
            Some(ContractError::FilenameCountMismatch { camera, .. }) if camera == "2"
        ));
        assert!(output_files(&test_dir).is_empty());
    }

    #[test]
    fn test_e2e_secondary_camera_export() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1")), ("2", camera_list(3, "2"))],
        );
        let mut bp = blueprint(&test_dir);
        bp.camera.primary = Some("2".into());

        run(&bp).unwrap();
        let primary = read_output(&test_dir, "MatchID_AcquisitionFile_T1.csv");
        assert!(primary.lines().nth(1).unwrap().starts_with("T1_2_0000.tif;"));
        let secondary = read_output(&test_dir, "MatchID_AcquisitionFile_T1_CAM_1.csv");
        assert!(secondary.lines().nth(1).unwrap().starts_with("T1_1_0000.tif;"));
    }

    #[test]
    fn test_e2e_rerun_is_byte_identical() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );
        let bp = blueprint(&test_dir);

        run(&bp).unwrap();
        let first: Vec<String> = output_files(&test_dir)
            .iter()
            .map(|f| read_output(&test_dir, f))
            .collect();
        run(&bp).unwrap();
        let second: Vec<String> = output_files(&test_dir)
            .iter()
            .map(|f| read_output(&test_dir, f))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_e2e_failed_rerun_keeps_previous_output() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );
        run(&blueprint(&test_dir)).unwrap();
        let before = read_output(&test_dir, "MatchID_AcquisitionFile_T1.csv");

        // Camera list truncated after the first run
        fs::write(
            test_dir.join("Raw_Data").join("T1_CAM_1.txt"),
            camera_list(2, "1"),
        )
        .unwrap();
        assert!(run(&blueprint(&test_dir)).is_err());

        assert_eq!(read_output(&test_dir, "MatchID_AcquisitionFile_T1.csv"), before);
        assert!(output_files(&test_dir).iter().all(|f| !f.ends_with(".partial")));
    }

    #[test]
    fn test_e2e_log_only_sinks_write_nothing() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );
        let mut bp = blueprint(&test_dir);
        bp.output.sinks = vec![SinkConfig {
            name: "summary".into(),
            sink_type: SinkType::Log,
        }];

        let report = run(&bp).unwrap();
        assert_eq!(report.sinks, vec!["summary"]);
        assert!(output_files(&test_dir).is_empty());
    }

    #[test]
    fn test_e2e_missing_device_log() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );
        fs::remove_file(
            test_dir
                .join("Raw_Data")
                .join("Arduino_Serial_Output_T1.txt"),
        )
        .unwrap();

        let err = run(&blueprint(&test_dir)).unwrap_err();
        assert!(matches!(
            err,
            RunError::Ingestion(ingestion::IngestionError::InputMissing { .. })
        ));
    }

    #[test]
    fn test_e2e_config_file_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let test_dir = write_test_dir(
            root.path(),
            &machine_stream(&PULSES),
            &device_log(3),
            &[("1", camera_list(3, "1"))],
        );
        let config = format!(
            "[test]\ndir = {:?}\nid = \"Run7\"\n\n[output]\nexport_channels = [\"Force\"]\ninclude_device_columns = false\n",
            test_dir.display().to_string()
        );
        let bp = config_loader::ConfigLoader::load_from_str(
            &config,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        run(&bp).unwrap();
        let export = read_output(&test_dir, "MatchID_AcquisitionFile_Run7.csv");
        assert_eq!(
            export.lines().next().unwrap(),
            "File;TimeStamp;Force [kN]"
        );
    }
}
