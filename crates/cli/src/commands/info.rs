//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::SyncBlueprint;
use ingestion::{DataLoader, ResolvedInputs};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

use super::load_blueprint;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    test_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_dir: Option<String>,
    output_dir: String,
    inputs: InputsInfo,
    clock: ClockInfo,
    adc: Vec<AdcInfo>,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
enum InputsInfo {
    Resolved {
        machine: String,
        device: String,
        cameras: Vec<CameraInfo>,
    },
    Unresolved {
        error: String,
    },
}

#[derive(Serialize)]
struct CameraInfo {
    name: String,
    path: String,
    primary: bool,
}

#[derive(Serialize)]
struct ClockInfo {
    offset_constant_ms: f64,
    drift_threshold_ms: f64,
    mode: String,
    model: String,
    scale_segments: usize,
    trailing_edge: String,
    trigger_source: String,
}

#[derive(Serialize)]
struct AdcInfo {
    name: String,
    gain: f64,
    offset: f64,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!("Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;
    let inputs = DataLoader::resolve(&blueprint);
    let config_info = build_config_info(&blueprint, inputs);

    if args.json {
        let json = serde_json::to_string_pretty(&config_info)
            .context("Failed to serialize config info")?;
        println!("{json}");
    } else {
        print_config_info(&config_info);
    }

    Ok(())
}

fn build_config_info(
    blueprint: &SyncBlueprint,
    inputs: ingestion::Result<ResolvedInputs>,
) -> ConfigInfo {
    let inputs = match inputs {
        Ok(resolved) => InputsInfo::Resolved {
            machine: resolved.machine.display().to_string(),
            device: resolved.device.display().to_string(),
            cameras: resolved
                .cameras
                .iter()
                .enumerate()
                .map(|(idx, c)| CameraInfo {
                    name: c.name.clone(),
                    path: c.path.display().to_string(),
                    primary: idx == 0,
                })
                .collect(),
        },
        Err(e) => InputsInfo::Unresolved {
            error: e.to_string(),
        },
    };

    let engine = blueprint.to_sync_engine_config();
    ConfigInfo {
        test_id: blueprint.test_id(),
        test_dir: blueprint.test.dir.as_ref().map(|d| d.display().to_string()),
        output_dir: blueprint.output_dir().display().to_string(),
        inputs,
        clock: ClockInfo {
            offset_constant_ms: engine.clock.offset_constant_ms,
            drift_threshold_ms: engine.clock.drift_threshold_ms,
            mode: format!("{:?}", engine.clock.mode),
            model: format!("{:?}", engine.clock.model),
            scale_segments: engine.clock.scale_segments,
            trailing_edge: format!("{:?}", engine.trailing_edge),
            trigger_source: format!("{:?}", engine.trigger_source),
        },
        adc: blueprint
            .device
            .adc
            .iter()
            .map(|a| AdcInfo {
                name: a.name.clone(),
                gain: a.gain,
                offset: a.offset,
            })
            .collect(),
        sinks: blueprint
            .output
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
            })
            .collect(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Sync Configuration ===\n");
    println!("Test: {}", info.test_id);
    if let Some(ref dir) = info.test_dir {
        println!("  Directory: {dir}");
    }
    println!("  Output: {}", info.output_dir);

    println!("\nInputs:");
    match &info.inputs {
        InputsInfo::Resolved {
            machine,
            device,
            cameras,
        } => {
            println!("  Machine stream: {machine}");
            println!("  Device log: {device}");
            for camera in cameras {
                let tag = if camera.primary { " (primary)" } else { "" };
                println!("  Camera {}{tag}: {}", camera.name, camera.path);
            }
        }
        InputsInfo::Unresolved { error } => {
            println!("  ✗ {error}");
        }
    }

    let clock = &info.clock;
    println!("\nClock:");
    println!("  Offset constant: {} ms", clock.offset_constant_ms);
    println!("  Drift threshold: {} ms", clock.drift_threshold_ms);
    println!("  Mode: {}, model: {} ({} segments)", clock.mode, clock.model, clock.scale_segments);
    println!("  Trailing edge: {}", clock.trailing_edge);
    println!("  Trigger source: {}", clock.trigger_source);

    println!("\nADC calibration:");
    for adc in &info.adc {
        println!("  - {}: {} * V + {}", adc.name, adc.gain, adc.offset);
    }

    println!("\nSinks ({}):", info.sinks.len());
    for sink in &info.sinks {
        println!("  - {} ({})", sink.name, sink.sink_type);
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn unresolved_inputs_reported_not_fatal() {
        let mut blueprint = SyncBlueprint::default();
        blueprint.test.dir = Some(PathBuf::from("/nonexistent/T9"));
        let inputs = DataLoader::resolve(&blueprint);
        let info = build_config_info(&blueprint, inputs);

        assert_eq!(info.test_id, "T9");
        assert!(matches!(info.inputs, InputsInfo::Unresolved { .. }));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["inputs"]["status"], "unresolved");
        assert_eq!(json["clock"]["mode"], "Strict");
        assert_eq!(json["adc"].as_array().unwrap().len(), 4);
    }
}
