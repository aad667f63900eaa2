//! Synthetic Run Example
//!
//! Writes a small synthetic test (machine stream, trigger controller log,
//! one camera frame list) and runs the whole synchronization on it.
//!
//! Run with: cargo run -p demos --bin synthetic_run [-- <work dir> [config.toml]]

use std::fs;
use std::path::{Path, PathBuf};

use config_loader::ConfigLoader;
use contracts::SyncBlueprint;
use dispatcher::{AssemblerConfig, Dispatcher, OutputAssembler};
use ingestion::DataLoader;
use observability::SyncSummary;
use sync_engine::SyncEngine;

const TEST_ID: &str = "Synthetic_001";
const FRAMES: u32 = 20;
const FRAME_PERIOD_MS: u32 = 250;
const SAMPLE_PERIOD_MS: u32 = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init()?;

    tracing::info!("Starting synthetic run demo");

    let work_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("dic-syncer-demo"));
    let test_dir = write_synthetic_test(&work_dir)?;

    // ==== Stage 1: Configuration ====
    let mut blueprint = match std::env::args().nth(2) {
        Some(path) => {
            tracing::info!(path = %path, "Loading config");
            ConfigLoader::load_from_path(Path::new(&path))?
        }
        None => SyncBlueprint::default(),
    };
    blueprint.test.dir = Some(test_dir.clone());

    // ==== Stage 2: Load inputs ====
    let inputs = DataLoader::load(&blueprint)?;
    tracing::info!(
        machine_rows = inputs.machine.len(),
        frames = inputs.device.len(),
        cameras = inputs.cameras.len(),
        "Inputs loaded"
    );

    // ==== Stage 3: Synchronize ====
    let engine = SyncEngine::new(blueprint.to_sync_engine_config());
    let outcome = engine.run(&inputs.machine, &inputs.device)?;

    // ==== Stage 4: Assemble and dispatch ====
    let artifacts = OutputAssembler::new(AssemblerConfig::from_blueprint(&blueprint)).assemble(
        &inputs.machine,
        &inputs.device,
        &outcome,
        &inputs.cameras,
    )?;
    let mut dispatcher = Dispatcher::from_configs(&blueprint.output.sinks, &blueprint.output_dir())?;
    let report = dispatcher.dispatch(&artifacts)?;

    println!("{}", SyncSummary::from_outcome(&outcome));
    println!(
        "{} files ({} rows) written to {}",
        report.artifacts,
        report.rows,
        dispatcher.output_dir().display()
    );

    Ok(())
}

/// Ramp force channel sampled every 20 ms, one 20 ms trigger pulse per frame.
/// The device clock starts 40 ms after the first pulse.
fn write_synthetic_test(work_dir: &Path) -> std::io::Result<PathBuf> {
    let test_dir = work_dir.join(TEST_ID);
    let raw = test_dir.join("Raw_Data");
    fs::create_dir_all(&raw)?;

    let first_pulse_ms = 500;
    let end_ms = first_pulse_ms + FRAMES * FRAME_PERIOD_MS + 200;

    let mut machine = String::from("Time\tForce\tDIC.trigger\tStroke\n(sec)\t(kN)\t()\t(mm)\n");
    for t in (0..=end_ms).step_by(SAMPLE_PERIOD_MS as usize) {
        let since_first = t.checked_sub(first_pulse_ms);
        let pulse = since_first.is_some_and(|dt| {
            dt % FRAME_PERIOD_MS < SAMPLE_PERIOD_MS && dt / FRAME_PERIOD_MS < FRAMES
        });
        machine.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            f64::from(t) / 1000.0,
            f64::from(t) * 0.01,
            u8::from(pulse),
            f64::from(t) * 0.001
        ));
    }
    fs::write(raw.join(format!("{TEST_ID}.d01")), machine)?;

    let mut device = String::from("frame,adc_count,time,fps_count,fps_time,a1,a2,a3,a4,delta\n");
    let mut camera = String::from("Frame\tFrame_Name\n");
    for frame in 0..FRAMES {
        let t = frame * FRAME_PERIOD_MS;
        let volts = f64::from(frame) * 0.05;
        for sub in 0..3 {
            device.push_str(&format!(
                "{frame},{},{},0,0,{volts},{volts},{volts},{volts},{sub}\n",
                frame * 3 + sub,
                t + sub
            ));
        }
        camera.push_str(&format!("{frame}\t{TEST_ID}_{frame:04}_0.tif\n"));
    }
    fs::write(raw.join(format!("Arduino_Serial_Output_{TEST_ID}.txt")), device)?;
    fs::write(raw.join(format!("{TEST_ID}_CAM_0.txt")), camera)?;

    Ok(test_dir)
}
