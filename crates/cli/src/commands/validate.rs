//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{AlignmentMode, ClockModel, SinkType, SyncBlueprint, TrailingEdgePolicy};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    test_id: String,
    explicit_inputs: usize,
    camera_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let inputs = &blueprint.inputs;
            let explicit_inputs = usize::from(inputs.machine.is_some())
                + usize::from(inputs.device.is_some())
                + inputs.cameras.len();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    test_id: blueprint.test_id(),
                    explicit_inputs,
                    camera_count: inputs.cameras.len(),
                    sink_count: blueprint.output.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &SyncBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint
        .output
        .sinks
        .iter()
        .any(|s| s.sink_type == SinkType::File)
    {
        warnings.push("No file sink configured - no output files will be written".to_string());
    }

    if blueprint.test.dir.is_none() {
        warnings.push("test.dir is not set - pass --test-dir when running sync".to_string());
    }

    if blueprint.clock.mode == AlignmentMode::BestEffort {
        warnings.push(
            "clock.mode = best_effort - unmatched trigger counts only raise a warning".to_string(),
        );
    }

    if blueprint.clock.model == ClockModel::Offset && blueprint.clock.scale_segments > 1 {
        warnings.push(
            "clock.scale_segments is ignored unless clock.model = segmented_scale".to_string(),
        );
    }

    if blueprint.machine.trailing_edge == TrailingEdgePolicy::Always {
        warnings.push(
            "machine.trailing_edge = always - the last edge is dropped even when genuine"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Test: {}", summary.test_id);
            println!("  Explicit inputs: {}", summary.explicit_inputs);
            println!("  Cameras: {}", summary.camera_count);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
