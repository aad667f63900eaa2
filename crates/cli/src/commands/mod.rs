//! Command implementations.

mod info;
mod sync;
mod validate;

pub use info::run_info;
pub use sync::run_sync;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::SyncBlueprint;
use tracing::info;

use crate::cli::ConfigArgs;
use crate::error::CliError;

/// Load the configuration (or defaults), apply CLI overrides, validate
pub(crate) fn load_blueprint(args: &ConfigArgs) -> Result<SyncBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path).into());
            }
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => SyncBlueprint::default(),
    };

    if let Some(ref dir) = args.test_dir {
        info!(test_dir = %dir.display(), "Overriding test directory from CLI");
        blueprint.test.dir = Some(dir.clone());
    }
    if let Some(offset) = args.offset_ms {
        info!(offset_ms = offset, "Overriding clock offset constant from CLI");
        blueprint.clock.offset_constant_ms = offset;
    }
    if let Some(mode) = args.mode {
        blueprint.clock.mode = mode.into();
    }
    if let Some(ref dir) = args.output_dir {
        blueprint.output.dir = Some(dir.clone());
    }

    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after applying overrides")?;

    let inputs = &blueprint.inputs;
    let fully_explicit =
        inputs.machine.is_some() && inputs.device.is_some() && !inputs.cameras.is_empty();
    if blueprint.test.dir.is_none() && !fully_explicit {
        return Err(CliError::NoInputs.into());
    }

    Ok(blueprint)
}
