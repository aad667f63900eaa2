//! Data Loader: resolves the three input artifacts of one test and parses them

use std::path::PathBuf;

use contracts::{CameraFrames, CameraInput, DeviceLog, MachineStream, SyncBlueprint};
use tracing::{info, instrument, warn};

use crate::camera::{self, load_camera_frames};
use crate::device::{self, load_device_log};
use crate::discovery::{discover, DiscoveredInputs};
use crate::error::{IngestionError, Result};
use crate::machine::{self, load_machine_stream};

/// Input paths of one run, primary camera first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInputs {
    pub machine: PathBuf,
    pub device: PathBuf,
    pub cameras: Vec<CameraInput>,
}

impl ResolvedInputs {
    pub fn primary_camera(&self) -> Option<&CameraInput> {
        self.cameras.first()
    }
}

/// Parsed inputs of one run
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub machine: MachineStream,
    pub device: DeviceLog,
    /// Primary camera first
    pub cameras: Vec<CameraFrames>,
}

/// Data loader
pub struct DataLoader;

impl DataLoader {
    /// Resolve and parse every input named or discoverable from `blueprint`
    pub fn load(blueprint: &SyncBlueprint) -> Result<LoadedInputs> {
        let inputs = Self::resolve(blueprint)?;
        Self::load_resolved(&inputs, blueprint)
    }

    /// Work out input paths: configured paths win, the rest is discovered
    #[instrument(name = "resolve_inputs", skip(blueprint))]
    pub fn resolve(blueprint: &SyncBlueprint) -> Result<ResolvedInputs> {
        let configured = &blueprint.inputs;
        let needs_scan = configured.machine.is_none()
            || configured.device.is_none()
            || configured.cameras.is_empty();

        let raw_dir = blueprint.raw_data_dir();
        let discovered = match (&raw_dir, needs_scan) {
            (Some(dir), true) => discover(dir)?,
            _ => DiscoveredInputs::default(),
        };
        let search_dir = raw_dir.clone().unwrap_or_else(|| PathBuf::from("."));

        let machine = match &configured.machine {
            Some(path) => blueprint.resolve_input(path),
            None => discovered.machine.ok_or_else(|| IngestionError::InputMissing {
                artifact: machine::ARTIFACT,
                path: search_dir.clone(),
            })?,
        };

        let device = match &configured.device {
            Some(path) => blueprint.resolve_input(path),
            None => discovered.device.ok_or_else(|| IngestionError::InputMissing {
                artifact: device::ARTIFACT,
                path: search_dir.clone(),
            })?,
        };

        let mut cameras: Vec<CameraInput> = if configured.cameras.is_empty() {
            discovered.cameras
        } else {
            configured
                .cameras
                .iter()
                .map(|c| CameraInput {
                    name: c.name.clone(),
                    path: blueprint.resolve_input(&c.path),
                })
                .collect()
        };
        if cameras.is_empty() {
            return Err(IngestionError::InputMissing {
                artifact: camera::ARTIFACT,
                path: search_dir,
            });
        }

        if let Some(primary) = &blueprint.camera.primary {
            let pos = cameras
                .iter()
                .position(|c| &c.name == primary)
                .ok_or_else(|| IngestionError::Discovery {
                    dir: search_dir.clone(),
                    message: format!("primary camera '{primary}' has no frame list"),
                })?;
            let primary = cameras.remove(pos);
            cameras.insert(0, primary);
        }

        Ok(ResolvedInputs {
            machine,
            device,
            cameras,
        })
    }

    /// Parse already-resolved inputs
    #[instrument(name = "load_inputs", skip_all)]
    pub fn load_resolved(inputs: &ResolvedInputs, blueprint: &SyncBlueprint) -> Result<LoadedInputs> {
        let machine = load_machine_stream(&inputs.machine, &blueprint.machine)?;
        let device = load_device_log(&inputs.device, &blueprint.device)?;

        let cameras = inputs
            .cameras
            .iter()
            .map(|c| load_camera_frames(&c.name, &c.path, &blueprint.camera))
            .collect::<Result<Vec<_>>>()?;

        if device.is_empty() {
            warn!(path = %inputs.device.display(), "device log holds no frames");
        }

        info!(
            machine_rows = machine.len(),
            device_frames = device.len(),
            device_rows = device.raw_rows,
            cameras = cameras.len(),
            "inputs loaded"
        );

        Ok(LoadedInputs {
            machine,
            device,
            cameras,
        })
    }
}
