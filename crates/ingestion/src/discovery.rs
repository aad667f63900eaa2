//! Raw_Data 目录扫描
//!
//! 文件名约定 (采集程序写出)：
//! - `*.d0*`：试验机数据流
//! - `*Serial*`：触发控制器日志
//! - `*CAM_<name>.*`：相机帧列表
//!
//! 同步结果文件与 sink 的暂存/备份文件会被跳过，输出目录可以与原始目录相同。

use std::path::{Path, PathBuf};

use contracts::CameraInput;
use tracing::{debug, instrument};

use crate::error::{IngestionError, Result};

const MACHINE_MARKER: &str = ".d0";
const DEVICE_MARKER: &str = "Serial";
const CAMERA_MARKER: &str = "CAM_";

/// Artifacts written by a previous run
const OUTPUT_PREFIXES: [&str; 3] = [
    "SyncedMachineData_",
    "MatchID_AcquisitionFile_",
    "Trigger_Timing_Differences_",
];

/// Sink staging leftovers
const STAGING_SUFFIXES: [&str; 2] = [".partial", ".bak"];

/// Input files found in a raw-data directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredInputs {
    pub machine: Option<PathBuf>,
    pub device: Option<PathBuf>,
    /// Ordered by camera name
    pub cameras: Vec<CameraInput>,
}

/// Scan `dir` for input files
#[instrument(name = "discover_inputs", fields(dir = %dir.display()))]
pub fn discover(dir: &Path) -> Result<DiscoveredInputs> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestionError::Discovery {
        dir: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestionError::Discovery {
            dir: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut found = DiscoveredInputs::default();
    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_generated(name) {
            debug!(file = %name, "skipping generated file");
            continue;
        }

        if name.contains(MACHINE_MARKER) {
            claim(dir, "machine stream", &mut found.machine, &path)?;
        } else if name.contains(DEVICE_MARKER) {
            claim(dir, "device log", &mut found.device, &path)?;
        } else if let Some(camera) = camera_name(name) {
            debug!(camera = %camera, file = %name, "camera frame list found");
            found.cameras.push(CameraInput { name: camera, path });
        }
    }

    found.cameras.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some(dup) = found
        .cameras
        .windows(2)
        .find(|w| w[0].name == w[1].name)
    {
        return Err(IngestionError::Discovery {
            dir: dir.to_path_buf(),
            message: format!("several frame lists for camera '{}'", dup[0].name),
        });
    }

    Ok(found)
}

fn claim(dir: &Path, artifact: &str, slot: &mut Option<PathBuf>, path: &Path) -> Result<()> {
    if let Some(existing) = slot {
        return Err(IngestionError::Discovery {
            dir: dir.to_path_buf(),
            message: format!(
                "several {artifact} candidates: {} and {}",
                file_label(existing),
                file_label(path)
            ),
        });
    }
    *slot = Some(path.to_path_buf());
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_generated(file_name: &str) -> bool {
    OUTPUT_PREFIXES.iter().any(|p| file_name.starts_with(p))
        || STAGING_SUFFIXES.iter().any(|s| file_name.ends_with(s))
}

/// `T1_CAM_left.txt` → `left`
fn camera_name(file_name: &str) -> Option<String> {
    let start = file_name.find(CAMERA_MARKER)? + CAMERA_MARKER.len();
    let rest = &file_name[start..];
    let name = match rest.rfind('.') {
        Some(dot) => &rest[..dot],
        None => rest,
    };
    (!name.is_empty()).then(|| name.to_string())
}
