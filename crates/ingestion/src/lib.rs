//! # Ingestion
//!
//! Data Loader for one completed test.
//!
//! Responsibilities:
//! - Parse the machine channel stream (Input A) into a `MachineStream`
//! - Parse the trigger controller log (Input B) into a `DeviceLog`
//! - Parse per-camera frame lists (Input C) into `CameraFrames`
//! - Discover inputs in the test's `Raw_Data` directory
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::DataLoader;
//!
//! let inputs = DataLoader::load(&blueprint)?;
//! println!("{} machine rows", inputs.machine.len());
//! ```

mod camera;
mod delimited;
mod device;
mod discovery;
mod error;
mod loader;
mod machine;

pub use camera::{load_camera_frames, parse_camera_frames};
pub use device::{load_device_log, parse_device_log, DEVICE_COLUMNS};
pub use discovery::{discover, DiscoveredInputs};
pub use error::{IngestionError, Result};
pub use loader::{DataLoader, LoadedInputs, ResolvedInputs};
pub use machine::{load_machine_stream, parse_machine_stream};
