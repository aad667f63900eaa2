//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Machine clock (ms since the test started) is the primary clock
//! - Device timestamps are mapped onto it by the sync engine
//! - `frame_index` is the device trigger counter, used for ordering and export

mod blueprint;
mod camera;
mod device;
mod error;
mod sample;
mod sink;
mod sync;
mod sync_engine_config;

pub use blueprint::*;
pub use camera::*;
pub use device::*;
pub use error::*;
pub use sample::*;
pub use sink::*;
pub use sync::*;
pub use sync_engine_config::*;
