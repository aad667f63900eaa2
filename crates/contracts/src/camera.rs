//! FrameFilenameRecord - Camera frame list (Input C) data model

use serde::{Deserialize, Serialize};

/// One saved image, capture order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameFilenameRecord {
    pub frame_index: u64,
    pub filename: String,
}

/// Ordered frame list of one camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraFrames {
    /// Camera name (the `<name>` of a `CAM_<name>` file)
    pub camera: String,

    pub records: Vec<FrameFilenameRecord>,
}

impl CameraFrames {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
