//! Layered error definitions
//!
//! Categorized by source: config / alignment / output

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Alignment Errors =====
    /// Nothing to anchor the machine clock on
    #[error("cannot align: {message}")]
    CannotAlign { message: String },

    /// Detected trigger edges and device trigger markers do not pair 1:1
    #[error(
        "trigger count mismatch: {edges} rising edges in the machine stream, \
         {device_triggers} trigger events in the device log"
    )]
    EdgeCountMismatch { edges: usize, device_triggers: usize },

    // ===== Output Errors =====
    /// Camera frame list does not cover every captured frame
    #[error("camera '{camera}' lists {filenames} frame files, device log has {frames} frames")]
    FilenameCountMismatch {
        camera: String,
        filenames: usize,
        frames: usize,
    },

    /// Frame-indexed export would not be row-for-row with the captured frames
    #[error("frame-indexed export has {rows} rows, expected {frames}")]
    ExportRowMismatch { rows: usize, frames: usize },

    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create alignment error
    pub fn cannot_align(message: impl Into<String>) -> Self {
        Self::CannotAlign {
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether the error is an input/output integrity failure (counts do not line up)
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::EdgeCountMismatch { .. }
                | Self::FilenameCountMismatch { .. }
                | Self::ExportRowMismatch { .. }
        )
    }
}
