//! Input C: per-camera frame list

use std::path::Path;

use contracts::{delimiter_char, CameraConfig, CameraFrames, FrameFilenameRecord};
use tracing::{debug, instrument};

use crate::delimited::DelimitedText;
use crate::error::Result;

pub(crate) const ARTIFACT: &str = "camera frame list";

/// Load one camera's frame list
#[instrument(name = "load_camera_frames", skip(config), fields(camera = %camera, path = %path.display()))]
pub fn load_camera_frames(camera: &str, path: &Path, config: &CameraConfig) -> Result<CameraFrames> {
    let delimiter = delimiter_char(&config.delimiter).unwrap_or('\t');
    let text = DelimitedText::read(ARTIFACT, path, delimiter)?;
    let frames = parse(&text, camera, config)?;
    debug!(frames = frames.len(), "camera frame list loaded");
    Ok(frames)
}

/// Parse a frame list already in memory
pub fn parse_camera_frames(
    content: &str,
    camera: &str,
    source: &Path,
    config: &CameraConfig,
) -> Result<CameraFrames> {
    let delimiter = delimiter_char(&config.delimiter).unwrap_or('\t');
    let text = DelimitedText::from_content(ARTIFACT, source, content, delimiter);
    parse(&text, camera, config)
}

fn parse(text: &DelimitedText, camera: &str, config: &CameraConfig) -> Result<CameraFrames> {
    let mut lines = text.records();
    let header = lines
        .next()
        .ok_or_else(|| text.error(1, "empty file, expected a header row"))?;

    let filename_idx = header
        .fields
        .iter()
        .position(|f| *f == config.filename_column)
        .ok_or_else(|| {
            text.error(
                header.line,
                format!("filename column '{}' not found", config.filename_column),
            )
        })?;
    let index_idx = config
        .index_column
        .as_deref()
        .and_then(|name| header.fields.iter().position(|f| *f == name));

    let mut records = Vec::new();
    for line in lines {
        // 采集程序每次开始录制都会重写表头
        if line.fields == header.fields {
            continue;
        }
        let filename = line
            .fields
            .get(filename_idx)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| text.error(line.line, "missing frame filename"))?;
        let frame_index = match index_idx {
            Some(idx) => text.counter(&line, idx, header.fields[idx])?,
            None => records.len() as u64,
        };
        records.push(FrameFilenameRecord {
            frame_index,
            filename: filename.to_string(),
        });
    }

    Ok(CameraFrames {
        camera: camera.to_string(),
        records,
    })
}
