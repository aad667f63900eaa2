//! Input A: test-machine channel stream
//!
//! Row 1 names the columns, row 2 carries the unit annotations, the rest is
//! numeric. Column 0 is elapsed time in seconds.

use std::path::Path;

use contracts::{delimiter_char, Channel, ChannelSchema, MachineConfig, MachineStream, SampleRow};
use metrics::counter;
use tracing::{debug, instrument};

use crate::delimited::DelimitedText;
use crate::error::Result;

pub(crate) const ARTIFACT: &str = "machine stream";

/// Load and parse a machine stream file
#[instrument(name = "load_machine_stream", skip(config), fields(path = %path.display()))]
pub fn load_machine_stream(path: &Path, config: &MachineConfig) -> Result<MachineStream> {
    let delimiter = delimiter_char(&config.delimiter).unwrap_or('\t');
    let text = DelimitedText::read(ARTIFACT, path, delimiter)?;
    let stream = parse(&text, &config.trigger_channel)?;

    counter!("dic_sync_rows_loaded_total", "input" => "machine").increment(stream.len() as u64);
    debug!(
        rows = stream.len(),
        channels = stream.schema.len(),
        trigger = %stream.schema.trigger.header(),
        "machine stream loaded"
    );
    Ok(stream)
}

/// Parse machine stream text already in memory
pub fn parse_machine_stream(
    content: &str,
    source: &Path,
    config: &MachineConfig,
) -> Result<MachineStream> {
    let delimiter = delimiter_char(&config.delimiter).unwrap_or('\t');
    let text = DelimitedText::from_content(ARTIFACT, source, content, delimiter);
    parse(&text, &config.trigger_channel)
}

fn parse(text: &DelimitedText, trigger_channel: &str) -> Result<MachineStream> {
    let mut records = text.records();

    let header = records
        .next()
        .ok_or_else(|| text.error(1, "empty file, expected a header row"))?;
    let units = records
        .next()
        .ok_or_else(|| text.error(header.line + 1, "missing unit annotation row"))?;

    let width = header.fields.len();
    if width < 2 {
        return Err(text.error(
            header.line,
            "expected a time column followed by at least the trigger channel",
        ));
    }

    // 列 0 为时间，其余为通道
    let columns: Vec<Channel> = (1..width)
        .map(|idx| {
            let unit = units.fields.get(idx).copied().unwrap_or_default();
            Channel::new(header.fields[idx], strip_unit(unit))
        })
        .collect();

    let trigger_position = columns
        .iter()
        .position(|c| c.matches(trigger_channel))
        .ok_or_else(|| {
            text.error(
                header.line,
                format!("trigger channel '{trigger_channel}' not found in header"),
            )
        })?;

    let mut channels = columns.clone();
    let trigger = channels.remove(trigger_position);
    let schema = ChannelSchema {
        channels,
        trigger,
        trigger_position,
    };

    let mut rows = Vec::new();
    let mut last_ms = f64::NEG_INFINITY;
    for record in records {
        if record.fields.len() < width {
            return Err(text.error(
                record.line,
                format!("expected {width} columns, found {}", record.fields.len()),
            ));
        }

        let timestamp_ms = text.number(&record, 0, header.fields[0])? * 1000.0;
        if timestamp_ms < last_ms {
            return Err(text.error(
                record.line,
                format!("time goes backwards ({timestamp_ms} ms after {last_ms} ms)"),
            ));
        }
        last_ms = timestamp_ms;

        let mut values = Vec::with_capacity(width - 2);
        let mut trigger = 0.0;
        for (pos, column) in columns.iter().enumerate() {
            let value = text.number(&record, pos + 1, &column.name)?;
            if pos == trigger_position {
                trigger = value;
            } else {
                values.push(value);
            }
        }

        rows.push(SampleRow {
            timestamp_ms,
            channels: values,
            trigger,
        });
    }

    Ok(MachineStream { schema, rows })
}

/// `(kN)` → `kN`
fn strip_unit(raw: &str) -> String {
    raw.chars().filter(|c| *c != '(' && *c != ')').collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = "Time\tForce\tDIC.trigger\tJaw\n\
                          (sec)\t(kN)\t(lbloo)\t\n\
                          0.000\t10\t0\t1\n\
                          0.100\t20\t1\t2\n\
                          0.200\t30\t0\t3\n";

    fn parse_default(content: &str) -> Result<MachineStream> {
        parse_machine_stream(content, Path::new("run.d01"), &MachineConfig::default())
    }

    #[test]
    fn seconds_normalised_to_milliseconds() {
        let stream = parse_default(STREAM).unwrap();
        let times: Vec<f64> = stream.rows.iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(times, vec![0.0, 100.0, 200.0]);
    }

    #[test]
    fn trigger_split_from_channels() {
        let stream = parse_default(STREAM).unwrap();
        assert_eq!(stream.schema.trigger.header(), "DIC.trigger [lbloo]");
        assert_eq!(stream.schema.trigger_position, 1);
        assert_eq!(stream.schema.channels[0].header(), "Force [kN]");
        assert_eq!(stream.schema.channels[1].header(), "Jaw []");
        assert_eq!(stream.rows[1].channels, vec![20.0, 2.0]);
        assert_eq!(stream.rows[1].trigger, 1.0);
    }

    #[test]
    fn trigger_located_by_display_header() {
        let config = MachineConfig {
            trigger_channel: "DIC.trigger [lbloo]".into(),
            ..Default::default()
        };
        let stream = parse_machine_stream(STREAM, Path::new("run.d01"), &config).unwrap();
        assert_eq!(stream.schema.trigger.name, "DIC.trigger");
    }

    #[test]
    fn missing_trigger_channel_is_parse_error() {
        let config = MachineConfig {
            trigger_channel: "Quench3".into(),
            ..Default::default()
        };
        let err = parse_machine_stream(STREAM, Path::new("run.d01"), &config).unwrap_err();
        assert!(err.to_string().contains("Quench3"));
    }

    #[test]
    fn decreasing_time_rejected() {
        let content = "Time\tDIC.trigger\n(sec)\t()\n0.2\t0\n0.1\t0\n";
        let err = parse_default(content).unwrap_err();
        assert!(err.to_string().contains(":4:"), "{err}");
    }

    #[test]
    fn short_row_rejected() {
        let content = "Time\tDIC.trigger\tForce\n(sec)\t\t(kN)\n0.0\t0\n";
        assert!(parse_default(content).is_err());
    }

    #[test]
    fn fractional_trigger_kept() {
        let content = "Time\tDIC.trigger\n(sec)\t\n0.0\t0\n0.001\t0.25\n";
        let stream = parse_default(content).unwrap();
        assert_eq!(stream.rows[1].trigger, 0.25);
        assert!(stream.schema.is_empty());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.d01");
        std::fs::write(&path, STREAM).unwrap();
        let stream = load_machine_stream(&path, &MachineConfig::default()).unwrap();
        assert_eq!(stream.len(), 3);
    }
}
