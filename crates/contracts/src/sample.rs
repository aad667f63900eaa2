//! SampleRow - Machine stream (Input A) data model
//!
//! Dense channel stream from the test-machine controller, machine clock domain.

use serde::{Deserialize, Serialize};

/// A named machine channel with its physical unit annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Column name as written by the controller (e.g. `Force`)
    pub name: String,

    /// Unit annotation with parentheses stripped (e.g. `kN`), may be empty
    pub unit: String,
}

impl Channel {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }

    /// Display header, `name [unit]`; a missing unit still yields `[]`
    pub fn header(&self) -> String {
        format!("{} [{}]", self.name, self.unit)
    }

    /// Whether `key` names this channel, either raw or as a display header
    pub fn matches(&self, key: &str) -> bool {
        self.name == key || self.header() == key
    }
}

/// Column layout of a machine stream
///
/// The trigger channel is held apart from the numeric channels but keeps its
/// source position so the full trace can restore the original column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSchema {
    /// Non-trigger channels in source order
    pub channels: Vec<Channel>,

    /// The digital trigger channel
    pub trigger: Channel,

    /// Index of the trigger among all machine columns (time column excluded)
    pub trigger_position: usize,
}

impl ChannelSchema {
    /// Number of non-trigger channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Position of a non-trigger channel by raw name or display header
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.matches(key))
    }

    /// All machine columns in source order, `None` marking the trigger slot
    pub fn source_order(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        let total = self.channels.len() + 1;
        (0..total).map(move |pos| match pos.cmp(&self.trigger_position) {
            std::cmp::Ordering::Less => Some(pos),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(pos - 1),
        })
    }
}

/// One genuine machine sample
///
/// `channels[i]` belongs to `schema.channels[i]`; together they form the
/// ordered name → value map of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    /// Machine clock, milliseconds since the controller started the test
    pub timestamp_ms: f64,

    /// Non-trigger channel values, schema order
    pub channels: Vec<f64>,

    /// Trigger channel value (nominal 0/1, may be fractional)
    pub trigger: f64,
}

impl SampleRow {
    /// Iterate `(name, value)` pairs in schema order
    pub fn named<'a>(
        &'a self,
        schema: &'a ChannelSchema,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        schema
            .channels
            .iter()
            .zip(self.channels.iter())
            .map(|(c, v)| (c.name.as_str(), *v))
    }
}

/// Parsed machine stream, rows ascending by timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineStream {
    pub schema: ChannelSchema,
    pub rows: Vec<SampleRow>,
}

impl MachineStream {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last timestamp (ms)
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((self.rows.first()?.timestamp_ms, self.rows.last()?.timestamp_ms))
    }
}
