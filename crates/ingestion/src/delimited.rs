//! Delimited text reading shared by the three input parsers

use std::path::{Path, PathBuf};

use crate::error::{IngestionError, Result};

/// One non-blank line split into trimmed fields
#[derive(Debug)]
pub(crate) struct Record<'a> {
    /// 1-based line number in the source file
    pub line: usize,
    pub fields: Vec<&'a str>,
}

/// Whole input file held in memory, split lazily
#[derive(Debug)]
pub(crate) struct DelimitedText {
    pub artifact: &'static str,
    pub path: PathBuf,
    content: String,
    delimiter: char,
}

impl DelimitedText {
    pub fn read(artifact: &'static str, path: &Path, delimiter: char) -> Result<Self> {
        if !path.is_file() {
            return Err(IngestionError::InputMissing {
                artifact,
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| IngestionError::InputRead {
            artifact,
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_content(artifact, path, content, delimiter))
    }

    pub fn from_content(
        artifact: &'static str,
        path: &Path,
        content: impl Into<String>,
        delimiter: char,
    ) -> Self {
        Self {
            artifact,
            path: path.to_path_buf(),
            content: content.into(),
            delimiter,
        }
    }

    /// Non-blank lines, trailing `\r` stripped
    ///
    /// A line holding only delimiters is not blank (e.g. an all-empty unit row).
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        let delimiter = self.delimiter;
        self.content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .enumerate()
            .filter(|(_, line)| !line.trim_matches(' ').is_empty())
            .map(move |(idx, line)| Record {
                line: idx + 1,
                fields: line
                    .split(delimiter)
                    .map(str::trim)
                    .collect(),
            })
    }

    pub fn error(&self, line: usize, message: impl Into<String>) -> IngestionError {
        IngestionError::parse(self.artifact, &self.path, line, message)
    }

    /// Parse a numeric field, naming the column on failure
    pub fn number(&self, record: &Record<'_>, idx: usize, column: &str) -> Result<f64> {
        let raw = record
            .fields
            .get(idx)
            .ok_or_else(|| self.error(record.line, format!("missing column '{column}'")))?;
        let value: f64 = raw.parse().map_err(|_| {
            self.error(
                record.line,
                format!("column '{column}': '{raw}' is not a number"),
            )
        })?;
        if !value.is_finite() {
            return Err(self.error(record.line, format!("column '{column}': non-finite value")));
        }
        Ok(value)
    }

    /// Parse a counter field; integral floats such as `12.0` are accepted
    pub fn counter(&self, record: &Record<'_>, idx: usize, column: &str) -> Result<u64> {
        let value = self.number(record, idx, column)?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(self.error(
                record.line,
                format!("column '{column}': {value} is not a frame counter"),
            ));
        }
        Ok(value as u64)
    }
}
