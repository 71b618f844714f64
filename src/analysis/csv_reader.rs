//! CSV reader for the outcome log.
//!
//! Columns are located by header name so both log schemas load:
//! - current: `timestamp,base_level,result_level,outcome`
//! - legacy:  `timestamp,level,gold,result`

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::automation::csv_writer::UTF8_BOM;
use crate::automation::outcome::OutcomeKind;

/// One row of the outcome log.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    pub timestamp: String,
    /// Level before the attempt
    pub base_level: u32,
    /// Level after the attempt (absent in legacy logs)
    pub result_level: Option<u32>,
    pub kind: OutcomeKind,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    timestamp: Option<usize>,
    base_level: usize,
    result_level: Option<usize>,
    outcome: usize,
}

impl Columns {
    fn from_header(header: &str) -> Result<Self> {
        let names: Vec<String> = header
            .trim_start_matches(UTF8_BOM)
            .split(',')
            .map(|name| name.trim().to_ascii_lowercase())
            .collect();
        let find = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|c| names.iter().position(|n| n == c))
        };

        Ok(Columns {
            timestamp: find(&["timestamp"]),
            base_level: find(&["base_level", "level"])
                .ok_or_else(|| anyhow!("Header has no base_level/level column"))?,
            result_level: find(&["result_level"]),
            outcome: find(&["outcome", "result"])
                .ok_or_else(|| anyhow!("Header has no outcome/result column"))?,
        })
    }
}

/// All outcomes loaded from the log.
#[derive(Debug, Clone, Default)]
pub struct OutcomeLog {
    pub records: Vec<OutcomeRecord>,
}

impl OutcomeLog {
    /// Load outcomes from a CSV file.
    ///
    /// Skips empty lines and malformed rows (with warning log).
    pub fn from_csv(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to open CSV file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse CSV content. An empty document yields an empty log.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().enumerate();
        let columns = match lines.next() {
            Some((_, header)) if !header.trim_start_matches(UTF8_BOM).trim().is_empty() => {
                Columns::from_header(header)?
            }
            _ => return Ok(Self::default()),
        };

        let mut records = Vec::new();
        for (line_num, line) in lines {
            if line.trim().is_empty() {
                continue;
            }

            match Self::parse_line(line, &columns) {
                Ok(record) => records.push(record),
                Err(e) => {
                    crate::log(&format!(
                        "Warning: Skipping malformed CSV row {}: {}",
                        line_num + 1,
                        e
                    ));
                }
            }
        }

        Ok(OutcomeLog { records })
    }

    fn parse_line(line: &str, columns: &Columns) -> Result<OutcomeRecord> {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |idx: usize| {
            parts
                .get(idx)
                .copied()
                .ok_or_else(|| anyhow!("Missing column {}", idx + 1))
        };

        let base_level = field(columns.base_level)?
            .parse::<u32>()
            .context("Invalid base level")?;
        let kind = OutcomeKind::from_label(field(columns.outcome)?)
            .ok_or_else(|| anyhow!("Unknown outcome label"))?;
        let result_level = match columns.result_level {
            Some(idx) => Some(field(idx)?.parse::<u32>().context("Invalid result level")?),
            None => None,
        };
        let timestamp = match columns.timestamp {
            Some(idx) => field(idx)?.to_string(),
            None => String::new(),
        };

        Ok(OutcomeRecord {
            timestamp,
            base_level,
            result_level,
            kind,
        })
    }

    /// Number of outcomes in the log.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
