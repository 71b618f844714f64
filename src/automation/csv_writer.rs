//! CSV writer for reinforcement outcomes.
//!
//! Writes outcomes in append-only mode for crash safety. The file starts with
//! a UTF-8 byte-order mark so spreadsheet programs pick the right encoding.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::automation::outcome::Outcome;

/// CSV header row.
pub const CSV_HEADER: &str = "timestamp,base_level,result_level,outcome";

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &str = "\u{feff}";

/// Initializes the CSV file with BOM and header if it doesn't exist or is empty.
///
/// Existing content is preserved. A last line without a newline is terminated
/// so the next row starts on its own line.
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let content = std::fs::read(path).context("Failed to inspect existing CSV")?;
        if let Some(&last) = content.last() {
            if last != b'\n' {
                let mut file = OpenOptions::new()
                    .append(true)
                    .open(path)
                    .context("Failed to open CSV for append")?;
                writeln!(file).context("Failed to terminate last CSV line")?;
            }
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    write!(file, "{}", UTF8_BOM).context("Failed to write CSV byte-order mark")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Appends one outcome row to the CSV file.
///
/// Opens the file in append mode for each write; no handle is held between
/// cycles, so a killed process loses at most the row being written.
pub fn append_outcome(path: &Path, outcome: &Outcome) -> Result<()> {
    init_csv(path)?;

    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    // Format: timestamp,base_level,result_level,outcome
    let line = format!(
        "{},{},{},{}",
        outcome.timestamp.format("%Y-%m-%d %H:%M:%S"),
        outcome.base_level,
        outcome.result_level,
        outcome.kind,
    );

    writeln!(file, "{}", line).context("Failed to write CSV row")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::outcome::OutcomeKind;
    use tempfile::tempdir;

    #[test]
    fn test_init_csv_writes_bom_and_header() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");

        init_csv(&csv_path).unwrap();

        let bytes = std::fs::read(&csv_path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let content = String::from_utf8(bytes).unwrap();
        assert!(content.trim_start_matches(UTF8_BOM).starts_with(CSV_HEADER));
    }

    #[test]
    fn test_init_csv_preserves_existing() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");

        std::fs::write(&csv_path, "timestamp,level,gold,result\n").unwrap();

        init_csv(&csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content, "timestamp,level,gold,result\n");
    }

    #[test]
    fn test_append_after_unterminated_line() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");
        std::fs::write(
            &csv_path,
            "timestamp,base_level,result_level,outcome\n2026-01-15 10:00:00,1,2,SUCCESS",
        )
        .unwrap();

        append_outcome(&csv_path, &Outcome::new(OutcomeKind::Fail, 2, 1)).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2026-01-15 10:00:00,1,2,SUCCESS");
        assert!(lines[2].ends_with(",2,1,FAIL"));

        let log = crate::analysis::OutcomeLog::from_csv(&csv_path).unwrap();
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_append_creates_file() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");

        append_outcome(&csv_path, &Outcome::new(OutcomeKind::Success, 5, 6)).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(",5,6,SUCCESS"));
    }

    #[test]
    fn test_append_multiple_rows() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");
        init_csv(&csv_path).unwrap();

        append_outcome(&csv_path, &Outcome::new(OutcomeKind::Success, 1, 2)).unwrap();
        append_outcome(&csv_path, &Outcome::new(OutcomeKind::Stay, 2, 2)).unwrap();
        append_outcome(&csv_path, &Outcome::new(OutcomeKind::Destroyed, 2, 0)).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 4); // header + 3 data rows
        assert!(lines[3].ends_with(",2,0,DESTROYED"));
        // Only one BOM
        assert_eq!(content.matches(UTF8_BOM).count(), 1);
    }
}
