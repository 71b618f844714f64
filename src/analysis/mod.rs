//! Outcome statistics dashboard.
//!
//! This module provides:
//! - CSV reading for the outcome log (current and legacy schemas)
//! - Per-level outcome percentages
//! - Console table and JSON export of statistics

pub mod csv_reader;
pub mod export;
pub mod statistics;

pub use csv_reader::OutcomeLog;
pub use statistics::DashboardStats;

use anyhow::Result;
use std::path::Path;

/// Runs the dashboard: read the whole log, print the table, export JSON.
///
/// The JSON file is written next to the CSV as `statistics.json`.
pub fn show_dashboard(csv_path: &Path) -> Result<DashboardStats> {
    let log = OutcomeLog::from_csv(csv_path)?;
    let stats = DashboardStats::from_log(&log);

    crate::log(&format!(
        "===== Dashboard: {} attempts ({}) =====",
        stats.total_attempts,
        csv_path.display()
    ));
    for line in stats.render_table().lines() {
        crate::log(line);
    }
    match log.records.last() {
        Some(last) => crate::log(&last_outcome_line(last)),
        None => crate::log("No outcomes recorded yet"),
    }

    let json_path = csv_path.with_file_name("statistics.json");
    if let Err(e) = export::export_to_json(&stats, &json_path) {
        crate::log(&format!("Failed to export statistics: {:#}", e));
    }

    Ok(stats)
}

/// "Last: <timestamp> +5 -> +6 SUCCESS"; legacy rows have no result level.
fn last_outcome_line(record: &csv_reader::OutcomeRecord) -> String {
    let result = record
        .result_level
        .map(|level| format!("+{}", level))
        .unwrap_or_else(|| "?".to_string());
    format!(
        "Last: {} +{} -> {} {}",
        record.timestamp, record.base_level, result, record.kind
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_show_dashboard_writes_json() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");
        std::fs::write(
            &csv_path,
            "\u{feff}timestamp,base_level,result_level,outcome\n\
             2026-01-15 10:00:00,1,2,SUCCESS\n\
             2026-01-15 10:00:01,2,2,STAY\n",
        )
        .unwrap();

        let stats = show_dashboard(&csv_path).unwrap();
        assert_eq!(stats.total_attempts, 2);
        assert!(dir.path().join("statistics.json").exists());
    }

    #[test]
    fn test_last_outcome_line() {
        let log = OutcomeLog::parse(
            "timestamp,base_level,result_level,outcome\n2026-01-15 10:00:00,5,6,SUCCESS",
        )
        .unwrap();
        assert_eq!(
            last_outcome_line(&log.records[0]),
            "Last: 2026-01-15 10:00:00 +5 -> +6 SUCCESS"
        );

        let legacy =
            OutcomeLog::parse("timestamp,level,gold,result\n2026-01-15 10:00:00,4,900,유지").unwrap();
        assert_eq!(
            last_outcome_line(&legacy.records[0]),
            "Last: 2026-01-15 10:00:00 +4 -> ? STAY"
        );
    }

    #[test]
    fn test_show_dashboard_missing_file() {
        let dir = tempdir().unwrap();
        assert!(show_dashboard(&dir.path().join("missing.csv")).is_err());
    }
}
