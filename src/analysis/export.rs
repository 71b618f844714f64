//! JSON export for dashboard statistics.

use super::statistics::DashboardStats;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Export statistics to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json(stats: &DashboardStats, output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(stats).context("Failed to serialize statistics to JSON")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::csv_reader::OutcomeLog;
    use tempfile::tempdir;

    #[test]
    fn test_export_to_json() {
        let log = OutcomeLog::parse(
            "timestamp,base_level,result_level,outcome\n2026-01-15 10:00:00,5,6,SUCCESS\n",
        )
        .unwrap();
        let stats = DashboardStats::from_log(&log);

        let dir = tempdir().unwrap();
        let path = dir.path().join("statistics.json");

        export_to_json(&stats, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"total_attempts\": 1"));
        assert!(content.contains("\"success_pct\": 100.0"));
        assert!(content.contains("\"level\": 5"));
    }
}
