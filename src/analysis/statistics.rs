//! Per-level outcome statistics.

use serde::Serialize;
use std::collections::BTreeMap;

use super::csv_reader::OutcomeLog;
use crate::automation::outcome::OutcomeKind;

/// Outcome counts and percentages for one base level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelStats {
    /// Level before the attempt
    pub level: u32,
    pub attempts: usize,
    pub success: usize,
    pub fail: usize,
    pub stay: usize,
    pub destroyed: usize,
    pub success_pct: f64,
    pub fail_pct: f64,
    pub stay_pct: f64,
    pub destroyed_pct: f64,
}

impl LevelStats {
    fn new(level: u32) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    fn record(&mut self, kind: OutcomeKind) {
        self.attempts += 1;
        match kind {
            OutcomeKind::Success => self.success += 1,
            OutcomeKind::Fail => self.fail += 1,
            OutcomeKind::Stay => self.stay += 1,
            OutcomeKind::Destroyed => self.destroyed += 1,
        }
    }

    /// Fills the percentage fields. A level without attempts keeps 0%.
    fn finish(&mut self) {
        if self.attempts == 0 {
            return;
        }
        let total = self.attempts as f64;
        self.success_pct = self.success as f64 * 100.0 / total;
        self.fail_pct = self.fail as f64 * 100.0 / total;
        self.stay_pct = self.stay as f64 * 100.0 / total;
        self.destroyed_pct = self.destroyed as f64 * 100.0 / total;
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Success => self.success,
            OutcomeKind::Fail => self.fail,
            OutcomeKind::Stay => self.stay,
            OutcomeKind::Destroyed => self.destroyed,
        }
    }

    pub fn percentage(&self, kind: OutcomeKind) -> f64 {
        match kind {
            OutcomeKind::Success => self.success_pct,
            OutcomeKind::Fail => self.fail_pct,
            OutcomeKind::Stay => self.stay_pct,
            OutcomeKind::Destroyed => self.destroyed_pct,
        }
    }
}

/// Statistics for the whole log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub total_attempts: usize,
    /// One entry per base level, ascending
    pub levels: Vec<LevelStats>,
    /// All levels combined
    pub overall: LevelStats,
}

impl DashboardStats {
    /// Groups the log by base level.
    pub fn from_log(log: &OutcomeLog) -> Self {
        let mut by_level: BTreeMap<u32, LevelStats> = BTreeMap::new();
        let mut overall = LevelStats::new(0);

        for record in &log.records {
            by_level
                .entry(record.base_level)
                .or_insert_with(|| LevelStats::new(record.base_level))
                .record(record.kind);
            overall.record(record.kind);
        }

        let mut levels: Vec<LevelStats> = by_level.into_values().collect();
        for stats in &mut levels {
            stats.finish();
        }
        overall.finish();

        DashboardStats {
            total_attempts: log.len(),
            levels,
            overall,
        }
    }

    /// Renders the console table; each cell is "percent (count)".
    pub fn render_table(&self) -> String {
        let mut out = format!("{:>6} | {:>6}", "level", "tries");
        for kind in OutcomeKind::ALL {
            out.push_str(&format!(" | {:>13}", kind.as_str()));
        }
        out.push('\n');
        let rule = "-".repeat(out.trim_end().chars().count());

        out.push_str(&rule);
        out.push('\n');
        for stats in &self.levels {
            out.push_str(&Self::render_row(&format!("+{}", stats.level), stats));
        }
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&Self::render_row("total", &self.overall));
        out
    }

    fn render_row(label: &str, stats: &LevelStats) -> String {
        let mut row = format!("{:>6} | {:>6}", label, stats.attempts);
        for kind in OutcomeKind::ALL {
            let cell = format!("{:.1}% ({})", stats.percentage(kind), stats.count(kind));
            row.push_str(&format!(" | {:>13}", cell));
        }
        row.push('\n');
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::csv_reader::OutcomeRecord;

    fn log_of(rows: &[(u32, OutcomeKind)]) -> OutcomeLog {
        OutcomeLog {
            records: rows
                .iter()
                .map(|&(base_level, kind)| OutcomeRecord {
                    timestamp: String::new(),
                    base_level,
                    result_level: None,
                    kind,
                })
                .collect(),
        }
    }

    #[test]
    fn test_percentages_sum_to_100() {
        let log = log_of(&[
            (5, OutcomeKind::Success),
            (5, OutcomeKind::Success),
            (5, OutcomeKind::Fail),
            (5, OutcomeKind::Destroyed),
        ]);
        let stats = DashboardStats::from_log(&log);

        assert_eq!(stats.levels.len(), 1);
        let level = &stats.levels[0];
        assert_eq!(level.attempts, 4);
        assert!((level.success_pct - 50.0).abs() < 1e-9);
        assert!((level.fail_pct - 25.0).abs() < 1e-9);
        assert!((level.stay_pct - 0.0).abs() < 1e-9);
        assert!((level.destroyed_pct - 25.0).abs() < 1e-9);

        let sum: f64 = OutcomeKind::ALL.iter().map(|&k| level.percentage(k)).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_grouped_by_level_ascending() {
        let log = log_of(&[
            (7, OutcomeKind::Destroyed),
            (2, OutcomeKind::Success),
            (7, OutcomeKind::Stay),
            (2, OutcomeKind::Success),
        ]);
        let stats = DashboardStats::from_log(&log);

        let levels: Vec<u32> = stats.levels.iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![2, 7]);
        assert_eq!(stats.levels[0].count(OutcomeKind::Success), 2);
        assert_eq!(stats.levels[1].count(OutcomeKind::Stay), 1);
        assert_eq!(stats.total_attempts, 4);
        assert_eq!(stats.overall.attempts, 4);
        assert!((stats.overall.success_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_log() {
        let stats = DashboardStats::from_log(&OutcomeLog::default());
        assert!(stats.levels.is_empty());
        assert_eq!(stats.overall.attempts, 0);
        assert_eq!(stats.overall.success_pct, 0.0);
    }

    #[test]
    fn test_render_table() {
        let log = log_of(&[(3, OutcomeKind::Success), (3, OutcomeKind::Fail)]);
        let table = DashboardStats::from_log(&log).render_table();
        assert!(table.contains("+3"));
        assert!(table.contains("SUCCESS"));
        assert!(table.contains("50.0% (1)"));
        assert!(table.contains("0.0% (0)"));
        assert!(table.contains("total"));
    }

    #[test]
    fn test_legacy_schema_matches_current() {
        let current = "timestamp,base_level,result_level,outcome
2026-01-15 10:00:00,5,6,SUCCESS
2026-01-15 10:00:01,6,4,FAIL
2026-01-15 10:00:02,4,4,STAY
2026-01-15 10:00:03,4,0,DESTROYED";
        let legacy = "timestamp,level,gold,result
2026-01-15 10:00:00,5,9000,SUCCESS
2026-01-15 10:00:01,6,8000,FAIL
2026-01-15 10:00:02,4,7000,STAY
2026-01-15 10:00:03,4,6000,DESTROYED";

        let a = DashboardStats::from_log(&OutcomeLog::parse(current).unwrap());
        let b = DashboardStats::from_log(&OutcomeLog::parse(legacy).unwrap());

        assert_eq!(a.levels, b.levels);
        assert_eq!(a.overall, b.overall);
        assert_eq!(a.render_table(), b.render_table());
    }
}
