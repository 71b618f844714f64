//! Outcome classification from consecutive observations.
//!
//! The same result message stays on screen for several poll cycles, so the
//! classifier compares each observation against the last adopted level and
//! only reports real transitions.

use chrono::{DateTime, Local};

use crate::ocr::extract::GameObservation;

/// Result of one reinforcement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    Fail,
    Stay,
    Destroyed,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 4] = [
        OutcomeKind::Success,
        OutcomeKind::Fail,
        OutcomeKind::Stay,
        OutcomeKind::Destroyed,
    ];

    /// Label written to the results CSV.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "SUCCESS",
            OutcomeKind::Fail => "FAIL",
            OutcomeKind::Stay => "STAY",
            OutcomeKind::Destroyed => "DESTROYED",
        }
    }

    /// Parses a CSV label. Accepts the Korean labels of older logs.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "SUCCESS" | "success" | "성공" => Some(OutcomeKind::Success),
            "FAIL" | "fail" | "실패" => Some(OutcomeKind::Fail),
            "STAY" | "stay" | "유지" => Some(OutcomeKind::Stay),
            "DESTROYED" | "destroyed" | "파괴" => Some(OutcomeKind::Destroyed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logged reinforcement outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub base_level: u32,
    pub result_level: u32,
    pub timestamp: DateTime<Local>,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, base_level: u32, result_level: u32) -> Self {
        Self {
            kind,
            base_level,
            result_level,
            timestamp: Local::now(),
        }
    }
}

/// What one observation did to the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub outcome: Option<Outcome>,
    pub previous_level: Option<u32>,
}

/// Classifies one observation against the previous baseline level.
///
/// Destruction is checked before the level comparison because it also drops
/// the level to 0, which would otherwise read as a FAIL.
pub fn classify(previous_level: Option<u32>, obs: &GameObservation) -> Transition {
    let current = obs.level;

    let Some(previous) = previous_level else {
        return Transition {
            outcome: None,
            previous_level: Some(current),
        };
    };

    let unchanged = Transition {
        outcome: None,
        previous_level: Some(previous),
    };

    if obs.is_destroyed {
        if previous > 0 {
            return Transition {
                outcome: Some(Outcome::new(OutcomeKind::Destroyed, previous, 0)),
                previous_level: Some(0),
            };
        }
        return unchanged;
    }

    if current > previous {
        Transition {
            outcome: Some(Outcome::new(OutcomeKind::Success, previous, current)),
            previous_level: Some(current),
        }
    } else if current < previous && current > 0 {
        Transition {
            outcome: Some(Outcome::new(OutcomeKind::Fail, previous, current)),
            previous_level: Some(current),
        }
    } else if obs.is_stay && current == previous && current > 0 {
        Transition {
            outcome: Some(Outcome::new(OutcomeKind::Stay, previous, current)),
            previous_level: Some(previous),
        }
    } else {
        unchanged
    }
}

/// Stateful wrapper around [`classify`] that also debounces STAY.
///
/// A STAY leaves the level unchanged, so the level alone cannot tell a new
/// STAY from the same message seen again. After a STAY is reported, further
/// STAYs are suppressed until an observation whose newest result is not a
/// stay, or a different outcome, is seen.
#[derive(Debug, Default)]
pub struct OutcomeTracker {
    previous_level: Option<u32>,
    stay_reported: bool,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_level(&self) -> Option<u32> {
        self.previous_level
    }

    /// Feeds one observation; returns the outcome to log, if any.
    pub fn observe(&mut self, obs: &GameObservation) -> Option<Outcome> {
        if !obs.is_stay {
            self.stay_reported = false;
        }

        let transition = classify(self.previous_level, obs);
        self.previous_level = transition.previous_level;

        match transition.outcome {
            Some(outcome) if outcome.kind == OutcomeKind::Stay => {
                if self.stay_reported {
                    None
                } else {
                    self.stay_reported = true;
                    Some(outcome)
                }
            }
            Some(outcome) => {
                self.stay_reported = false;
                Some(outcome)
            }
            None => None,
        }
    }

    /// Forgets the baseline; the next observation is adopted as-is.
    ///
    /// Used after selling, when a fresh item replaces the old one.
    pub fn reset_baseline(&mut self) {
        self.previous_level = None;
        self.stay_reported = false;
    }
}
