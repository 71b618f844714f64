//! Per-cycle action selection.

use crate::ocr::extract::GameObservation;

/// Buttons the macro knows how to press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Sell,
    Reinforce,
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Button::Sell => write!(f, "sell"),
            Button::Reinforce => write!(f, "reinforce"),
        }
    }
}

/// What the driver loop does this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Click(Button),
    /// Target level reached
    Stop,
}

/// Chooses the action for the current observation.
///
/// Running out of gold takes priority: the item is sold for gold before any
/// further reinforcement.
pub fn select_action(obs: &GameObservation, target_level: u32) -> Action {
    if obs.is_gold_insufficient {
        Action::Click(Button::Sell)
    } else if obs.level < target_level {
        Action::Click(Button::Reinforce)
    } else {
        Action::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(level: u32, insufficient: bool) -> GameObservation {
        GameObservation {
            level,
            is_gold_insufficient: insufficient,
            ..Default::default()
        }
    }

    #[test]
    fn test_reinforce_below_target() {
        assert_eq!(select_action(&obs(3, false), 10), Action::Click(Button::Reinforce));
        assert_eq!(select_action(&obs(0, false), 10), Action::Click(Button::Reinforce));
    }

    #[test]
    fn test_sell_when_gold_insufficient() {
        assert_eq!(select_action(&obs(3, true), 10), Action::Click(Button::Sell));
        // Even at target, a shortage message means sell first
        assert_eq!(select_action(&obs(10, true), 10), Action::Click(Button::Sell));
    }

    #[test]
    fn test_stop_at_target() {
        assert_eq!(select_action(&obs(10, false), 10), Action::Stop);
        assert_eq!(select_action(&obs(11, false), 10), Action::Stop);
    }
}
