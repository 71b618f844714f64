//! Driver loop: capture → OCR → parse → classify → log → act → sleep.
//!
//! Single-threaded. The only cancellation path is the interrupt flag, checked
//! every cycle and during sleeps.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::analysis::show_dashboard;
use crate::automation::action::{select_action, Action, Button};
use crate::automation::config::BotConfig;
use crate::automation::csv_writer::{append_outcome, init_csv};
use crate::automation::outcome::OutcomeTracker;
use crate::automation::screen::GameScreen;
use crate::ocr::parse_observation;

/// Global abort flag - set by the console interrupt handler.
pub static ABORT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Requests abort of the running loop.
pub fn request_abort() {
    ABORT_REQUESTED.store(true, Ordering::SeqCst);
}

/// Routes Ctrl+C / console close to [`request_abort`] instead of killing
/// the process, so the final dashboard still prints.
#[cfg(windows)]
pub fn install_interrupt_handler() -> anyhow::Result<()> {
    use windows::Win32::Foundation::{BOOL, TRUE};
    use windows::Win32::System::Console::SetConsoleCtrlHandler;

    unsafe extern "system" fn handler(_ctrl_type: u32) -> BOOL {
        request_abort();
        TRUE
    }

    unsafe { SetConsoleCtrlHandler(Some(handler), TRUE)? };
    Ok(())
}

#[cfg(not(windows))]
pub fn install_interrupt_handler() -> anyhow::Result<()> {
    crate::log("Interrupt handler not available on this platform; the run ends on its deadline");
    Ok(())
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    DurationElapsed,
    Interrupted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::TargetReached => write!(f, "target level reached"),
            StopReason::DurationElapsed => write!(f, "run duration elapsed"),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Mutable loop state, owned by [`run_automation`].
#[derive(Debug)]
pub struct RunState {
    pub tracker: OutcomeTracker,
    /// Outcomes logged so far
    pub attempt_count: u32,
    pub start_time: Instant,
    pub deadline: Instant,
}

impl RunState {
    pub fn new(duration: Duration) -> Self {
        let start_time = Instant::now();
        Self {
            tracker: OutcomeTracker::new(),
            attempt_count: 0,
            start_time,
            deadline: start_time + duration,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: StopReason,
    pub attempts: u32,
    pub cycles: u32,
    pub final_level: Option<u32>,
}

/// Runs the macro until the target level, the deadline, or an interrupt.
///
/// The final dashboard is printed in every case.
pub fn run_automation(
    config: &BotConfig,
    screen: &mut dyn GameScreen,
    abort: &AtomicBool,
) -> RunSummary {
    let csv_path = results_csv_path(config);
    if let Err(e) = init_csv(&csv_path) {
        crate::log(&format!("Failed to initialize CSV file: {:#}", e));
    }

    crate::log(&format!(
        "Starting reinforcement: target +{}, {} min (Ctrl+C to stop)",
        config.target_level, config.duration_minutes
    ));
    crate::log(&format!("Results CSV: {}", csv_path.display()));

    countdown(config.start_delay_secs, abort);

    let mut state = RunState::new(Duration::from_secs(config.duration_minutes * 60));
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    let mut cycles = 0u32;

    let reason = loop {
        if abort.load(Ordering::SeqCst) {
            break StopReason::Interrupted;
        }
        if Instant::now() >= state.deadline {
            break StopReason::DurationElapsed;
        }
        cycles += 1;

        if let Some(reason) = run_cycle(config, screen, &mut state, &csv_path, cycles) {
            break reason;
        }

        sleep_unless_aborted(poll_interval, abort);
    };

    crate::log(&format!(
        "Stopped ({}): {} outcomes in {} cycles, {:.0?} elapsed",
        reason,
        state.attempt_count,
        cycles,
        state.start_time.elapsed()
    ));
    print_dashboard(&csv_path);

    RunSummary {
        reason,
        attempts: state.attempt_count,
        cycles,
        final_level: state.tracker.previous_level(),
    }
}

/// One poll cycle. Returns a stop reason when the target is reached.
fn run_cycle(
    config: &BotConfig,
    screen: &mut dyn GameScreen,
    state: &mut RunState,
    csv_path: &Path,
    cycle: u32,
) -> Option<StopReason> {
    let text = match screen.read_text() {
        Ok(text) => text,
        Err(e) => {
            crate::log(&format!("Cycle {}: no observation ({:#})", cycle, e));
            return None;
        }
    };

    let obs = parse_observation(&text);
    let remaining = state.remaining().as_secs();
    crate::log(&format!(
        "Cycle {}: +{} gold {}{}{}{} ({:02}:{:02} left)",
        cycle,
        obs.level,
        obs.gold,
        if obs.is_stay { " [stay]" } else { "" },
        if obs.is_destroyed { " [destroyed]" } else { "" },
        if obs.is_gold_insufficient { " [no gold]" } else { "" },
        remaining / 60,
        remaining % 60
    ));

    if let Some(outcome) = state.tracker.observe(&obs) {
        state.attempt_count += 1;
        crate::log(&format!(
            "Outcome #{}: {} (+{} -> +{})",
            state.attempt_count, outcome.kind, outcome.base_level, outcome.result_level
        ));
        if let Err(e) = append_outcome(csv_path, &outcome) {
            crate::log(&format!("Failed to write CSV row: {:#}", e));
        }
        if config.dashboard_every > 0 && state.attempt_count % config.dashboard_every == 0 {
            print_dashboard(csv_path);
        }
    }

    match select_action(&obs, config.target_level) {
        Action::Stop => {
            crate::log(&format!("Reached +{} (target +{})", obs.level, config.target_level));
            Some(StopReason::TargetReached)
        }
        Action::Click(button) => {
            match screen.press(button) {
                Ok(true) => {
                    if button == Button::Sell {
                        state.tracker.reset_baseline();
                    }
                }
                Ok(false) => {
                    crate::log(&format!("No {} button found, no action taken", button))
                }
                Err(e) => crate::log(&format!(
                    "Pressing {} failed, no action taken: {:#}",
                    button, e
                )),
            }
            None
        }
    }
}

fn print_dashboard(csv_path: &Path) {
    if let Err(e) = show_dashboard(csv_path) {
        crate::log(&format!("Dashboard unavailable: {:#}", e));
    }
}

fn countdown(secs: u64, abort: &AtomicBool) {
    for remaining in (1..=secs).rev() {
        if abort.load(Ordering::SeqCst) {
            return;
        }
        crate::log(&format!("Starting in {}...", remaining));
        sleep_unless_aborted(Duration::from_secs(1), abort);
    }
}

/// Sleeps in short slices so an interrupt is noticed promptly.
fn sleep_unless_aborted(duration: Duration, abort: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(100);
    let end = Instant::now() + duration;
    while !abort.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= end {
            break;
        }
        std::thread::sleep(SLICE.min(end - now));
    }
}

/// Default results CSV location for a config.
pub fn results_csv_path(config: &BotConfig) -> PathBuf {
    crate::paths::resolve(&config.results_csv)
}
