//! Reinforcement automation.
//!
//! This module provides:
//! - Outcome classification from consecutive observations
//! - Action selection (reinforce, sell, stop)
//! - Button detection via template matching and mouse input
//! - The driver loop and CSV outcome log

pub mod action;
pub mod config;
pub mod csv_writer;
pub mod detection;
pub mod input;
pub mod outcome;
pub mod runner;
pub mod screen;

pub use config::BotConfig;
pub use runner::{install_interrupt_handler, run_automation, ABORT_REQUESTED};
pub use screen::DesktopScreen;
