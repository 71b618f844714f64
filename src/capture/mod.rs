//! Screen capture for the chat window.
//!
//! This module provides:
//! - Screen rectangle capture (`capture_region`)

pub mod screen;

pub use screen::capture_region;
