//! Configuration types for the reinforcement macro.
//!
//! Loaded once at startup from config.json and passed by reference into the
//! driver loop. Provides screen regions, thresholds and timing parameters.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A rectangle in absolute screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRect {
    /// X position of top-left corner
    pub x: i32,
    /// Y position of top-left corner
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Complete macro configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Stop once the item reaches this enhancement level
    pub target_level: u32,
    /// Total run duration in minutes
    pub duration_minutes: u64,
    /// Print the dashboard every N logged outcomes
    pub dashboard_every: u32,
    /// Sleep between poll cycles (milliseconds)
    pub poll_interval_ms: u64,
    /// Countdown before the first cycle, to focus the chat window
    pub start_delay_secs: u64,
    /// Chat window area read by OCR
    pub ocr_region: ScreenRect,
    /// Sub-region searched for buttons; excludes stale messages higher up
    pub click_region: ScreenRect,
    /// Tesseract language hint
    pub ocr_language: String,
    /// Tesseract page segmentation mode
    pub ocr_psm: u8,
    /// Upscale factor applied before binarization
    pub ocr_scale: f32,
    /// Explicit tesseract executable, if not installed in a standard location
    pub tesseract_path: Option<String>,
    /// Minimum normalized correlation for a template match (0.0-1.0)
    pub match_confidence: f32,
    /// Template matching runs on images shrunk by this factor
    pub match_downscale: u32,
    /// Sell button template file name (inside resources/template)
    pub sell_template: String,
    /// Reinforce button template file name (inside resources/template)
    pub reinforce_template: String,
    /// Outcome log, relative paths resolve against the executable directory
    pub results_csv: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            target_level: 10,
            duration_minutes: 60,
            dashboard_every: 10,
            poll_interval_ms: 1500,
            start_delay_secs: 3,
            ocr_region: ScreenRect::new(964, 1, 900, 1030),
            click_region: ScreenRect::new(964, 700, 900, 331),
            ocr_language: "kor+eng".to_string(),
            ocr_psm: 6,
            ocr_scale: 1.5,
            tesseract_path: None,
            match_confidence: 0.8,
            match_downscale: 2,
            sell_template: "sell_button.png".to_string(),
            reinforce_template: "reinforce_button.png".to_string(),
            results_csv: "results.csv".to_string(),
        }
    }
}

impl BotConfig {
    /// Loads configuration from `path`, falling back to defaults when the
    /// file is missing or invalid.
    pub fn load(path: &Path) -> Self {
        crate::log(&format!("Looking for config at: {}", path.display()));

        if !path.exists() {
            crate::log("config.json not found. Using default config.");
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                crate::log("Config loaded from config.json");
                config
            }
            Err(e) => {
                crate::log(&format!("{:#}. Using defaults.", e));
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("Failed to read config.json")?;
        serde_json::from_str(&contents).context("Failed to parse config.json")
    }

    /// Writes this configuration as pretty JSON (used to seed a config file).
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json).context(format!("Failed to write {}", path.display()))
    }
}
