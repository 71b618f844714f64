//! Reinforce Macro
//!
//! A console bot that reads a chat-based item reinforcement game through OCR,
//! presses the reinforce or sell button, and logs every outcome to CSV.

mod analysis;
mod automation;
mod capture;
mod ocr;
mod paths;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use automation::{BotConfig, DesktopScreen, ABORT_REQUESTED};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("reinforce_macro.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "OCR-driven item reinforcement macro")]
struct Args {
    /// Config file (defaults to config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the reinforcement loop (default)
    Run {
        /// Stop at this enhancement level
        #[arg(long)]
        target: Option<u32>,
        /// Run duration in minutes
        #[arg(long)]
        minutes: Option<u64>,
        /// Outcome CSV path
        #[arg(long)]
        csv: Option<String>,
    },
    /// Print outcome statistics from an existing CSV
    Dashboard {
        #[arg(long)]
        csv: Option<String>,
    },
    /// Capture the chat window once and show what OCR reads
    OcrTest,
    /// Locate Tesseract, fetch language data, and write a default config
    Setup,
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join("reinforce_macro.log");
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    let args = Args::parse();

    // Ensure output directories exist
    paths::ensure_directories()?;

    let config_path = args.config.unwrap_or_else(paths::get_config_path);
    let mut config = BotConfig::load(&config_path);

    match args.command.unwrap_or(Command::Run {
        target: None,
        minutes: None,
        csv: None,
    }) {
        Command::Run {
            target,
            minutes,
            csv,
        } => {
            if let Some(target) = target {
                config.target_level = target;
            }
            if let Some(minutes) = minutes {
                config.duration_minutes = minutes;
            }
            if let Some(csv) = csv {
                config.results_csv = csv;
            }
            run(&config)
        }
        Command::Dashboard { csv } => {
            let csv_path = paths::resolve(csv.as_deref().unwrap_or(&config.results_csv));
            analysis::show_dashboard(&csv_path)?;
            Ok(())
        }
        Command::OcrTest => ocr_test(&config),
        Command::Setup => setup(&config, &config_path),
    }
}

fn run(config: &BotConfig) -> Result<()> {
    let engine = tesseract_engine(config)?;

    if let Err(e) = automation::install_interrupt_handler() {
        log(&format!("Warning: failed to install Ctrl+C handler: {:#}", e));
    }

    let mut screen = DesktopScreen::new(config, engine, paths::get_template_dir());
    let summary = automation::run_automation(config, &mut screen, &ABORT_REQUESTED);

    match summary.final_level {
        Some(level) => log(&format!(
            "Done: {} ({} outcomes, final level +{})",
            summary.reason, summary.attempts, level
        )),
        None => log(&format!("Done: {} (no observation)", summary.reason)),
    }
    Ok(())
}

fn ocr_test(config: &BotConfig) -> Result<()> {
    let engine = tesseract_engine(config)?;

    let img = capture::capture_region(&config.ocr_region)?;
    let preprocessed = ocr::preprocess::preprocess_for_ocr(&img, config.ocr_scale);
    let debug_path = paths::get_exe_dir().join("debug_preprocessed.png");
    preprocessed
        .save(&debug_path)
        .context("Failed to save preprocessed image")?;
    log(&format!("Preprocessed image saved to {}", debug_path.display()));

    let text = engine.recognize_text(&preprocessed)?;
    log("----- OCR text -----");
    for line in text.lines() {
        log(line);
    }
    log("--------------------");

    let obs = ocr::parse_observation(&text);
    log(&format!(
        "Parsed: level +{}, gold {}, stay {}, destroyed {}, gold insufficient {}",
        obs.level, obs.gold, obs.is_stay, obs.is_destroyed, obs.is_gold_insufficient
    ));
    Ok(())
}

fn setup(config: &BotConfig, config_path: &std::path::Path) -> Result<()> {
    let tesseract = ocr::ensure_tesseract(config.tesseract_path.as_deref(), &config.ocr_language)?;
    log(&format!(
        "Tesseract ready: {} (tessdata: {})",
        tesseract.executable.display(),
        tesseract
            .tessdata
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string())
    ));

    if !config_path.exists() {
        config.save(config_path)?;
        log(&format!("Wrote default config to {}", config_path.display()));
    }

    let template_dir = paths::get_template_dir();
    for name in [&config.reinforce_template, &config.sell_template] {
        let path = template_dir.join(name);
        if !path.exists() {
            log(&format!(
                "Missing button template: {} (crop it from a screenshot)",
                path.display()
            ));
        }
    }
    Ok(())
}

fn tesseract_engine(config: &BotConfig) -> Result<ocr::TesseractEngine> {
    let tesseract = ocr::ensure_tesseract(config.tesseract_path.as_deref(), &config.ocr_language)
        .context("Tesseract is required; run the `setup` command")?;
    Ok(ocr::TesseractEngine::new(
        tesseract,
        &config.ocr_language,
        config.ocr_psm,
    ))
}
