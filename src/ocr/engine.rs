use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// Tesseract invocation settings.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    paths: TesseractPaths,
    /// Language hint, e.g. "kor+eng"
    language: String,
    /// Page segmentation mode
    psm: u8,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, language: &str, psm: u8) -> Self {
        Self {
            paths,
            language: language.to_string(),
            psm,
        }
    }

    /// Runs Tesseract on a preprocessed grayscale image and returns the raw text.
    ///
    /// Line order follows the image top to bottom. An empty string is a
    /// valid result.
    pub fn recognize_text(&self, img: &GrayImage) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let mut command = Command::new(&self.paths.executable);
        command.arg(temp_input.path()).arg("stdout");
        if let Some(tessdata) = &self.paths.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        command
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string());

        let output = command
            .output()
            .context(format!("Failed to run {}", self.paths.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(normalize_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Drops blank lines and trailing whitespace; Tesseract pads paragraphs
/// with empty lines and ends pages with a form feed.
fn normalize_output(raw: &str) -> String {
    raw.lines()
        .map(|line| line.trim_end_matches(['\u{c}', ' ', '\t', '\r']))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
