pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::TesseractEngine;
pub use extract::parse_observation;
pub use setup::ensure_tesseract;

use anyhow::Result;
use image::RgbaImage;

/// High-level function: chat window capture → raw OCR text.
pub fn read_screen_text(img: &RgbaImage, engine: &TesseractEngine, scale: f32) -> Result<String> {
    let preprocessed = preprocess::preprocess_for_ocr(img, scale);
    engine.recognize_text(&preprocessed)
}
