//! The driver loop's view of the game: read the chat window, press buttons.

use anyhow::Result;
use std::path::PathBuf;

use crate::automation::action::Button;
use crate::automation::config::BotConfig;
use crate::automation::detection::locate_button;
use crate::automation::input::click_at_screen;
use crate::capture::capture_region;
use crate::ocr::{read_screen_text, TesseractEngine};

pub trait GameScreen {
    /// Captures the chat window and returns its OCR text.
    fn read_text(&mut self) -> Result<String>;

    /// Presses `button`. `Ok(false)` means no live button was found.
    fn press(&mut self, button: Button) -> Result<bool>;
}

/// The real desktop: GDI capture, Tesseract, template matching, SendInput.
pub struct DesktopScreen<'a> {
    config: &'a BotConfig,
    engine: TesseractEngine,
    template_dir: PathBuf,
}

impl<'a> DesktopScreen<'a> {
    pub fn new(config: &'a BotConfig, engine: TesseractEngine, template_dir: PathBuf) -> Self {
        Self {
            config,
            engine,
            template_dir,
        }
    }

    fn template_path(&self, button: Button) -> PathBuf {
        let name = match button {
            Button::Sell => &self.config.sell_template,
            Button::Reinforce => &self.config.reinforce_template,
        };
        self.template_dir.join(name)
    }
}

impl GameScreen for DesktopScreen<'_> {
    fn read_text(&mut self) -> Result<String> {
        let img = capture_region(&self.config.ocr_region)?;
        read_screen_text(&img, &self.engine, self.config.ocr_scale)
    }

    fn press(&mut self, button: Button) -> Result<bool> {
        let region = self.config.click_region;
        let img = capture_region(&region)?;

        let Some(found) = locate_button(
            &img,
            &self.template_path(button),
            self.config.match_confidence,
            self.config.match_downscale,
        )?
        else {
            return Ok(false);
        };

        let (cx, cy) = found.center();
        let (x, y) = (region.x + cx as i32, region.y + cy as i32);
        crate::log(&format!(
            "Clicking {} button at ({}, {}) (score {:.2})",
            button, x, y, found.score
        ));
        click_at_screen(x, y)?;
        Ok(true)
    }
}
