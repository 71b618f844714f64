//! Button detection via template matching.
//!
//! Buttons are located by normalized cross-correlation of a reference image
//! against a capture of the click region. Older chat messages carry identical
//! (stale) buttons, so the lowest match on screen is the live one.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{GrayImage, RgbaImage};
use imageproc::template_matching::{match_template, MatchTemplateMethod};
use std::path::Path;

/// A template match in region pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Normalized cross-correlation, 0.0 to 1.0
    pub score: f32,
}

impl MatchRect {
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    fn overlaps(&self, other: &MatchRect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Loads a button template as grayscale.
///
/// A missing file is not an error: it means the button cannot be pressed.
pub fn load_template(path: &Path) -> Result<Option<GrayImage>> {
    if !path.exists() {
        return Ok(None);
    }
    let img = image::open(path)
        .context(format!("Failed to load template {}", path.display()))?;
    Ok(Some(img.to_luma8()))
}

/// Finds the live button in a capture of the click region.
///
/// Returns `Ok(None)` when the template file is missing or nothing scores
/// above `threshold`.
pub fn locate_button(
    region: &RgbaImage,
    template_path: &Path,
    threshold: f32,
    downscale: u32,
) -> Result<Option<MatchRect>> {
    let Some(template) = load_template(template_path)? else {
        crate::log(&format!("Template not found: {}", template_path.display()));
        return Ok(None);
    };

    let haystack = image::imageops::grayscale(region);
    let matches = find_matches(&haystack, &template, threshold, downscale);
    Ok(pick_lowest(&matches))
}

/// All non-overlapping matches scoring at least `threshold`.
///
/// With `downscale > 1` both images are shrunk first; coordinates are mapped
/// back to full resolution.
pub fn find_matches(
    haystack: &GrayImage,
    template: &GrayImage,
    threshold: f32,
    downscale: u32,
) -> Vec<MatchRect> {
    let factor = downscale.max(1);
    let (tw, th) = template.dimensions();

    let shrink = |len: u32| (len / factor).max(1);
    let (hay, tpl) = if factor > 1 && tw / factor >= 4 && th / factor >= 4 {
        (
            image::imageops::resize(
                haystack,
                shrink(haystack.width()),
                shrink(haystack.height()),
                FilterType::Triangle,
            ),
            image::imageops::resize(template, shrink(tw), shrink(th), FilterType::Triangle),
        )
    } else {
        (haystack.clone(), template.clone())
    };
    let scale = if hay.width() == haystack.width() { 1 } else { factor };

    let (hw, hh) = hay.dimensions();
    let (sw, sh) = tpl.dimensions();
    if sw == 0 || sh == 0 || sw > hw || sh > hh {
        return Vec::new();
    }

    let scores = match_template(&hay, &tpl, MatchTemplateMethod::CrossCorrelationNormalized);
    let mut candidates: Vec<MatchRect> = scores
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0].is_finite() && p[0] >= threshold)
        .map(|(x, y, p)| MatchRect {
            x: (x * scale).min(haystack.width().saturating_sub(tw)),
            y: (y * scale).min(haystack.height().saturating_sub(th)),
            width: tw,
            height: th,
            score: p[0],
        })
        .collect();

    // Non-maximum suppression: best score first, drop anything overlapping it
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<MatchRect> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| !k.overlaps(&candidate)) {
            kept.push(candidate);
        }
    }
    kept
}

/// The match lowest on screen (greatest y); score breaks ties.
pub fn pick_lowest(matches: &[MatchRect]) -> Option<MatchRect> {
    matches
        .iter()
        .copied()
        .max_by(|a, b| a.y.cmp(&b.y).then(a.score.total_cmp(&b.score)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// 8x6 pattern with enough structure to correlate.
    fn pattern() -> GrayImage {
        GrayImage::from_fn(8, 6, |x, y| {
            if (x / 2 + y / 2) % 2 == 0 {
                Luma([30])
            } else {
                Luma([220])
            }
        })
    }

    fn paste(canvas: &mut GrayImage, tpl: &GrayImage, at: (u32, u32)) {
        for (x, y, p) in tpl.enumerate_pixels() {
            canvas.put_pixel(at.0 + x, at.1 + y, *p);
        }
    }

    #[test]
    fn test_exact_match_found() {
        let tpl = pattern();
        let mut canvas = GrayImage::from_pixel(40, 30, Luma([128]));
        paste(&mut canvas, &tpl, (10, 12));

        let matches = find_matches(&canvas, &tpl, 0.95, 1);

        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].x, matches[0].y), (10, 12));
        assert!(matches[0].score > 0.99);
        assert_eq!(matches[0].center(), (14, 15));
    }

    #[test]
    fn test_lowest_match_is_picked() {
        let tpl = pattern();
        let mut canvas = GrayImage::from_pixel(40, 60, Luma([128]));
        // Stale button higher up, live button at the bottom
        paste(&mut canvas, &tpl, (5, 4));
        paste(&mut canvas, &tpl, (20, 40));

        let matches = find_matches(&canvas, &tpl, 0.95, 1);
        assert_eq!(matches.len(), 2);

        let live = pick_lowest(&matches).unwrap();
        assert_eq!((live.x, live.y), (20, 40));
    }

    #[test]
    fn test_no_match_below_threshold() {
        let tpl = pattern();
        let canvas = GrayImage::from_fn(40, 30, |x, _| Luma([(x * 6) as u8]));
        assert!(find_matches(&canvas, &tpl, 0.95, 1).is_empty());
        assert!(pick_lowest(&[]).is_none());
    }

    #[test]
    fn test_template_larger_than_region() {
        let tpl = pattern();
        let canvas = GrayImage::from_pixel(4, 4, Luma([0]));
        assert!(find_matches(&canvas, &tpl, 0.5, 1).is_empty());
    }

    #[test]
    fn test_downscaled_match_maps_back() {
        let tpl = GrayImage::from_fn(32, 16, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Luma([20])
            } else {
                Luma([235])
            }
        });
        let mut canvas = GrayImage::from_pixel(128, 96, Luma([128]));
        paste(&mut canvas, &tpl, (48, 64));

        // Flat background against this template scores about 0.76
        let matches = find_matches(&canvas, &tpl, 0.9, 2);
        let best = pick_lowest(&matches).unwrap();

        assert!((best.x as i64 - 48).abs() <= 2, "x = {}", best.x);
        assert!((best.y as i64 - 64).abs() <= 2, "y = {}", best.y);
        assert_eq!((best.width, best.height), (32, 16));
    }

    #[test]
    fn test_missing_template_is_no_action() {
        let dir = tempfile::tempdir().unwrap();
        let region = RgbaImage::new(20, 20);
        let result = locate_button(&region, &dir.path().join("missing.png"), 0.8, 1).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_locate_button_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let tpl_path = dir.path().join("reinforce_button.png");
        pattern().save(&tpl_path).unwrap();

        let mut canvas = GrayImage::from_pixel(30, 30, Luma([128]));
        paste(&mut canvas, &pattern(), (3, 20));
        let region = image::DynamicImage::ImageLuma8(canvas).to_rgba8();

        let found = locate_button(&region, &tpl_path, 0.95, 1).unwrap().unwrap();
        assert_eq!((found.x, found.y), (3, 20));
    }
}
