use image::imageops::FilterType;
use image::{GrayImage, Luma, RgbaImage};

/// Prepares a chat window capture for Tesseract.
///
/// Grayscale, optional upscale (small Hangul glyphs recognize better when
/// enlarged), then Otsu binarization so text and bubble backgrounds separate
/// regardless of the chat theme's colors.
pub fn preprocess_for_ocr(img: &RgbaImage, scale: f32) -> GrayImage {
    let gray = image::imageops::grayscale(img);
    let gray = upscale(&gray, scale);
    let level = otsu_level(&gray);
    binarize(&gray, level)
}

/// Resizes by `scale`. Factors at or below 1.0 leave the image untouched.
pub fn upscale(img: &GrayImage, scale: f32) -> GrayImage {
    if scale <= 1.0 || img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    let width = (img.width() as f32 * scale).round() as u32;
    let height = (img.height() as f32 * scale).round() as u32;
    image::imageops::resize(img, width, height, FilterType::CatmullRom)
}

/// Computes the Otsu threshold: the gray level maximizing between-class variance.
pub fn otsu_level(img: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }

    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best_level = 0u8;
    let mut best_variance = 0.0f64;
    let mut background_weight = 0u64;
    let mut background_sum = 0.0f64;

    for (level, &count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_sum - background_sum) / foreground_weight as f64;
        let diff = background_mean - foreground_mean;
        let variance = background_weight as f64 * foreground_weight as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

/// Pixels above `level` become white, the rest black.
pub fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > level { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_otsu_splits_bimodal_image() {
        // Half dark (30), half bright (220)
        let img = GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([30]) } else { Luma([220]) });
        let level = otsu_level(&img);
        assert!(level >= 30 && level < 220, "level {} not between modes", level);
    }

    #[test]
    fn test_otsu_uniform_image() {
        let img = GrayImage::from_pixel(4, 4, Luma([128]));
        // Single class: no split improves variance
        assert_eq!(otsu_level(&img), 0);
    }

    #[test]
    fn test_binarize() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([10]));
        img.put_pixel(1, 0, Luma([100]));
        img.put_pixel(2, 0, Luma([200]));

        let result = binarize(&img, 100);

        assert_eq!(result.get_pixel(0, 0)[0], 0);
        assert_eq!(result.get_pixel(1, 0)[0], 0, "Pixel at the level stays black");
        assert_eq!(result.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_upscale() {
        let img = GrayImage::new(10, 20);
        assert_eq!(upscale(&img, 2.0).dimensions(), (20, 40));
        assert_eq!(upscale(&img, 1.0).dimensions(), (10, 20));
        assert_eq!(upscale(&img, 0.5).dimensions(), (10, 20));
    }

    #[test]
    fn test_preprocess_dark_text_on_light_bubble() {
        let img = RgbaImage::from_fn(8, 8, |x, y| {
            if x == y {
                Rgba([20, 20, 20, 255])
            } else {
                Rgba([250, 230, 80, 255])
            }
        });

        let out = preprocess_for_ocr(&img, 1.0);

        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(out.get_pixel(3, 3)[0], 0, "Text pixel should be black");
        assert_eq!(out.get_pixel(3, 4)[0], 255, "Background should be white");
    }
}
