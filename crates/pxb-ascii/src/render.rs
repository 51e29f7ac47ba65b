use image::GrayImage;
use pxb_core::{BotConfig, CoreError};
use pxb_core::ramp::{GlyphLut, Ramp};
use pxb_source::codec::decode;
use pxb_source::resize::Resizer;

use crate::art::AsciiArt;

/// Paramètres du rendu ASCII.
///
/// # Example
/// ```
/// use pxb_ascii::AsciiOptions;
/// let opts = AsciiOptions::default();
/// assert_eq!(opts.width, 40);
/// assert_eq!(opts.max_rows(), 96);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AsciiOptions {
    /// Glyphs per row.
    pub width: u32,
    /// Largest text the transport accepts, in characters.
    pub char_budget: usize,
    /// Glyphs are taller than wide; rows are scaled by this factor.
    pub aspect_correction: f64,
}

impl Default for AsciiOptions {
    fn default() -> Self {
        Self {
            width: 40,
            char_budget: 4000,
            aspect_correction: 0.55,
        }
    }
}

impl AsciiOptions {
    /// ASCII settings of a bot configuration.
    #[must_use]
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            width: config.ascii_width,
            char_budget: config.char_budget,
            aspect_correction: config.aspect_correction,
        }
    }

    /// `floor((budget - (W+1)) / (W+1))`, saturating at zero.
    #[must_use]
    pub fn max_rows(&self) -> usize {
        let line = self.width as usize + 1;
        self.char_budget.saturating_sub(line) / line
    }

    /// `floor(height / width * W * aspect_correction)`, at least 1.
    #[must_use]
    pub fn target_height(&self, src_width: u32, src_height: u32) -> u32 {
        let aspect_ratio = f64::from(src_height) / f64::from(src_width);
        let h = (aspect_ratio * f64::from(self.width) * self.aspect_correction).floor();
        (h as u32).max(1)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.width == 0 {
            return Err(CoreError::InvalidConfiguration(
                "ASCII width must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Decode `bytes` and render them as ASCII art.
///
/// Rows beyond [`AsciiOptions::max_rows`] are silently dropped, as are rows
/// whose escaped code block would exceed the character budget. The count is
/// kept in [`AsciiArt::dropped_rows`].
///
/// # Errors
/// - `CoreError::InvalidConfiguration` for a zero width or an empty ramp,
///   checked before decoding.
/// - `CoreError::InvalidImage` if the bytes are not a decodable image.
pub fn render_ascii(bytes: &[u8], ramp: &Ramp, opts: &AsciiOptions) -> Result<AsciiArt, CoreError> {
    opts.validate()?;
    let lut = GlyphLut::new(ramp)?;
    let gray = decode(bytes)?.to_luma8();
    render_with_lut(&gray, &lut, opts)
}

/// Render an already decoded grayscale image.
///
/// # Errors
/// `CoreError::InvalidConfiguration` for a zero width or an empty ramp.
///
/// # Example
/// ```
/// use image::{GrayImage, Luma};
/// use pxb_ascii::{AsciiOptions, render_gray};
/// use pxb_core::Ramp;
///
/// let img = GrayImage::from_pixel(200, 100, Luma([0]));
/// let art = render_gray(&img, &Ramp::default(), &AsciiOptions::default()).unwrap();
/// assert_eq!(art.lines().len(), 11);
/// assert!(art.lines().iter().all(|l| l == &"@".repeat(40)));
/// ```
pub fn render_gray(gray: &GrayImage, ramp: &Ramp, opts: &AsciiOptions) -> Result<AsciiArt, CoreError> {
    opts.validate()?;
    let lut = GlyphLut::new(ramp)?;
    render_with_lut(gray, &lut, opts)
}

fn render_with_lut(gray: &GrayImage, lut: &GlyphLut, opts: &AsciiOptions) -> Result<AsciiArt, CoreError> {
    let (src_w, src_h) = gray.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(CoreError::InvalidImage(format!("empty image {src_w}×{src_h}")));
    }

    let width = opts.width;
    let height = opts.target_height(src_w, src_h);
    let resized = Resizer::box_filter().resize_gray(gray, width, height)?;

    let rows = height as usize;
    let kept = rows.min(opts.max_rows());
    // Seules les lignes conservées sont converties en glyphes.
    let lines: Vec<String> = resized
        .as_raw()
        .chunks(width as usize)
        .take(kept)
        .map(|row| row.iter().map(|&v| lut.map(v)).collect())
        .collect();

    let mut art = AsciiArt::new(width, lines, rows - kept);
    art.fit_markdown(opts.char_budget);
    if art.dropped_rows() > 0 {
        log::debug!(
            "ASCII : {} lignes tronquées (budget {})",
            art.dropped_rows(),
            opts.char_budget
        );
    }
    Ok(art)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use image::{DynamicImage, ImageFormat, Luma, Rgb, RgbImage};

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn noisy(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x * 31 % 256) as u8, (y * 17 % 256) as u8, ((x ^ y) % 256) as u8])
        }))
    }

    #[test]
    fn wide_image_gets_eleven_rows_of_forty() {
        let bytes = png_bytes(&noisy(200, 100));
        let art = render_ascii(&bytes, &Ramp::default(), &AsciiOptions::default()).unwrap();
        assert_eq!(art.lines().len(), 11);
        assert!(art.lines().iter().all(|l| l.chars().count() == 40));
        assert_eq!(art.dropped_rows(), 0);
    }

    #[test]
    fn rendering_is_deterministic() {
        let bytes = png_bytes(&noisy(120, 90));
        let ramp = Ramp::new("#o. ");
        let opts = AsciiOptions::default();
        let a = render_ascii(&bytes, &ramp, &opts).unwrap();
        let b = render_ascii(&bytes, &ramp, &opts).unwrap();
        assert_eq!(a.to_text(), b.to_text());
    }

    #[test]
    fn tall_image_is_truncated_to_budget() {
        let gray = GrayImage::from_pixel(40, 1000, Luma([128]));
        let opts = AsciiOptions::default();
        let art = render_gray(&gray, &Ramp::default(), &opts).unwrap();
        assert_eq!(art.lines().len(), opts.max_rows());
        assert_eq!(art.dropped_rows(), 550 - 96);
        assert!(art.to_text().chars().count() <= opts.char_budget);
    }

    #[test]
    fn backtick_ramp_block_stays_within_budget() {
        let gray = GrayImage::from_pixel(40, 1000, Luma([0]));
        let opts = AsciiOptions::default();
        let art = render_gray(&gray, &Ramp::new("`"), &opts).unwrap();
        // 8 + rows × (2 × 40 + 1)
        assert_eq!(art.lines().len(), (4000 - 8) / 81);
        assert_eq!(art.dropped_rows(), 550 - art.lines().len());
        assert!(art.to_markdown_block().chars().count() <= opts.char_budget);
    }

    #[test]
    fn default_ramp_block_is_not_cut_further() {
        let gray = GrayImage::from_pixel(40, 1000, Luma([0]));
        let opts = AsciiOptions::default();
        let art = render_gray(&gray, &Ramp::default(), &opts).unwrap();
        assert_eq!(art.lines().len(), 96);
        assert!(art.to_markdown_block().chars().count() <= opts.char_budget);
    }

    #[test]
    fn one_pixel_wide_strip_keeps_only_budget_rows() {
        let gray = GrayImage::from_pixel(1, 4000, Luma([255]));
        let art = render_gray(&gray, &Ramp::default(), &AsciiOptions::default()).unwrap();
        // floor(4000 / 1 × 40 × 0.55)
        assert_eq!(art.lines().len() + art.dropped_rows(), 88_000);
        assert_eq!(art.lines().len(), 96);
        assert_eq!(art.width(), 40);
    }

    #[test]
    fn white_maps_to_lightest_glyph() {
        let gray = GrayImage::from_pixel(80, 80, Luma([255]));
        let art = render_gray(&gray, &Ramp::default(), &AsciiOptions::default()).unwrap();
        assert!(art.to_text().chars().all(|c| c == ' ' || c == '\n'));
    }

    #[test]
    fn empty_ramp_is_invalid_configuration() {
        let bytes = png_bytes(&noisy(10, 10));
        let err = render_ascii(&bytes, &Ramp::new(""), &AsciiOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }

    #[test]
    fn zero_width_is_invalid_configuration() {
        let opts = AsciiOptions {
            width: 0,
            ..AsciiOptions::default()
        };
        let err = render_ascii(b"whatever", &Ramp::default(), &opts).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }

    #[test]
    fn garbage_bytes_are_invalid_image() {
        let err = render_ascii(b"\x00\x01\x02", &Ramp::default(), &AsciiOptions::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidImage(_)));
    }

    #[test]
    fn very_wide_image_still_gets_a_row() {
        let gray = GrayImage::from_pixel(4000, 10, Luma([0]));
        let art = render_gray(&gray, &Ramp::default(), &AsciiOptions::default()).unwrap();
        assert_eq!(art.lines().len(), 1);
    }

    #[test]
    fn options_follow_config() {
        let mut config = BotConfig::default();
        config.ascii_width = 60;
        let opts = AsciiOptions::from_config(&config);
        assert_eq!(opts.width, 60);
        assert_eq!(opts.char_budget, 4000);
    }

    #[test]
    fn narrow_width_budget_math() {
        let opts = AsciiOptions {
            width: 9,
            char_budget: 100,
            aspect_correction: 0.55,
        };
        // (100 - 10) / 10
        assert_eq!(opts.max_rows(), 9);
    }
}
