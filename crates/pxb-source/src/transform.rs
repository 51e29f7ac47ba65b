use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, RgbaImage};
use pxb_core::CoreError;

use crate::resize::Resizer;

/// Pixelate by downscaling then upscaling with nearest-neighbor sampling.
///
/// Each output `block × block` square has one color. The result is
/// `(max(w / block, 1) * block) × (max(h / block, 1) * block)`, so trailing
/// rows and columns that do not fill a whole block are dropped.
///
/// # Errors
/// Returns `CoreError::InvalidConfiguration` if `block` is zero.
///
/// # Example
/// ```
/// use image::{DynamicImage, RgbImage};
/// use pxb_source::transform::pixelate;
/// let img = DynamicImage::ImageRgb8(RgbImage::new(45, 30));
/// let out = pixelate(&img, 20).unwrap();
/// assert_eq!((out.width(), out.height()), (40, 20));
/// ```
pub fn pixelate(img: &DynamicImage, block: u32) -> Result<DynamicImage, CoreError> {
    if block == 0 {
        return Err(CoreError::InvalidConfiguration(
            "pixel block size must be at least 1".into(),
        ));
    }
    let (w, h) = img.dimensions();
    let small_w = (w / block).max(1);
    let small_h = (h / block).max(1);

    let small = img.resize_exact(small_w, small_h, FilterType::Nearest).to_rgba8();
    let out = RgbaImage::from_fn(small_w * block, small_h * block, |x, y| {
        *small.get_pixel(x / block, y / block)
    });
    Ok(DynamicImage::ImageRgba8(out))
}

/// Invert every color channel. Alpha is kept.
#[must_use]
pub fn invert(img: &DynamicImage) -> DynamicImage {
    let mut out = img.clone();
    out.invert();
    out
}

/// Flip left to right.
#[must_use]
pub fn mirror(img: &DynamicImage) -> DynamicImage {
    img.fliph()
}

/// Grayscale, then map black→`dark` and white→`light` linearly.
///
/// # Example
/// ```
/// use image::{DynamicImage, GrayImage, Luma};
/// use pxb_source::transform::colorize;
/// let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([255])));
/// let out = colorize(&img, [0, 0, 0], [255, 128, 0]);
/// assert_eq!(out.get_pixel(0, 0).0, [255, 128, 0]);
/// ```
#[must_use]
pub fn colorize(img: &DynamicImage, dark: [u8; 3], light: [u8; 3]) -> RgbImage {
    let gray = img.to_luma8();
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([
            lerp(dark[0], light[0], v),
            lerp(dark[1], light[1], v),
            lerp(dark[2], light[2], v),
        ])
    })
}

#[inline(always)]
fn lerp(from: u8, to: u8, t: u8) -> u8 {
    let from = i32::from(from);
    let to = i32::from(to);
    (from + (to - from) * i32::from(t) / 255) as u8
}

/// Size of `width × height` fitted into a `side × side` box.
///
/// The longer side becomes `side`; the other is scaled by the same ratio
/// and truncated, never below 1.
///
/// # Example
/// ```
/// use pxb_source::transform::fit_dimensions;
/// assert_eq!(fit_dimensions(300, 200, 128), (128, 85));
/// assert_eq!(fit_dimensions(200, 300, 128), (85, 128));
/// assert_eq!(fit_dimensions(64, 64, 128), (128, 128));
/// ```
#[must_use]
pub fn fit_dimensions(width: u32, height: u32, side: u32) -> (u32, u32) {
    if width > height {
        let ratio = f64::from(width) / f64::from(side);
        (side, ((f64::from(height) / ratio) as u32).max(1))
    } else {
        let ratio = f64::from(height) / f64::from(side);
        (((f64::from(width) / ratio) as u32).max(1), side)
    }
}

/// Resize into the sticker box, keeping the aspect ratio.
///
/// # Errors
/// Returns `CoreError::InvalidConfiguration` if `side` is zero.
pub fn fit_within(
    img: &DynamicImage,
    side: u32,
    resizer: &mut Resizer,
) -> Result<DynamicImage, CoreError> {
    if side == 0 {
        return Err(CoreError::InvalidConfiguration(
            "sticker box must be at least 1 pixel".into(),
        ));
    }
    let (w, h) = fit_dimensions(img.width(), img.height(), side);
    log::debug!("Sticker : {}×{} → {w}×{h}", img.width(), img.height());
    let out = resizer.resize_rgba(&img.to_rgba8(), w, h)?;
    Ok(DynamicImage::ImageRgba8(out))
}
