use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use image::{GrayImage, RgbaImage};
use pxb_core::CoreError;

/// Resizer réutilisable wrappant fast_image_resize.
///
/// Works on `image` buffers directly: 8-bit luma for the ASCII renderer,
/// RGBA for stickers.
///
/// # Example
/// ```
/// use pxb_source::resize::Resizer;
/// use image::GrayImage;
/// let mut r = Resizer::box_filter();
/// let out = r.resize_gray(&GrayImage::new(100, 50), 40, 11).unwrap();
/// assert_eq!(out.dimensions(), (40, 11));
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
}

impl Resizer {
    /// Create a resizer using the given algorithm.
    #[must_use]
    pub fn new(alg: ResizeAlg) -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(alg),
        }
    }

    /// Box averaging. Cheap and good enough for one glyph per pixel.
    #[must_use]
    pub fn box_filter() -> Self {
        Self::new(ResizeAlg::Convolution(FilterType::Box))
    }

    /// Lanczos3 convolution for images that are shown as pictures.
    #[must_use]
    pub fn lanczos() -> Self {
        Self::new(ResizeAlg::Convolution(FilterType::Lanczos3))
    }

    /// Resize a grayscale image to exactly `width × height`.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidConfiguration` for zero target dimensions.
    pub fn resize_gray(
        &mut self,
        src: &GrayImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, CoreError> {
        let (sw, sh) = src.dimensions();
        let data = self.resize_raw(src.as_raw(), (sw, sh), (width, height), PixelType::U8)?;
        GrayImage::from_raw(width, height, data).ok_or_else(|| buffer_mismatch(width, height))
    }

    /// Resize an RGBA image to exactly `width × height`.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidConfiguration` for zero target dimensions.
    pub fn resize_rgba(
        &mut self,
        src: &RgbaImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, CoreError> {
        let (sw, sh) = src.dimensions();
        let data = self.resize_raw(src.as_raw(), (sw, sh), (width, height), PixelType::U8x4)?;
        RgbaImage::from_raw(width, height, data).ok_or_else(|| buffer_mismatch(width, height))
    }

    fn resize_raw(
        &mut self,
        src: &[u8],
        (sw, sh): (u32, u32),
        (dw, dh): (u32, u32),
        pixel_type: PixelType,
    ) -> Result<Vec<u8>, CoreError> {
        if dw == 0 || dh == 0 {
            return Err(CoreError::InvalidConfiguration(format!(
                "cannot resize to {dw}×{dh}"
            )));
        }
        if (sw, sh) == (dw, dh) {
            return Ok(src.to_vec());
        }

        // R1: copie forcée, fast_image_resize veut un buffer possédé pour la source
        let src_image = Image::from_vec_u8(sw, sh, src.to_vec(), pixel_type)
            .map_err(|e| CoreError::InvalidImage(format!("source buffer: {e}")))?;
        let mut dst_image = Image::new(dw, dh, pixel_type);

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .map_err(|e| CoreError::InvalidConfiguration(format!("resize failed: {e}")))?;

        Ok(dst_image.into_vec())
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::lanczos()
    }
}

fn buffer_mismatch(width: u32, height: u32) -> CoreError {
    CoreError::InvalidImage(format!("resized buffer does not match {width}×{height}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn uniform_gray_stays_uniform() {
        let src = GrayImage::from_pixel(64, 64, Luma([77]));
        let out = Resizer::box_filter().resize_gray(&src, 10, 3).unwrap();
        assert!(out.pixels().all(|p| p.0[0] == 77));
    }

    #[test]
    fn same_size_is_a_copy() {
        let src = RgbaImage::from_fn(5, 4, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let out = Resizer::default().resize_rgba(&src, 5, 4).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn zero_target_is_rejected() {
        let src = GrayImage::new(4, 4);
        let err = Resizer::box_filter().resize_gray(&src, 0, 4).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }
}
