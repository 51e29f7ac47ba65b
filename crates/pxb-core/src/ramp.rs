use std::fmt;

use crate::error::CoreError;

/// 10 glyphs, densest first. Used whenever a chat has not picked its own.
pub const DEFAULT_RAMP: &str = "@%#*+=-:. ";

/// Ordered glyph set, densest/darkest glyph first.
///
/// Replacing a ramp performs no validation: duplicates and odd symbols are
/// kept as typed. Only the renderer refuses an empty ramp.
///
/// # Example
/// ```
/// use pxb_core::ramp::Ramp;
/// let ramp = Ramp::default();
/// assert_eq!(ramp.len(), 10);
/// assert_eq!(ramp.glyphs()[0], '@');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ramp {
    glyphs: Vec<char>,
}

impl Ramp {
    /// Build a ramp from user text, one glyph per Unicode scalar value.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            glyphs: text.chars().collect(),
        }
    }

    /// Glyphs in ramp order.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// Number of glyphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// `true` if the ramp holds no glyph at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::new(DEFAULT_RAMP)
    }
}

impl fmt::Display for Ramp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in &self.glyphs {
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

/// Glyph index for an intensity: `floor(v * len / 256)`.
///
/// Always in `[0, len - 1]` for `len >= 1` since `v <= 255`.
///
/// # Example
/// ```
/// use pxb_core::ramp::glyph_index;
/// assert_eq!(glyph_index(0, 10), 0);
/// assert_eq!(glyph_index(255, 10), 9);
/// assert_eq!(glyph_index(128, 10), 5);
/// ```
#[inline(always)]
#[must_use]
pub fn glyph_index(intensity: u8, len: usize) -> usize {
    usize::from(intensity) * len / 256
}

/// Lookup table mapping luminance [0..255] → glyph.
///
/// Pre-computed once per render for O(1) per-pixel cost.
///
/// # Example
/// ```
/// use pxb_core::ramp::{GlyphLut, Ramp};
/// let lut = GlyphLut::new(&Ramp::default()).unwrap();
/// assert_eq!(lut.map(0), '@');
/// assert_eq!(lut.map(255), ' ');
/// ```
pub struct GlyphLut {
    lut: [char; 256],
}

impl GlyphLut {
    /// Build a LUT from a ramp ordered densest→lightest.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidConfiguration` if the ramp is empty.
    pub fn new(ramp: &Ramp) -> Result<Self, CoreError> {
        if ramp.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "the character set is empty".into(),
            ));
        }
        let glyphs = ramp.glyphs();
        let mut lut = [' '; 256];
        for (v, slot) in (0..=u8::MAX).zip(lut.iter_mut()) {
            *slot = glyphs[glyph_index(v, glyphs.len())];
        }
        Ok(Self { lut })
    }

    /// Map a luminance value [0..255] to a glyph.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, luminance: u8) -> char {
        self.lut[usize::from(luminance)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_index_stays_in_range_for_every_length() {
        for len in 1..=300 {
            for v in 0..=255u8 {
                let idx = glyph_index(v, len);
                assert!(idx < len, "index {idx} hors limites pour len {len}, v {v}");
            }
        }
    }

    #[test]
    fn lut_monotonic_over_default_ramp() {
        let ramp = Ramp::default();
        let lut = GlyphLut::new(&ramp).unwrap();
        let mut prev_idx = 0usize;
        for v in 0..=255u8 {
            let ch = lut.map(v);
            let idx = ramp.glyphs().iter().position(|&c| c == ch).unwrap();
            assert!(idx >= prev_idx, "LUT non monotone à luminance {v}");
            prev_idx = idx;
        }
    }

    #[test]
    fn single_glyph_ramp_maps_everything_to_it() {
        let lut = GlyphLut::new(&Ramp::new("#")).unwrap();
        assert!((0..=255u8).all(|v| lut.map(v) == '#'));
    }

    #[test]
    fn empty_ramp_is_rejected() {
        let err = GlyphLut::new(&Ramp::new("")).err();
        assert!(matches!(err, Some(CoreError::InvalidConfiguration(_))));
    }

    #[test]
    fn ramp_counts_unicode_glyphs_and_keeps_duplicates() {
        let ramp = Ramp::new("█▓▓░ ");
        assert_eq!(ramp.len(), 5);
        assert_eq!(ramp.to_string(), "█▓▓░ ");
    }
}
