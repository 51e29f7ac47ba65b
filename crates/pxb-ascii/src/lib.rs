/// ASCII conversion engine for pixbot.
///
/// Converts photos to fixed-width blocks of glyphs approximating luminance.
pub mod art;
pub mod render;

pub use art::AsciiArt;
pub use render::{AsciiOptions, render_ascii, render_gray};
