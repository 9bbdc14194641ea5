//! The contracts between the label pipeline and the outside world
//!
//! - [`FontMetrics`] - Measures literal text directly from a font
//! - [`MathEngine`] - Converts math source into vector markup
//! - [`RasterSurface`] - Receives text and images on the raster path

use crate::{
    error::Result,
    types::{BitmapData, BoxMetrics, Notation, VerticalMetrics},
    FontFamily,
};

/// Direct font measurement for literal text
///
/// ```ignore
/// struct Monospace;
///
/// impl FontMetrics for Monospace {
///     fn advance(&self, text: &str, font_size: f32) -> f32 {
///         text.chars().count() as f32 * font_size * 0.6
///     }
///
///     fn vertical(&self, font_size: f32) -> VerticalMetrics {
///         VerticalMetrics {
///             ascent: font_size * 0.8,
///             descent: font_size * 0.2,
///             line_height: font_size * 1.25,
///         }
///     }
/// }
/// ```
pub trait FontMetrics: Send + Sync {
    /// Single-line advance width of `text` in pixels
    fn advance(&self, text: &str, font_size: f32) -> f32;

    /// Ascent, descent and line height in pixels
    ///
    /// A line height of zero means the font has no opinion; layout then
    /// applies its own factor.
    fn vertical(&self, font_size: f32) -> VerticalMetrics;

    /// Box of one line of literal text
    ///
    /// The ascent/descent pair is centered in the line height, the way
    /// browsers distribute half-leading.
    fn measure_text(&self, text: &str, font_size: f32) -> BoxMetrics {
        let mut v = self.vertical(font_size);
        if v.line_height <= 0.0 {
            v.line_height = v.ascent + v.descent;
        }
        let half_leading = (v.line_height - (v.ascent + v.descent)) / 2.0;
        BoxMetrics {
            width: self.advance(text, font_size),
            height: v.line_height,
            baseline: half_leading + v.ascent,
        }
    }
}

/// The external math typesetter
///
/// Implementations may fail on malformed input; callers recover locally.
pub trait MathEngine: Send + Sync {
    /// Identify yourself in logs
    fn name(&self) -> &'static str;

    /// Convert math source into SVG markup
    fn convert(&self, text: &str, notation: Notation, display: bool) -> Result<String>;
}

/// How text should look on a raster surface
#[derive(Debug, Clone, PartialEq)]
pub struct TextPaint {
    pub font_size: f32,
    pub font_family: FontFamily,
    pub color: String,
    pub opacity: f32,
    /// Right-to-left text is anchored at its right edge
    pub rtl: bool,
}

/// A raster drawing target
///
/// Coordinates are in device-independent units relative to the label's
/// top-left corner.
pub trait RasterSurface {
    /// Draw one line of text; `x` is the anchor edge, `baseline_y` the baseline
    fn fill_text(&mut self, text: &str, x: f32, baseline_y: f32, paint: &TextPaint);

    /// Composite a decoded image with its top-left corner at `(x, y)`
    fn draw_image(&mut self, image: &BitmapData, x: f32, y: f32, opacity: f32);
}
