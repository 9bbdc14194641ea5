//! Mathlabel Layout: boxes for every segment, line and block
//!
//! Text segments are measured with the font, math segments with the
//! declared size of their typeset markup. Per line, the tallest segment
//! sets both height and baseline and everyone else hangs off that
//! baseline. Lines stack into the block.
//!
//! The same measurements drive [`LayoutEngine::wrap`], which rewrites the
//! source so it fits a width without ever splitting math that fits.

mod engine;
mod wrap;

pub use engine::LayoutEngine;
pub use wrap::wrap_plain;

/// Knobs for turning markup and fonts into pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Size of one ex in em, for ex-denominated markup
    pub ex_per_em: f32,
    /// Font size px-denominated markup was requested at
    pub reference_font_size: f32,
    /// Padding on each side of a container; `wrap` subtracts it twice
    pub bound_text_padding: f32,
    /// Line height as a multiple of font size, for fonts without one
    pub line_height_factor: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            ex_per_em: 0.5,
            reference_font_size: 16.0,
            bound_text_padding: 5.0,
            line_height_factor: 1.25,
        }
    }
}
