// this_file: crates/mathlabel-fontdb/src/lib.rs

//! Fonts for the literal half of a label
//!
//! Text segments are measured and drawn straight from a font file. A
//! [`Font`] keeps the raw bytes and re-parses them on demand, the same way
//! for metrics (read-fonts) and for outlines (skrifa).

use std::fs;
use std::path::Path;

use read_fonts::{types::GlyphId, FontRef as ReadFontRef, TableProvider};
use skrifa::{instance::LocationRef, outline::DrawSettings, MetadataProvider};
use tiny_skia::PathBuilder;

use mathlabel_core::{
    error::{FontLoadError, Result},
    types::VerticalMetrics,
    FontMetrics,
};

/// A font loaded into memory
pub struct Font {
    data: Vec<u8>,
    face_index: u32,
    units_per_em: u16,
    ascender: i16,
    /// Negative, below the baseline
    descender: i16,
    /// From `hhea`; zero in many fonts
    line_gap: i16,
    /// Overrides the font's own line spacing
    line_height_factor: Option<f32>,
}

impl Font {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path.as_ref())
            .map_err(|_| FontLoadError::FileNotFound(path.as_ref().display().to_string()))?;
        Self::from_data(data)
    }

    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_index(data, 0)
    }

    /// Load one face of a collection
    pub fn from_data_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let font_ref =
            ReadFontRef::from_index(&data, face_index).map_err(|_| FontLoadError::InvalidData)?;

        let units_per_em = font_ref
            .head()
            .map(|head| head.units_per_em())
            .unwrap_or(1000);
        let (ascender, descender, line_gap) = font_ref
            .hhea()
            .map(|hhea| {
                (
                    hhea.ascender().to_i16(),
                    hhea.descender().to_i16(),
                    hhea.line_gap().to_i16(),
                )
            })
            .unwrap_or((800, -200, 0));

        log::debug!(
            "loaded font face {} ({} upem, {}/{})",
            face_index,
            units_per_em,
            ascender,
            descender
        );

        Ok(Font {
            data,
            face_index,
            units_per_em,
            ascender,
            descender,
            line_gap,
            line_height_factor: None,
        })
    }

    /// Use `factor` x font size as the line height instead of the font's spacing
    pub fn with_line_height_factor(mut self, factor: f32) -> Self {
        self.line_height_factor = Some(factor);
        self
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn font_ref(&self) -> Option<ReadFontRef<'_>> {
        ReadFontRef::from_index(&self.data, self.face_index).ok()
    }

    fn scale(&self, font_size: f32) -> f32 {
        font_size / self.units_per_em.max(1) as f32
    }

    /// Glyph for a character; `.notdef` when the font lacks it
    pub fn glyph_id(&self, ch: char) -> u32 {
        self.glyphs(&ch.to_string())
            .first()
            .map(|&(gid, _)| gid)
            .unwrap_or(0)
    }

    /// Advance of one glyph in font units
    pub fn advance_units(&self, glyph_id: u32) -> u16 {
        self.font_ref()
            .and_then(|font| font.hmtx().ok()?.advance(GlyphId::new(glyph_id)))
            .unwrap_or(self.units_per_em / 2)
    }

    /// Glyph id and advance in font units for every character of `text`
    ///
    /// Parses `cmap` and `hmtx` once for the whole string.
    fn glyphs(&self, text: &str) -> Vec<(u32, u16)> {
        let fallback = self.units_per_em / 2;
        let Some(font) = self.font_ref() else {
            return text.chars().map(|_| (0, fallback)).collect();
        };
        let cmap = font.cmap().ok();
        let hmtx = font.hmtx().ok();
        text.chars()
            .map(|ch| {
                let gid = cmap
                    .as_ref()
                    .and_then(|cmap| cmap.map_codepoint(ch))
                    .map(|gid| gid.to_u32())
                    .unwrap_or(0);
                let advance = hmtx
                    .as_ref()
                    .and_then(|hmtx| hmtx.advance(GlyphId::new(gid)))
                    .unwrap_or(fallback);
                (gid, advance)
            })
            .collect()
    }

    /// Outline of a single line of text as a y-down path
    ///
    /// The origin is the start of the baseline. Returns `None` for text
    /// with no visible ink, such as spaces.
    pub fn text_path(&self, text: &str, font_size: f32) -> Option<tiny_skia::Path> {
        let font = skrifa::FontRef::from_index(&self.data, self.face_index).ok()?;
        let outlines = font.outline_glyphs();
        let size = skrifa::instance::Size::new(font_size);
        let scale = self.scale(font_size);

        let mut pen = FlippedPathPen {
            builder: PathBuilder::new(),
            x_offset: 0.0,
        };
        for (gid, advance) in self.glyphs(text) {
            if let Some(glyph) = outlines.get(skrifa::GlyphId::new(gid)) {
                let settings = DrawSettings::unhinted(size, LocationRef::default());
                if let Err(e) = glyph.draw(settings, &mut pen) {
                    log::debug!("skipping glyph {}: {:?}", gid, e);
                }
            }
            pen.x_offset += advance as f32 * scale;
        }
        pen.builder.finish()
    }
}

impl FontMetrics for Font {
    fn advance(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = self
            .glyphs(text)
            .iter()
            .map(|&(_, advance)| advance as u32)
            .sum();
        units as f32 * self.scale(font_size)
    }

    fn vertical(&self, font_size: f32) -> VerticalMetrics {
        let scale = self.scale(font_size);
        // Without a line gap the font leaves spacing to layout
        let line_height = match self.line_height_factor {
            Some(factor) => font_size * factor,
            None if self.line_gap > 0 => {
                (self.ascender as f32 - self.descender as f32 + self.line_gap as f32) * scale
            },
            None => 0.0,
        };
        VerticalMetrics {
            ascent: self.ascender as f32 * scale,
            descent: -(self.descender as f32) * scale,
            line_height,
        }
    }
}

/// Turns skrifa's y-up outline commands into a y-down tiny-skia path
struct FlippedPathPen {
    builder: PathBuilder,
    x_offset: f32,
}

impl skrifa::outline::OutlinePen for FlippedPathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x + self.x_offset, -y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x + self.x_offset, -y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.builder
            .quad_to(cx0 + self.x_offset, -cy0, x + self.x_offset, -y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let dx = self.x_offset;
        self.builder.cubic_to(cx0 + dx, -cy0, cx1 + dx, -cy1, x + dx, -y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_data_is_rejected() {
        let result = Font::from_data(vec![0; 100]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = Font::from_file("/nonexistent/font.ttf").err().unwrap();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_pen_flips_and_offsets() {
        use skrifa::outline::OutlinePen;
        let mut pen = FlippedPathPen {
            builder: PathBuilder::new(),
            x_offset: 10.0,
        };
        pen.move_to(0.0, 0.0);
        pen.line_to(5.0, 8.0);
        pen.line_to(5.0, 0.0);
        pen.close();
        let path = pen.builder.finish().unwrap();
        let bounds = path.bounds();
        assert_eq!(bounds.left(), 10.0);
        assert_eq!(bounds.top(), -8.0);
        assert_eq!(bounds.bottom(), 0.0);
    }
}
