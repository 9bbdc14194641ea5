// this_file: crates/mathlabel-render-raster/src/surface.rs

//! A tiny-skia pixmap as a drawing target

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tiny_skia::{FillRule, Paint, Pixmap, PixmapPaint, PixmapRef, Transform};

use mathlabel_core::{
    error::RenderError,
    traits::TextPaint,
    types::{BitmapData, BlockLayout},
    FontMetrics, RasterSurface, Result,
};
use mathlabel_fontdb::Font;

/// Draws text with one font and composites decoded math images
pub struct PixmapSurface {
    pixmap: Pixmap,
    font: Arc<Font>,
    scale: f32,
    /// Layout units between the pixmap edge and the label origin
    margin: f32,
}

impl PixmapSurface {
    /// A transparent surface of `width` x `height` device pixels
    pub fn new(width: u32, height: u32, font: Arc<Font>, scale: f32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions { width, height })?;
        Ok(Self {
            pixmap,
            font,
            scale,
            margin: 0.0,
        })
    }

    /// A surface just large enough for `layout` plus `padding` on each side
    pub fn for_layout(layout: &BlockLayout, font: Arc<Font>, scale: f32, padding: f32) -> Result<Self> {
        let width = ((layout.metrics.width + padding * 2.0) * scale).ceil().max(1.0) as u32;
        let height = ((layout.metrics.height + padding * 2.0) * scale).ceil().max(1.0) as u32;
        let mut surface = Self::new(width, height, font, scale)?;
        surface.margin = padding;
        Ok(surface)
    }

    pub fn fill(&mut self, color: &str) {
        if let Some(color) = parse_color(color, 1.0) {
            self.pixmap.fill(color);
        }
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_bitmap(self) -> BitmapData {
        BitmapData {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
            data: self.pixmap.take(),
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::WriteFailed(e.to_string()).into())
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.pixmap
            .save_png(path)
            .map_err(|e| RenderError::WriteFailed(e.to_string()).into())
    }
}

impl RasterSurface for PixmapSurface {
    fn fill_text(&mut self, text: &str, x: f32, baseline_y: f32, paint: &TextPaint) {
        let Some(path) = self.font.text_path(text, paint.font_size * self.scale) else {
            return;
        };
        let Some(color) = parse_color(&paint.color, paint.opacity) else {
            log::warn!("unparseable text color {:?}", paint.color);
            return;
        };

        let mut x = (x + self.margin) * self.scale;
        if paint.rtl {
            x -= self.font.advance(text, paint.font_size) * self.scale;
        }
        let mut fill = Paint::default();
        fill.set_color(color);
        fill.anti_alias = true;
        let transform = Transform::from_translate(x, (baseline_y + self.margin) * self.scale);
        self.pixmap
            .fill_path(&path, &fill, FillRule::Winding, transform, None);
    }

    fn draw_image(&mut self, image: &BitmapData, x: f32, y: f32, opacity: f32) {
        let Some(source) = PixmapRef::from_bytes(&image.data, image.width, image.height) else {
            log::warn!("image data does not match {}x{}", image.width, image.height);
            return;
        };
        let paint = PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0),
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            ((x + self.margin) * self.scale).round() as i32,
            ((y + self.margin) * self.scale).round() as i32,
            source,
            &paint,
            Transform::identity(),
            None,
        );
    }
}

/// CSS color with `opacity` folded into its alpha
fn parse_color(css: &str, opacity: f32) -> Option<tiny_skia::Color> {
    let color = svgtypes::Color::from_str(css).ok()?;
    let alpha = (color.alpha as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    Some(tiny_skia::Color::from_rgba8(color.red, color.green, color.blue, alpha))
}
