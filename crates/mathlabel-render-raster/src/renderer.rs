use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use mathlabel_core::{
    cache::{CacheMetrics, ContentCache},
    traits::TextPaint,
    types::{BlockLayout, PlacedSegment},
    LabelStyle, RasterSurface, Result,
};
use mathlabel_typeset::MathMarkup;

use crate::decode::{DecodeQueue, ImageKey, PendingDraw, RefreshCallback};

/// Raster output settings
#[derive(Debug, Clone, PartialEq)]
pub struct RasterConfig {
    /// Device pixels per layout unit
    pub scale: f32,
    /// Worker threads for image decoding
    pub decode_threads: usize,
    pub thread_prefix: String,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            decode_threads: 2,
            thread_prefix: "mathlabel-decode".to_string(),
        }
    }
}

/// What one render pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderPass {
    pub text_runs: usize,
    pub images_drawn: usize,
    /// Images that will be drawn when their decode finishes
    pub images_deferred: usize,
}

/// Engine markup at one device size and color
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SizedKey {
    markup: Arc<str>,
    width: u32,
    height: u32,
    color: String,
}

/// Draws measured labels onto a [`RasterSurface`]
pub struct RasterRenderer {
    config: RasterConfig,
    queue: DecodeQueue,
    /// Rewritten markup; `None` when the engine's markup did not parse
    sized: ContentCache<SizedKey, Option<Arc<str>>>,
}

impl RasterRenderer {
    pub fn new(config: RasterConfig) -> Result<Self> {
        let queue = DecodeQueue::new(config.decode_threads, &config.thread_prefix)?;
        Ok(Self {
            config,
            queue,
            sized: ContentCache::new(),
        })
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    pub fn queue(&self) -> &DecodeQueue {
        &self.queue
    }

    /// Draw every segment of `layout`
    ///
    /// Text is drawn immediately. Math is drawn from the image cache when
    /// it has been decoded at this size before; otherwise a decode is
    /// queued and `refresh` runs once the image has been drawn. Cancel
    /// `cancel` when the label goes away to drop those late draws.
    pub fn render(
        &self,
        layout: &BlockLayout,
        style: &LabelStyle,
        surface: &mut dyn RasterSurface,
        refresh: Option<RefreshCallback>,
        cancel: &CancellationToken,
    ) -> RenderPass {
        let mut pass = RenderPass::default();
        for placed in layout.segments().filter(|s| !s.segment.is_empty()) {
            let markup = placed.markup.as_ref().filter(|_| placed.segment.is_math());
            match markup.and_then(|m| self.image_key(m, placed, style)) {
                Some(key) => {
                    if let Some(image) = self.queue.get(&key) {
                        surface.draw_image(&image, placed.x, placed.y, style.opacity);
                        pass.images_drawn += 1;
                    } else {
                        self.queue.request(PendingDraw {
                            key,
                            x: placed.x,
                            y: placed.y,
                            opacity: style.opacity,
                            cancel: cancel.clone(),
                            refresh: refresh.clone(),
                        });
                        pass.images_deferred += 1;
                    }
                },
                None => {
                    self.draw_text(placed, style, surface);
                    pass.text_runs += 1;
                },
            }
        }
        log::trace!("render pass: {:?}", pass);
        pass
    }

    fn draw_text(&self, placed: &PlacedSegment, style: &LabelStyle, surface: &mut dyn RasterSurface) {
        let segment = &placed.segment;
        let text = if !segment.is_math() || style.opts.math_only {
            segment.content.clone()
        } else {
            segment.source(style.opts.notation)
        };
        let paint = TextPaint {
            font_size: style.font_size,
            font_family: style.font_family,
            color: style.stroke_color.clone(),
            opacity: style.opacity,
            rtl: placed.rtl,
        };
        let x = if placed.rtl {
            placed.x + placed.metrics.width
        } else {
            placed.x
        };
        surface.fill_text(&text, x, placed.baseline_y(), &paint);
    }

    /// Markup sized in device pixels and colored with the stroke
    fn image_key(&self, markup: &Arc<str>, placed: &PlacedSegment, style: &LabelStyle) -> Option<ImageKey> {
        let width = (placed.metrics.width * self.config.scale).ceil().max(1.0) as u32;
        let height = (placed.metrics.height * self.config.scale).ceil().max(1.0) as u32;
        let key = SizedKey {
            markup: markup.clone(),
            width,
            height,
            color: style.stroke_color.clone(),
        };
        let sized = self.sized.get_or_insert_with(key, || {
            let mut svg = match MathMarkup::parse(markup) {
                Ok(svg) => svg,
                Err(e) => {
                    log::warn!("cannot draw math {:?}: {}", placed.segment.content, e);
                    return None;
                },
            };
            svg.set_attr("width", format!("{}px", width));
            svg.set_attr("height", format!("{}px", height));
            svg.set_attr("color", style.stroke_color.as_str());
            Some(Arc::from(svg.to_svg_string()))
        })?;
        Some(ImageKey {
            markup: sized,
            width,
            height,
        })
    }

    /// Hits and misses of the sized-markup cache
    pub fn markup_cache_metrics(&self) -> CacheMetrics {
        self.sized.metrics()
    }

    pub fn cache_report(&self) -> String {
        format!(
            "{}\n{}",
            self.sized.report("sized markup"),
            self.queue.cache_report()
        )
    }

    /// Finish decodes that are done, without waiting
    pub fn pump(&self, surface: &mut dyn RasterSurface) -> usize {
        self.queue.pump(surface)
    }

    /// Wait for all decodes and draw them
    pub fn flush(&self, surface: &mut dyn RasterSurface) -> usize {
        self.queue.flush(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathlabel_core::types::{
        BitmapData, BoxMetrics, LineLayout, Notation, Segment,
    };
    use mathlabel_core::MathOpts;

    #[derive(Default)]
    struct Recorder {
        text: Vec<(String, f32, f32, bool)>,
        images: Vec<(u32, u32, f32, f32)>,
    }

    impl RasterSurface for Recorder {
        fn fill_text(&mut self, text: &str, x: f32, baseline_y: f32, paint: &TextPaint) {
            self.text.push((text.to_string(), x, baseline_y, paint.rtl));
        }

        fn draw_image(&mut self, image: &BitmapData, x: f32, y: f32, _opacity: f32) {
            self.images.push((image.width, image.height, x, y));
        }
    }

    const MARKUP: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="2ex" height="2ex" viewBox="0 0 10 10"><rect width="10" height="10" fill="currentColor"/></svg>"#;

    fn placed(segment: Segment, x: f32, width: f32, markup: Option<&str>) -> PlacedSegment {
        PlacedSegment {
            segment,
            metrics: BoxMetrics::new(width, 20.0, 15.0),
            x,
            y: 2.0,
            rtl: false,
            markup: markup.map(Arc::from),
        }
    }

    fn block(segments: Vec<PlacedSegment>) -> BlockLayout {
        BlockLayout {
            lines: vec![LineLayout {
                segments,
                metrics: BoxMetrics::new(100.0, 22.0, 17.0),
                x: 0.0,
                y: 0.0,
                rtl: false,
            }],
            metrics: BoxMetrics::new(100.0, 22.0, 17.0),
            engine_ready: true,
        }
    }

    #[test]
    fn text_is_drawn_at_the_baseline() {
        let renderer = RasterRenderer::new(RasterConfig::default()).unwrap();
        let layout = block(vec![placed(Segment::text("hi"), 4.0, 20.0, None)]);
        let mut surface = Recorder::default();
        let pass = renderer.render(&layout, &LabelStyle::default(), &mut surface, None, &CancellationToken::new());
        assert_eq!(pass.text_runs, 1);
        assert_eq!(surface.text, vec![("hi".to_string(), 4.0, 17.0, false)]);
    }

    #[test]
    fn math_without_markup_is_drawn_as_source() {
        let renderer = RasterRenderer::new(RasterConfig::default()).unwrap();
        let layout = block(vec![placed(Segment::math("x"), 0.0, 30.0, None)]);
        let mut surface = Recorder::default();
        renderer.render(&layout, &LabelStyle::default(), &mut surface, None, &CancellationToken::new());
        assert_eq!(surface.text[0].0, "\\(x\\)");

        let math_only = LabelStyle {
            opts: MathOpts {
                notation: Notation::Tex,
                math_only: true,
            },
            ..Default::default()
        };
        let mut surface = Recorder::default();
        renderer.render(&layout, &math_only, &mut surface, None, &CancellationToken::new());
        assert_eq!(surface.text[0].0, "x");
    }

    #[test]
    fn rtl_text_is_anchored_at_its_right_edge() {
        let renderer = RasterRenderer::new(RasterConfig::default()).unwrap();
        let mut seg = placed(Segment::text("שלום"), 10.0, 40.0, None);
        seg.rtl = true;
        let mut surface = Recorder::default();
        renderer.render(&block(vec![seg]), &LabelStyle::default(), &mut surface, None, &CancellationToken::new());
        assert_eq!(surface.text[0].1, 50.0);
        assert!(surface.text[0].3);
    }

    #[test]
    fn math_image_is_deferred_then_cached() {
        let renderer = RasterRenderer::new(RasterConfig {
            scale: 2.0,
            ..Default::default()
        })
        .unwrap();
        let layout = block(vec![placed(Segment::math("x"), 8.0, 10.0, Some(MARKUP))]);
        let style = LabelStyle::default();

        let mut surface = Recorder::default();
        let first = renderer.render(&layout, &style, &mut surface, None, &CancellationToken::new());
        assert_eq!(first.images_deferred, 1);
        assert!(surface.images.is_empty());

        assert_eq!(renderer.flush(&mut surface), 1);
        assert_eq!(surface.images, vec![(20, 40, 8.0, 2.0)]);

        let mut again = Recorder::default();
        let second = renderer.render(&layout, &style, &mut again, None, &CancellationToken::new());
        assert_eq!(second.images_drawn, 1);
        assert_eq!(second.images_deferred, 0);
    }

    #[test]
    fn warm_frames_reuse_sized_markup() {
        let renderer = RasterRenderer::new(RasterConfig::default()).unwrap();
        let layout = block(vec![placed(Segment::math("x"), 0.0, 10.0, Some(MARKUP))]);
        let style = LabelStyle::default();

        for _ in 0..3 {
            renderer.render(&layout, &style, &mut Recorder::default(), None, &CancellationToken::new());
        }
        let m = renderer.markup_cache_metrics();
        assert_eq!((m.entries, m.misses, m.hits), (1, 1, 2));

        let red = LabelStyle {
            stroke_color: "#ff0000".into(),
            ..LabelStyle::default()
        };
        renderer.render(&layout, &red, &mut Recorder::default(), None, &CancellationToken::new());
        assert_eq!(renderer.markup_cache_metrics().entries, 2);
    }

    #[test]
    fn unparseable_markup_falls_back_to_text_every_frame() {
        let renderer = RasterRenderer::new(RasterConfig::default()).unwrap();
        let layout = block(vec![placed(Segment::math("x"), 0.0, 10.0, Some("no svg here"))]);
        for _ in 0..2 {
            let mut surface = Recorder::default();
            let pass = renderer.render(&layout, &LabelStyle::default(), &mut surface, None, &CancellationToken::new());
            assert_eq!(pass.text_runs, 1);
            assert_eq!(surface.text[0].0, "\\(x\\)");
        }
        assert_eq!(renderer.markup_cache_metrics().entries, 1);
    }

    #[test]
    fn empty_segments_draw_nothing() {
        let renderer = RasterRenderer::new(RasterConfig::default()).unwrap();
        let layout = block(vec![placed(Segment::text(""), 0.0, 0.0, None)]);
        let mut surface = Recorder::default();
        let pass = renderer.render(&layout, &LabelStyle::default(), &mut surface, None, &CancellationToken::new());
        assert_eq!(pass, RenderPass::default());
    }
}
