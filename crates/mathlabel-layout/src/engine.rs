use std::sync::Arc;

use mathlabel_core::{
    cache::{CacheMetrics, ContentCache, MetricsKey},
    types::{BlockLayout, BoxMetrics, LineLayout, PlacedSegment, Segment, TextAlign},
    FontMetrics, LabelStyle, StyleKey,
};
use mathlabel_segment::{is_rtl, normalize_newlines, MathSegmenter};
use mathlabel_typeset::{MathMarkup, Typesetter, UnitContext};

use crate::LayoutConfig;

/// A measured segment, before placement
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SegmentBox {
    pub metrics: BoxMetrics,
    pub markup: Option<Arc<str>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BlockKey {
    text: String,
    style: StyleKey,
    engine_ready: bool,
    /// Hundredths of a pixel
    max_width: Option<u32>,
    /// Delimiters are literal text
    plain: bool,
}

/// Measures labels and remembers every result
pub struct LayoutEngine {
    typesetter: Arc<Typesetter>,
    fonts: Arc<dyn FontMetrics>,
    config: LayoutConfig,
    segments: ContentCache<MetricsKey, SegmentBox>,
    blocks: ContentCache<BlockKey, Arc<BlockLayout>>,
}

impl LayoutEngine {
    pub fn new(typesetter: Arc<Typesetter>, fonts: Arc<dyn FontMetrics>) -> Self {
        Self::with_config(typesetter, fonts, LayoutConfig::default())
    }

    pub fn with_config(
        typesetter: Arc<Typesetter>,
        fonts: Arc<dyn FontMetrics>,
        config: LayoutConfig,
    ) -> Self {
        Self {
            typesetter,
            fonts,
            config,
            segments: ContentCache::new(),
            blocks: ContentCache::new(),
        }
    }

    pub fn typesetter(&self) -> &Arc<Typesetter> {
        &self.typesetter
    }

    pub fn fonts(&self) -> &Arc<dyn FontMetrics> {
        &self.fonts
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `text`, wrapping it to `max_width` first when given
    ///
    /// Never fails: math the engine cannot handle yet is measured as its
    /// source text. Results are cached under the full text, the style and
    /// whether the engine was ready, so a layout computed before the engine
    /// loaded is never served after.
    pub fn measure(&self, text: &str, style: &LabelStyle, max_width: Option<f32>) -> Arc<BlockLayout> {
        let ready = self.typesetter.is_loaded();
        self.blocks.get_or_insert_with(self.block_key(text, style, ready, max_width, false), || {
            log::debug!("measuring {:?} (engine ready: {})", text, ready);
            let layout = match max_width {
                Some(width) => {
                    let wrapped = self.wrap_with(text, style, width, ready);
                    self.layout(&wrapped, style, ready)
                },
                None => self.layout(text, style, ready),
            };
            Arc::new(layout)
        })
    }

    /// Lay out `text` with no math at all; delimiters are ordinary characters
    pub fn measure_plain(&self, text: &str, style: &LabelStyle, max_width: Option<f32>) -> Arc<BlockLayout> {
        let ready = self.typesetter.is_loaded();
        self.blocks.get_or_insert_with(self.block_key(text, style, ready, max_width, true), || {
            log::debug!("measuring plain {:?}", text);
            let wrapped = match max_width {
                Some(width) => self.wrap_plain_text(text, style, width),
                None => normalize_newlines(text),
            };
            let lines = wrapped
                .split('\n')
                .map(|line| self.layout_line(line, vec![Segment::text(line)], style, ready))
                .collect();
            Arc::new(self.stack(lines, style, ready))
        })
    }

    fn block_key(
        &self,
        text: &str,
        style: &LabelStyle,
        engine_ready: bool,
        max_width: Option<f32>,
        plain: bool,
    ) -> BlockKey {
        BlockKey {
            text: text.to_string(),
            style: style.key(),
            engine_ready,
            max_width: max_width.map(|w| (w.max(0.0) * 100.0).round() as u32),
            plain,
        }
    }

    fn layout(&self, text: &str, style: &LabelStyle, ready: bool) -> BlockLayout {
        let segmenter = MathSegmenter::new(style.opts);
        let source = segmenter.consume_math_newlines(text);

        let lines = source
            .split('\n')
            .map(|line| self.layout_line(line, segmenter.segment_line(line), style, ready))
            .collect();
        self.stack(lines, style, ready)
    }

    /// Align lines and stack them top to bottom
    fn stack(&self, mut lines: Vec<LineLayout>, style: &LabelStyle, ready: bool) -> BlockLayout {
        let width = lines.iter().map(|l| l.metrics.width).fold(0.0, f32::max);
        let mut y = 0.0;
        for line in &mut lines {
            let x = match style.text_align {
                TextAlign::Left => 0.0,
                TextAlign::Center => (width - line.metrics.width) / 2.0,
                TextAlign::Right => width - line.metrics.width,
            };
            line.x = x;
            line.y = y;
            for seg in &mut line.segments {
                seg.x += x;
                seg.y += y;
            }
            y += line.metrics.height;
        }

        let height = y;
        let baseline = match lines.last() {
            Some(last) => height - last.metrics.height + last.metrics.baseline,
            None => 0.0,
        };

        BlockLayout {
            lines,
            metrics: BoxMetrics::new(width, height, baseline),
            engine_ready: ready,
        }
    }

    /// Measure and place one line at the origin
    fn layout_line(&self, line: &str, segments: Vec<Segment>, style: &LabelStyle, ready: bool) -> LineLayout {
        let boxes: Vec<SegmentBox> = segments
            .iter()
            .map(|s| self.segment_box(s, style, ready))
            .collect();

        let width: f32 = boxes.iter().map(|b| b.metrics.width).sum();
        let mut metrics = BoxMetrics::new(width, 0.0, 0.0);
        // First segment with the greatest height wins the baseline
        for (segment, b) in segments.iter().zip(&boxes) {
            if !segment.is_empty() && b.metrics.height > metrics.height {
                metrics.height = b.metrics.height;
                metrics.baseline = b.metrics.baseline;
            }
        }
        if segments.iter().all(Segment::is_empty) {
            let empty = self.text_box("", style.font_size);
            metrics.height = empty.height;
            metrics.baseline = empty.baseline;
        }

        let rtl = is_rtl(line);
        let mut cursor = if rtl { width } else { 0.0 };
        let placed = segments
            .into_iter()
            .zip(boxes)
            .map(|(segment, b)| {
                let x = if rtl {
                    cursor -= b.metrics.width;
                    cursor
                } else {
                    let x = cursor;
                    cursor += b.metrics.width;
                    x
                };
                let y = if segment.is_empty() {
                    0.0
                } else {
                    metrics.baseline - b.metrics.baseline
                };
                let seg_rtl = !segment.is_math() && is_rtl(&segment.content);
                PlacedSegment {
                    segment,
                    metrics: b.metrics,
                    x,
                    y,
                    rtl: seg_rtl,
                    markup: b.markup,
                }
            })
            .collect();

        LineLayout {
            segments: placed,
            metrics,
            x: 0.0,
            y: 0.0,
            rtl,
        }
    }

    /// Box of one segment, cached under its source and the style
    pub(crate) fn segment_box(&self, segment: &Segment, style: &LabelStyle, ready: bool) -> SegmentBox {
        if segment.is_empty() && !segment.is_math() {
            return SegmentBox {
                metrics: BoxMetrics::ZERO,
                markup: None,
            };
        }
        let key = MetricsKey::new(
            segment.source(style.opts.notation),
            segment.kind,
            style.key(),
            ready,
        );
        self.segments.get_or_insert_with(key, || {
            if segment.is_math() {
                self.math_box(segment, style, ready)
            } else {
                SegmentBox {
                    metrics: self.text_box(&segment.content, style.font_size),
                    markup: None,
                }
            }
        })
    }

    /// Box of literal text; fonts without a line gap get the configured one
    pub(crate) fn text_box(&self, text: &str, font_size: f32) -> BoxMetrics {
        let mut v = self.fonts.vertical(font_size);
        if v.line_height <= 0.0 {
            v.line_height = font_size * self.config.line_height_factor;
        }
        let half_leading = (v.line_height - (v.ascent + v.descent)) / 2.0;
        BoxMetrics::new(self.fonts.advance(text, font_size), v.line_height, half_leading + v.ascent)
    }

    fn math_box(&self, segment: &Segment, style: &LabelStyle, ready: bool) -> SegmentBox {
        let degraded = || SegmentBox {
            metrics: self.text_box(&self.degraded_source(segment, style), style.font_size),
            markup: None,
        };
        if !ready {
            self.typesetter.ensure_loaded();
            return degraded();
        }

        let markup = self.typesetter.convert(
            &segment.content,
            style.opts.notation,
            style.opts.math_only,
        );
        let units = UnitContext {
            font_size: style.font_size,
            ex_per_em: self.config.ex_per_em,
            reference_font_size: self.config.reference_font_size,
        };
        match MathMarkup::parse(&markup).ok().and_then(|m| m.metrics(&units)) {
            Some(metrics) => SegmentBox {
                metrics,
                markup: Some(markup),
            },
            None => {
                log::warn!("unusable markup for {:?}, measuring as text", segment.content);
                degraded()
            },
        }
    }

    /// What a math segment shows while the engine is unavailable
    pub(crate) fn degraded_source(&self, segment: &Segment, style: &LabelStyle) -> String {
        if style.opts.math_only {
            segment.content.clone()
        } else {
            segment.source(style.opts.notation)
        }
    }

    pub fn segment_cache_metrics(&self) -> CacheMetrics {
        self.segments.metrics()
    }

    pub fn block_cache_metrics(&self) -> CacheMetrics {
        self.blocks.metrics()
    }

    pub fn cache_report(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.segments.report("segments"),
            self.blocks.report("blocks"),
            self.typesetter.cache_report()
        )
    }
}
