//! SVG export for mathlabel
//!
//! Walks the same [`BlockLayout`] the raster renderer draws and emits
//! vector nodes at the same coordinates, so exported and on-screen labels
//! match.
//!
//! - Text segments become `<text>` nodes anchored at the baseline
//! - Math segments become nested `<svg>` elements that reuse the engine's
//!   own content and `viewBox`, rescaled to the segment box
//! - Fragments are cached per text, element kind and style once the engine
//!   is ready

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use mathlabel_core::{
    cache::{CacheMetrics, ContentCache},
    error::{RenderError, Result},
    types::{BlockLayout, PlacedSegment},
    ElementKind, LabelStyle, StyleKey,
};
use mathlabel_typeset::{MathMarkup, SVG_NS};

mod node;

pub use node::SvgNode;

/// Attributes of engine markup that the exporter decides itself
const OWNED_ATTRS: [&str; 6] = ["x", "y", "width", "height", "style", "xmlns"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FragmentKey {
    text: String,
    /// Plain labels show delimiters that math labels typeset
    kind: ElementKind,
    style: StyleKey,
}

/// Vector exporter for measured labels
pub struct SvgExporter {
    /// Document padding
    padding: f32,
    fragments: ContentCache<FragmentKey, Arc<SvgNode>>,
}

impl SvgExporter {
    pub fn new() -> Self {
        Self {
            padding: 10.0,
            fragments: ContentCache::new(),
        }
    }

    /// Set the padding around a standalone document
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// The `<svg>` fragment for one label
    ///
    /// `text` is the label source the layout was measured from and `kind`
    /// how it was measured. Fragments built before the math engine was
    /// ready are not cached.
    pub fn render_vector(
        &self,
        text: &str,
        kind: ElementKind,
        layout: &BlockLayout,
        style: &LabelStyle,
    ) -> Arc<SvgNode> {
        if !layout.engine_ready {
            return Arc::new(self.build(layout, style));
        }
        let key = FragmentKey {
            text: text.to_string(),
            kind,
            style: style.key(),
        };
        self.fragments
            .get_or_insert_with(key, || Arc::new(self.build(layout, style)))
    }

    /// Append the label's fragment to `target`
    pub fn append_to(
        &self,
        target: &mut SvgNode,
        text: &str,
        kind: ElementKind,
        layout: &BlockLayout,
        style: &LabelStyle,
    ) {
        target.push(self.render_vector(text, kind, layout, style).as_ref().clone());
    }

    /// A complete, padded SVG document holding one label
    pub fn export_document(
        &self,
        text: &str,
        kind: ElementKind,
        layout: &BlockLayout,
        style: &LabelStyle,
    ) -> Result<String> {
        let width = layout.metrics.width + self.padding * 2.0;
        let height = layout.metrics.height + self.padding * 2.0;
        let fragment = self.render_vector(text, kind, layout, style);

        let mut svg = String::new();
        writeln!(&mut svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)
            .map_err(|e| RenderError::WriteFailed(e.to_string()))?;
        writeln!(
            &mut svg,
            r#"<svg xmlns="{}" viewBox="0 0 {} {}" width="{}" height="{}">"#,
            SVG_NS,
            num(width),
            num(height),
            num(width),
            num(height)
        )
        .map_err(|e| RenderError::WriteFailed(e.to_string()))?;
        writeln!(
            &mut svg,
            r#"<g transform="translate({} {})">{}</g>"#,
            num(self.padding),
            num(self.padding),
            fragment
        )
        .map_err(|e| RenderError::WriteFailed(e.to_string()))?;
        writeln!(&mut svg, "</svg>").map_err(|e| RenderError::WriteFailed(e.to_string()))?;

        Ok(svg)
    }

    fn build(&self, layout: &BlockLayout, style: &LabelStyle) -> SvgNode {
        let mut group = SvgNode::element("g")
            .attr("font-family", style.font_family.css_name())
            .attr("font-size", format!("{}px", num(style.font_size)))
            .attr("color", &style.stroke_color)
            .attr("stroke-opacity", num(style.opacity))
            .attr("fill-opacity", num(style.opacity));

        for placed in layout.segments().filter(|s| !s.segment.is_empty()) {
            let math = placed
                .markup
                .as_deref()
                .filter(|_| placed.segment.is_math())
                .and_then(|markup| math_node(placed, markup));
            group.push(math.unwrap_or_else(|| text_node(placed, style)));
        }

        let m = layout.metrics;
        SvgNode::element("svg")
            .attr("version", "1.1")
            .attr("viewBox", format!("0 0 {} {}", num(m.width), num(m.height)))
            .attr("width", num(m.width))
            .attr("height", num(m.height))
            .child(group)
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.fragments.metrics()
    }

    pub fn cache_report(&self) -> String {
        self.fragments.report("svg fragments")
    }
}

impl Default for SvgExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine markup as a nested `<svg>` filling the segment box
fn math_node(placed: &PlacedSegment, markup: &str) -> Option<SvgNode> {
    let parsed = match MathMarkup::parse(markup) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("exporting math {:?} as text: {}", placed.segment.content, e);
            return None;
        },
    };
    let mut node = SvgNode::element("svg");
    for (key, value) in parsed.attrs() {
        if !OWNED_ATTRS.contains(&key) {
            node.set_attr(key, value);
        }
    }
    Some(
        node.attr("x", num(placed.x))
            .attr("y", num(placed.y))
            .attr("width", num(placed.metrics.width))
            .attr("height", num(placed.metrics.height))
            .child(SvgNode::Raw(parsed.inner().to_string())),
    )
}

fn text_node(placed: &PlacedSegment, style: &LabelStyle) -> SvgNode {
    let segment = &placed.segment;
    let content = if !segment.is_math() || style.opts.math_only {
        segment.content.clone()
    } else {
        segment.source(style.opts.notation)
    };
    let (x, direction, anchor) = if placed.rtl {
        (placed.x + placed.metrics.width, "rtl", "end")
    } else {
        (placed.x, "ltr", "start")
    };
    SvgNode::element("text")
        .attr("x", num(x))
        .attr("y", num(placed.baseline_y()))
        .attr("fill", &style.stroke_color)
        .attr("direction", direction)
        .attr("text-anchor", anchor)
        .attr("style", "white-space: pre;")
        .child(SvgNode::Text(content))
}

/// Compact coordinate formatting, two decimals at most
fn num(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_padding() {
        assert_eq!(SvgExporter::new().padding, 10.0);
        assert_eq!(SvgExporter::new().with_padding(2.5).padding, 2.5);
        assert_eq!(SvgExporter::default().padding, 10.0);
    }

    #[test]
    fn test_numbers_are_compact() {
        assert_eq!(num(60.0), "60");
        assert_eq!(num(2.5), "2.5");
        assert_eq!(num(1.0 / 3.0), "0.33");
        assert_eq!(num(-0.0001), "0");
    }
}
