use std::sync::Arc;

use mathlabel_core::{
    types::{Notation, VerticalMetrics},
    ElementKind, FontMetrics, LabelStyle, MathEngine, Result,
};
use mathlabel_export_svg::{SvgExporter, SvgNode};
use mathlabel_layout::LayoutEngine;
use mathlabel_typeset::{NoEngine, ReadyLoader, Typesetter};

struct Fixed;

impl FontMetrics for Fixed {
    fn advance(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size / 2.0
    }

    fn vertical(&self, font_size: f32) -> VerticalMetrics {
        VerticalMetrics {
            ascent: font_size * 0.8,
            descent: font_size * 0.2,
            line_height: font_size * 1.25,
        }
    }
}

struct Square;

impl MathEngine for Square {
    fn name(&self) -> &'static str {
        "square"
    }

    fn convert(&self, _text: &str, _notation: Notation, _display: bool) -> Result<String> {
        Ok(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="4ex" height="4ex" "#,
            r#"style="vertical-align: -1ex" viewBox="0 -750 1000 1000" role="img">"#,
            r#"<rect width="1000" height="1000"/></svg>"#
        )
        .into())
    }
}

fn engine(loaded: bool) -> LayoutEngine {
    let typesetter = if loaded {
        let t = Typesetter::new(Arc::new(ReadyLoader(Arc::new(Square))));
        t.ensure_loaded();
        t
    } else {
        Typesetter::new(Arc::new(NoEngine))
    };
    LayoutEngine::new(Arc::new(typesetter), Arc::new(Fixed))
}

fn group(fragment: &SvgNode) -> &SvgNode {
    &fragment.children()[0]
}

#[test]
fn mixed_label_exports_text_and_nested_svg() {
    let layout_engine = engine(true);
    let style = LabelStyle::default();
    let text = "hello \\(x^2\\) world";
    let layout = layout_engine.measure(text, &style, None);

    let exporter = SvgExporter::new();
    let fragment = exporter.render_vector(text, ElementKind::Math, &layout, &style);
    assert_eq!(fragment.get_attr("version"), Some("1.1"));
    assert_eq!(fragment.get_attr("width"), Some("160"));
    assert_eq!(fragment.get_attr("height"), Some("40"));

    let g = group(&fragment);
    assert_eq!(g.get_attr("font-family"), Some("Helvetica, Segoe UI Emoji"));
    assert_eq!(g.get_attr("font-size"), Some("20px"));
    let nodes = g.children();
    assert_eq!(nodes.len(), 3);

    assert_eq!(nodes[0].name(), Some("text"));
    assert_eq!(nodes[0].get_attr("x"), Some("0"));
    assert_eq!(nodes[0].get_attr("y"), Some("30"));

    let math = &nodes[1];
    assert_eq!(math.name(), Some("svg"));
    assert_eq!(math.get_attr("x"), Some("60"));
    assert_eq!(math.get_attr("y"), Some("0"));
    assert_eq!(math.get_attr("width"), Some("40"));
    assert_eq!(math.get_attr("viewBox"), Some("0 -750 1000 1000"));
    assert_eq!(math.get_attr("role"), Some("img"));
    assert_eq!(math.get_attr("style"), None);

    assert_eq!(nodes[2].get_attr("x"), Some("100"));
}

#[test]
fn degraded_math_exports_its_source() {
    let layout_engine = engine(false);
    let style = LabelStyle::default();
    let text = "a \\(x\\)";
    let layout = layout_engine.measure(text, &style, None);

    let exporter = SvgExporter::new();
    let fragment = exporter.render_vector(text, ElementKind::Math, &layout, &style);
    let rendered = fragment.to_string();
    assert!(rendered.contains(r"\(x\)"));
    assert!(!rendered.contains("<rect"));
    assert_eq!(exporter.cache_metrics().entries, 0);
}

#[test]
fn fragments_are_cached_once_ready() {
    let layout_engine = engine(true);
    let style = LabelStyle::default();
    let layout = layout_engine.measure("\\(y\\)", &style, None);

    let exporter = SvgExporter::new();
    let first = exporter.render_vector("\\(y\\)", ElementKind::Math, &layout, &style);
    let second = exporter.render_vector("\\(y\\)", ElementKind::Math, &layout, &style);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(exporter.cache_metrics().hits, 1);
}

#[test]
fn rtl_text_is_end_anchored() {
    let layout_engine = engine(false);
    let style = LabelStyle::default();
    let layout = layout_engine.measure("שלום", &style, None);
    let fragment = SvgExporter::new().render_vector("שלום", ElementKind::Math, &layout, &style);
    let text = &group(&fragment).children()[0];
    assert_eq!(text.get_attr("direction"), Some("rtl"));
    assert_eq!(text.get_attr("text-anchor"), Some("end"));
    assert_eq!(text.get_attr("x"), Some("40"));
}

#[test]
fn documents_are_padded_and_appendable() {
    let layout_engine = engine(true);
    let style = LabelStyle::default();
    let layout = layout_engine.measure("ab", &style, None);
    let exporter = SvgExporter::new().with_padding(5.0);

    let doc = exporter.export_document("ab", ElementKind::Math, &layout, &style).unwrap();
    assert!(doc.starts_with("<?xml"));
    assert!(doc.contains(r#"viewBox="0 0 30 35""#));
    assert!(doc.contains(r#"translate(5 5)"#));

    let mut root = SvgNode::element("svg");
    exporter.append_to(&mut root, "ab", ElementKind::Math, &layout, &style);
    assert_eq!(root.children().len(), 1);
}

#[test]
fn plain_and_math_fragments_are_cached_apart() {
    let layout_engine = engine(true);
    let style = LabelStyle::default();
    let text = "a \\(x\\)";
    let math = layout_engine.measure(text, &style, None);
    let plain = layout_engine.measure_plain(text, &style, None);
    let exporter = SvgExporter::new();

    let math_svg = exporter.render_vector(text, ElementKind::Math, &math, &style).to_string();
    let plain_svg = exporter.render_vector(text, ElementKind::Text, &plain, &style).to_string();
    assert!(math_svg.contains("<rect"));
    assert!(!plain_svg.contains("<rect"));
    assert!(plain_svg.contains(r"a \(x\)"));
    assert_eq!(exporter.cache_metrics().entries, 2);
}
