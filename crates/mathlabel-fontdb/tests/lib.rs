// this_file: crates/mathlabel-fontdb/tests/lib.rs

use std::path::PathBuf;

use mathlabel_core::FontMetrics;
use mathlabel_fontdb::Font;

/// A font that is commonly installed; tests are skipped without one
fn system_font() -> Option<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

#[test]
fn test_advance_is_additive_and_scales() {
    let Some(path) = system_font() else {
        eprintln!("no system font found, skipping");
        return;
    };
    let font = Font::from_file(&path).expect("load system font");

    let ab = font.advance("ab", 20.0);
    let split = font.advance("a", 20.0) + font.advance("b", 20.0);
    assert!((ab - split).abs() < 1e-3);
    assert!((font.advance("ab", 40.0) - 2.0 * ab).abs() < 1e-3);
    assert_eq!(font.advance("", 20.0), 0.0);
}

#[test]
fn test_vertical_metrics_are_sane() {
    let Some(path) = system_font() else {
        return;
    };
    let font = Font::from_file(&path).expect("load system font");
    let v = font.vertical(20.0);
    assert!(v.ascent > 0.0);
    assert!(v.descent > 0.0);
    // Zero when the font has no line gap, otherwise the full hhea spacing
    assert!(v.line_height == 0.0 || v.line_height > v.ascent + v.descent);

    let text = font.measure_text("Hg", 20.0);
    assert!(text.height >= v.ascent + v.descent - 1e-3);
    assert!(text.baseline > v.ascent - 1e-3);
}

#[test]
fn test_line_height_factor_overrides_font_spacing() {
    let Some(path) = system_font() else {
        return;
    };
    let font = Font::from_file(&path)
        .expect("load system font")
        .with_line_height_factor(1.5);
    assert_eq!(font.vertical(20.0).line_height, 30.0);
    assert_eq!(font.measure_text("Hg", 20.0).height, 30.0);
}

#[test]
fn test_advance_matches_glyph_advances() {
    let Some(path) = system_font() else {
        return;
    };
    let font = Font::from_file(&path).expect("load system font");
    let units: u32 = "Hello"
        .chars()
        .map(|ch| font.advance_units(font.glyph_id(ch)) as u32)
        .sum();
    let expected = units as f32 * 20.0 / font.units_per_em() as f32;
    assert!((font.advance("Hello", 20.0) - expected).abs() < 1e-3);
}

#[test]
fn test_text_path_has_ink_above_baseline() {
    let Some(path) = system_font() else {
        return;
    };
    let font = Font::from_file(&path).expect("load system font");
    let outline = font.text_path("H", 20.0).expect("H has an outline");
    let bounds = outline.bounds();
    assert!(bounds.top() < 0.0);
    assert!(bounds.bottom() <= 0.5);
    assert!(font.text_path(" ", 20.0).is_none());
}
