//! Reading and rewriting the root of typeset SVG markup
//!
//! Engines hand back an `<svg>` element, sometimes wrapped in a container
//! element. Only the root start tag matters for layout: its `width` and
//! `height` give the box, and the `vertical-align` in its style says how
//! far the box hangs below the baseline.

use std::str::FromStr;

use mathlabel_core::{error::TypesetError, types::BoxMetrics, Result};
use svgtypes::{Length, LengthUnit, ViewBox};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Resolves relative lengths in engine markup to pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitContext {
    /// Font size the label is drawn at
    pub font_size: f32,
    /// Size of one ex in em
    pub ex_per_em: f32,
    /// Font size the markup was requested at; px lengths scale from it
    pub reference_font_size: f32,
}

impl UnitContext {
    pub fn to_px(&self, length: Length) -> f32 {
        let n = length.number as f32;
        match length.unit {
            LengthUnit::Ex => n * self.font_size * self.ex_per_em,
            LengthUnit::Em => n * self.font_size,
            LengthUnit::None | LengthUnit::Px => n * self.font_size / self.reference_font_size,
            LengthUnit::Pt => n * 4.0 / 3.0 * self.font_size / self.reference_font_size,
            LengthUnit::In => n * 96.0 * self.font_size / self.reference_font_size,
            LengthUnit::Cm => n * 96.0 / 2.54 * self.font_size / self.reference_font_size,
            LengthUnit::Mm => n * 96.0 / 25.4 * self.font_size / self.reference_font_size,
            LengthUnit::Pc => n * 16.0 * self.font_size / self.reference_font_size,
            LengthUnit::Percent => 0.0,
        }
    }
}

/// The root `<svg>` of a piece of engine output
#[derive(Debug, Clone, PartialEq)]
pub struct MathMarkup {
    attrs: Vec<(String, String)>,
    /// Children of the root, without the closing tag
    inner: String,
}

impl MathMarkup {
    /// Find the root `<svg>` element; anything around it is dropped
    pub fn parse(markup: &str) -> Result<Self> {
        let start = markup.find("<svg").ok_or(TypesetError::NotSvg)?;
        let tag_end = find_tag_end(markup, start).ok_or(TypesetError::NotSvg)?;
        let self_closing = markup[..tag_end].ends_with('/');
        let attr_end = if self_closing { tag_end - 1 } else { tag_end };
        let attrs = parse_attributes(&markup[start + 4..attr_end]);

        let inner = if self_closing {
            String::new()
        } else {
            let close = markup.rfind("</svg>").ok_or(TypesetError::NotSvg)?;
            if close < tag_end {
                return Err(TypesetError::NotSvg.into());
            }
            markup[tag_end + 1..close].to_string()
        };
        Ok(Self { attrs, inner })
    }

    /// Cheap check used before parsing
    pub fn looks_like_svg(markup: &str) -> bool {
        markup.contains("<svg")
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| n != name);
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn inner(&self) -> &str {
        &self.inner
    }

    pub fn view_box(&self) -> Option<ViewBox> {
        self.attr("viewBox").and_then(|v| ViewBox::from_str(v).ok())
    }

    fn length(&self, name: &str) -> Option<Length> {
        self.attr(name).and_then(|v| Length::from_str(v.trim()).ok())
    }

    /// `vertical-align` from the inline style; negative means below baseline
    pub fn vertical_align(&self) -> Option<Length> {
        let style = self.attr("style")?;
        style.split(';').find_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            if name.trim() == "vertical-align" {
                Length::from_str(value.trim()).ok()
            } else {
                None
            }
        })
    }

    /// Box of the markup at the given size
    ///
    /// Returns `None` when the root has no usable width or height.
    pub fn metrics(&self, units: &UnitContext) -> Option<BoxMetrics> {
        let width = units.to_px(self.length("width")?);
        let height = units.to_px(self.length("height")?);
        if !width.is_finite() || !height.is_finite() {
            return None;
        }
        let valign = self.vertical_align().map(|l| units.to_px(l)).unwrap_or(0.0);
        Some(BoxMetrics::new(width, height, height + valign))
    }

    /// Serialize back to a standalone `<svg>` element
    pub fn to_svg_string(&self) -> String {
        let mut out = String::with_capacity(self.inner.len() + 128);
        out.push_str("<svg");
        if self.attr("xmlns").is_none() {
            out.push_str(" xmlns=\"");
            out.push_str(SVG_NS);
            out.push('"');
        }
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        out.push('>');
        out.push_str(&self.inner);
        out.push_str("</svg>");
        out
    }
}

/// Index of the `>` closing the tag that starts at `start`, skipping quotes
fn find_tag_end(markup: &str, start: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in markup[start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {},
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(start + i),
            _ => {},
        }
    }
    None
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = source.trim_start();
    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();
        if name.is_empty() {
            break;
        }
        let Some(after_eq) = rest.strip_prefix('=') else {
            attrs.push((name.to_string(), String::new()));
            continue;
        };
        rest = after_eq.trim_start();
        let (value, remaining) = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let body = &rest[1..];
                match body.find(q) {
                    Some(close) => (&body[..close], &body[close + 1..]),
                    None => (body, ""),
                }
            },
            _ => {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                (&rest[..end], &rest[end..])
            },
        };
        attrs.push((name.to_string(), unescape_attr(value)));
        rest = remaining.trim_start();
    }
    attrs
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

fn unescape_attr(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
