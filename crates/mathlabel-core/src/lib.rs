//! Mathlabel Core: the shared vocabulary of mixed text/math labels
//!
//! A label is a string that interleaves literal text with math fragments.
//! Every crate in the workspace speaks in the types defined here, so a
//! segment cut by the segmenter can be measured by the layout engine and
//! drawn by either renderer without conversion.
//!
//! ## The Pipeline
//!
//! 1. **Segmentation** - Raw text becomes alternating text and math segments
//! 2. **Typesetting** - Math segments become vector markup (external engine)
//! 3. **Layout** - Segments get boxes, boxes become lines, lines become a block
//! 4. **Wrapping** - Source text is re-flowed to fit a width
//! 5. **Rendering** - The block is drawn to pixels or emitted as SVG
//!
//! ## The Traits That Power Everything
//!
//! - [`traits::FontMetrics`] - Direct font measurement for literal text
//! - [`traits::MathEngine`] - The external math-to-markup converter
//! - [`traits::RasterSurface`] - Where raster output lands
//!
//! Results flow through the types in [`types`]; everything expensive is
//! remembered in a [`cache::ContentCache`].

use serde::{Deserialize, Serialize};

pub mod cache;
pub mod element;
pub mod error;
pub mod traits;

pub use element::{ElementKind, MathOpts, MathOptsPatch, TextElement};
pub use error::{LabelError, Result};
pub use traits::{FontMetrics, MathEngine, RasterSurface};

/// The data structures that flow between pipeline stages
pub mod types {
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    /// Which delimiter convention marks math inside literal text
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum Notation {
        /// LaTeX-like, delimited by `\(` and `\)`
        Tex,
        /// Compact notation, delimited by a backtick on both sides
        AsciiMath,
    }

    impl Notation {
        pub const fn start_delimiter(self) -> &'static str {
            match self {
                Notation::Tex => "\\(",
                Notation::AsciiMath => "`",
            }
        }

        pub const fn end_delimiter(self) -> &'static str {
            match self {
                Notation::Tex => "\\)",
                Notation::AsciiMath => "`",
            }
        }

        /// Whether this is the LaTeX-like notation (the persisted `useTex` flag)
        pub const fn uses_tex(self) -> bool {
            matches!(self, Notation::Tex)
        }

        pub const fn from_use_tex(use_tex: bool) -> Self {
            if use_tex {
                Notation::Tex
            } else {
                Notation::AsciiMath
            }
        }
    }

    /// Literal text or math source
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum SegmentKind {
        Text,
        Math,
    }

    /// A maximal run of text or math within one source line
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct Segment {
        pub kind: SegmentKind,
        pub content: String,
        /// False only for a math segment whose end delimiter never came
        pub closed: bool,
    }

    impl Segment {
        pub fn text(content: impl Into<String>) -> Self {
            Self {
                kind: SegmentKind::Text,
                content: content.into(),
                closed: true,
            }
        }

        pub fn math(content: impl Into<String>) -> Self {
            Self {
                kind: SegmentKind::Math,
                content: content.into(),
                closed: true,
            }
        }

        pub fn unterminated_math(content: impl Into<String>) -> Self {
            Self {
                closed: false,
                ..Self::math(content)
            }
        }

        pub fn is_math(&self) -> bool {
            self.kind == SegmentKind::Math
        }

        pub fn is_empty(&self) -> bool {
            self.content.is_empty()
        }

        /// The segment as the author typed it, delimiters included
        pub fn source(&self, notation: Notation) -> String {
            match self.kind {
                SegmentKind::Text => self.content.clone(),
                SegmentKind::Math => {
                    let end = if self.closed {
                        notation.end_delimiter()
                    } else {
                        ""
                    };
                    format!("{}{}{}", notation.start_delimiter(), self.content, end)
                },
            }
        }
    }

    /// Width, height and baseline of a segment, line or block
    ///
    /// `baseline` is measured from the top edge down to the text baseline.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct BoxMetrics {
        pub width: f32,
        pub height: f32,
        pub baseline: f32,
    }

    impl BoxMetrics {
        pub const ZERO: BoxMetrics = BoxMetrics {
            width: 0.0,
            height: 0.0,
            baseline: 0.0,
        };

        pub const fn new(width: f32, height: f32, baseline: f32) -> Self {
            Self {
                width,
                height,
                baseline,
            }
        }

        /// Distance from the baseline down to the bottom edge
        pub fn descent(&self) -> f32 {
            self.height - self.baseline
        }
    }

    /// Vertical font metrics at a given size, in pixels
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct VerticalMetrics {
        pub ascent: f32,
        pub descent: f32,
        pub line_height: f32,
    }

    /// Horizontal placement of lines inside the block
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TextAlign {
        #[default]
        Left,
        Center,
        Right,
    }

    /// A segment with its box and its position inside the block
    #[derive(Debug, Clone, PartialEq)]
    pub struct PlacedSegment {
        pub segment: Segment,
        pub metrics: BoxMetrics,
        /// Left edge, relative to the block
        pub x: f32,
        /// Top edge, relative to the block
        pub y: f32,
        /// Right-to-left content; only meaningful for text segments
        pub rtl: bool,
        /// Typeset markup for math segments once the engine is ready
        pub markup: Option<Arc<str>>,
    }

    impl PlacedSegment {
        /// Baseline position relative to the block
        pub fn baseline_y(&self) -> f32 {
            self.y + self.metrics.baseline
        }
    }

    /// One measured line
    #[derive(Debug, Clone, PartialEq)]
    pub struct LineLayout {
        pub segments: Vec<PlacedSegment>,
        pub metrics: BoxMetrics,
        /// Left edge after alignment, relative to the block
        pub x: f32,
        /// Top edge, relative to the block
        pub y: f32,
        pub rtl: bool,
    }

    /// A fully measured label
    #[derive(Debug, Clone, PartialEq)]
    pub struct BlockLayout {
        pub lines: Vec<LineLayout>,
        pub metrics: BoxMetrics,
        /// Whether the math engine was ready when this layout was computed
        pub engine_ready: bool,
    }

    impl BlockLayout {
        pub fn segments(&self) -> impl Iterator<Item = &PlacedSegment> {
            self.lines.iter().flat_map(|line| line.segments.iter())
        }
    }

    /// Raw pixels, premultiplied RGBA8, row-major
    #[derive(Debug, Clone, PartialEq)]
    pub struct BitmapData {
        pub width: u32,
        pub height: u32,
        pub data: Vec<u8>,
    }
}

/// Numeric font family identifier as persisted with the element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontFamily(pub u8);

impl FontFamily {
    pub const HAND_DRAWN: FontFamily = FontFamily(1);
    pub const NORMAL: FontFamily = FontFamily(2);
    pub const CODE: FontFamily = FontFamily(3);
    /// Math labels are pinned to this family
    pub const MATH: FontFamily = FontFamily::NORMAL;

    /// CSS font-family list used in vector output
    pub fn css_name(self) -> &'static str {
        match self {
            FontFamily::HAND_DRAWN => "Virgil, Segoe UI Emoji",
            FontFamily::CODE => "Cascadia, Segoe UI Emoji",
            _ => "Helvetica, Segoe UI Emoji",
        }
    }
}

impl Default for FontFamily {
    fn default() -> Self {
        FontFamily::HAND_DRAWN
    }
}

/// Everything visual that decides how a label looks
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_size: f32,
    pub font_family: FontFamily,
    pub stroke_color: String,
    pub text_align: types::TextAlign,
    /// 0.0 (transparent) to 1.0 (opaque)
    pub opacity: f32,
    pub opts: MathOpts,
}

impl LabelStyle {
    /// The hashable subset that decides metrics and rendering
    pub fn key(&self) -> StyleKey {
        StyleKey {
            font_size: (self.font_size * 100.0).round() as u32,
            font_family: self.font_family,
            stroke_color: self.stroke_color.clone(),
            text_align: self.text_align,
            opacity: (self.opacity * 100.0).round() as u32,
            notation: self.opts.notation,
            math_only: self.opts.math_only,
        }
    }
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size: 20.0,
            font_family: FontFamily::MATH,
            stroke_color: "#000000".to_string(),
            text_align: types::TextAlign::Left,
            opacity: 1.0,
            opts: MathOpts::default(),
        }
    }
}

/// Cache identity for style
///
/// Floats are stored as hundredths so the key hashes stably.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleKey {
    pub font_size: u32,
    pub font_family: FontFamily,
    pub stroke_color: String,
    pub text_align: types::TextAlign,
    pub opacity: u32,
    pub notation: types::Notation,
    pub math_only: bool,
}
