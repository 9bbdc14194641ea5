//! Mathlabel - labels that mix literal text with typeset math
//!
//! A label is source text such as `area \(\pi r^2\)`. Mathlabel cuts it
//! into text and math, asks an external engine for math markup, measures
//! everything, re-flows it to a width and draws it as pixels or SVG.
//!
//! The math engine loads in the background. Until it is ready every call
//! still succeeds and math simply looks like its source; once it is ready
//! the host hears about it through [`Engine::set_on_loaded`] and measures
//! again.
//!
//! # Example
//!
//! ```ignore
//! use mathlabel::prelude::*;
//!
//! let engine = Engine::builder(fonts)
//!     .with_loader(Arc::new(CommandLoader::new(CommandEngine::new("tex2svg"))))
//!     .build()?;
//!
//! let label = TextElement::math("a", "area \\(\\pi r^2\\)", MathOpts::default());
//! let size = engine.measure(&label, None, None);
//! let wrapped = engine.wrap(&label, 120.0, None);
//! ```
//!
//! # Feature Flags
//!
//! - `fontdb`: font-file metrics and outlines (default)

mod engine;
mod kinds;
mod registry;

pub use engine::{Engine, EngineBuilder};
pub use kinds::{MathText, PlainText};
pub use registry::{Registry, TextLike};

pub use mathlabel_core::{error, traits, types, ElementKind, LabelStyle, MathOpts, TextElement};

#[cfg(feature = "fontdb")]
pub use mathlabel_fontdb as fontdb;

pub use mathlabel_export_svg as export_svg;
pub use mathlabel_layout as layout;
pub use mathlabel_render_raster as raster;
pub use mathlabel_segment as segment;
pub use mathlabel_typeset as typeset;

/// Common imports for typical usage
pub mod prelude {
    pub use mathlabel_core::{
        element::{is_math_element, ElementOverrides, MathOptsPatch, TextElementUpdate},
        error::{LabelError, Result},
        traits::{FontMetrics, MathEngine, RasterSurface},
        types::{BlockLayout, BoxMetrics, Notation, TextAlign},
        ElementKind, FontFamily, LabelStyle, MathOpts, TextElement,
    };
    pub use mathlabel_export_svg::SvgNode;
    pub use mathlabel_render_raster::{CancellationToken, RefreshCallback};
    pub use mathlabel_typeset::{CommandEngine, CommandLoader, EngineLoader, ReadyLoader};

    pub use crate::{Engine, Registry, TextLike};
}
