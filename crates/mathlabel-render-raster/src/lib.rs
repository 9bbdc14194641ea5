//! Mathlabel Raster: labels as pixels
//!
//! The renderer walks a measured [`BlockLayout`](mathlabel_core::types::BlockLayout)
//! and draws each segment where layout put it. Text goes straight to the
//! surface. Math markup is resized to its box in device pixels, tinted
//! with the stroke color and rasterized with resvg on a background pool.
//!
//! ```ignore
//! let renderer = RasterRenderer::new(RasterConfig::default())?;
//! let mut surface = PixmapSurface::for_layout(&layout, font, 1.0, 0.0)?;
//! renderer.render(&layout, &style, &mut surface, None, &CancellationToken::new());
//! renderer.flush(&mut surface);
//! surface.save_png("label.png")?;
//! ```

pub mod decode;
mod renderer;
mod surface;

pub use decode::{rasterize_svg, DecodeQueue, ImageKey, RefreshCallback};
pub use renderer::{RasterConfig, RasterRenderer, RenderPass};
pub use surface::PixmapSurface;
pub use tokio_util::sync::CancellationToken;
