//! Error types for mathlabel
//!
//! Measurement and rendering never fail because of a single bad math
//! segment; those failures are recovered where they happen. What remains
//! here is what a caller can actually act on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LabelError>;

/// Main error type for mathlabel
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Font loading failed: {0}")]
    FontLoad(#[from] FontLoadError),

    #[error("Typesetting failed: {0}")]
    Typeset(#[from] TypesetError),

    #[error("Rendering failed: {0}")]
    Rendering(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("Font file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid font data")]
    InvalidData,
}

/// Math engine errors
#[derive(Debug, Error)]
pub enum TypesetError {
    #[error("Engine failed to load: {0}")]
    LoadFailed(String),

    #[error("Conversion failed for {input:?}: {reason}")]
    ConversionFailed { input: String, reason: String },

    #[error("Markup has no <svg> root")]
    NotSvg,
}

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("SVG parse error: {0}")]
    SvgParse(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}
