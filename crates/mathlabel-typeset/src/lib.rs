//! Mathlabel Typeset: talking to the math engine without waiting for it
//!
//! Math segments need an external typesetter that turns source like
//! `x^2` into SVG. This crate wraps that engine:
//!
//! - [`Typesetter`] - load lifecycle, one-shot ready callback, cached
//!   conversion with graceful fallbacks
//! - [`MathMarkup`] - reads the box of typeset markup and rewrites its root
//! - [`CommandEngine`] - a concrete engine that runs a converter program

pub mod adapter;
pub mod command;
pub mod markup;

pub use adapter::{
    EngineLoader, LoadCompletion, NoEngine, ReadyCallback, ReadyLoader, Typesetter,
    FALLBACK_ERROR_MARKUP,
};
pub use command::{CommandEngine, CommandLoader};
pub use markup::{MathMarkup, UnitContext, SVG_NS};
