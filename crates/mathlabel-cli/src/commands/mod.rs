//! Subcommand implementations and the setup they share

pub mod measure;
pub mod render;
pub mod wrap;

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use mathlabel::fontdb::Font;
use mathlabel::prelude::*;
use mathlabel::raster::RasterConfig;
use mathlabel::types::VerticalMetrics;

use crate::cli::{LabelArgs, NotationArg};

/// Fixed-advance metrics for when no font file is given
struct StubFont;

impl FontMetrics for StubFont {
    fn advance(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.6
    }

    fn vertical(&self, font_size: f32) -> VerticalMetrics {
        VerticalMetrics {
            ascent: font_size * 0.8,
            descent: font_size * 0.2,
            line_height: font_size * 1.25,
        }
    }
}

/// Everything a command needs: an engine, the element and maybe a font
pub(crate) struct Setup {
    pub engine: Engine,
    pub element: TextElement,
    pub font: Option<Arc<Font>>,
}

impl Setup {
    pub fn new(args: &LabelArgs, raster: RasterConfig) -> Result<Self> {
        let text = read_text(args.text.as_deref())?;

        let font = match &args.font_file {
            Some(path) => Some(Arc::new(
                Font::from_file(path).with_context(|| format!("loading font {}", path.display()))?,
            )),
            None => None,
        };
        let fonts: Arc<dyn FontMetrics> = match &font {
            Some(font) => font.clone(),
            None => Arc::new(StubFont),
        };

        let mut builder = Engine::builder(fonts).with_raster_config(raster);
        if let Some(program) = &args.engine_cmd {
            let engine = CommandEngine::new(program).with_args(args.engine_args.iter().cloned());
            builder = builder.with_loader(Arc::new(CommandLoader::new(engine)));
        }
        let engine = builder.build().context("starting the label engine")?;

        if args.engine_cmd.is_some() && !args.plain {
            if engine.typesetter().wait_until_settled() {
                log::info!(
                    "math engine ready: {}",
                    engine.typesetter().engine_name().unwrap_or("unknown")
                );
            } else {
                eprintln!("warning: math engine unavailable, math is shown as source");
            }
        }

        Ok(Self {
            engine,
            element: element(args, text),
            font,
        })
    }
}

fn element(args: &LabelArgs, text: String) -> TextElement {
    let element = if args.plain {
        TextElement::new("cli", text)
    } else {
        let notation = match args.notation {
            NotationArg::Tex => Notation::Tex,
            NotationArg::Ascii => Notation::AsciiMath,
        };
        TextElement::math(
            "cli",
            text,
            MathOpts {
                notation,
                math_only: args.math_only,
            },
        )
    };
    element.with_font_size(args.font_size)
}

fn read_text(arg: Option<&str>) -> Result<String> {
    match arg {
        Some(text) => Ok(text.to_string()),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading label text from stdin")?;
            Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(text: &str) -> LabelArgs {
        LabelArgs {
            text: Some(text.to_string()),
            notation: NotationArg::Ascii,
            math_only: false,
            plain: false,
            font_size: 30.0,
            font_file: None,
            engine_cmd: None,
            engine_args: Vec::new(),
        }
    }

    #[test]
    fn test_element_follows_flags() {
        let element = element(&args("`x`"), "`x`".into());
        assert_eq!(element.kind, ElementKind::Math);
        assert_eq!(element.text_opts.notation, Notation::AsciiMath);
        assert_eq!(element.font_size, 30.0);

        let mut plain = args("a");
        plain.plain = true;
        assert_eq!(element_kind(&plain), ElementKind::Text);
    }

    fn element_kind(args: &LabelArgs) -> ElementKind {
        element(args, "a".into()).kind
    }

    #[test]
    fn test_stub_font_metrics() {
        assert_eq!(StubFont.advance("abc", 10.0), 18.0);
        assert_eq!(StubFont.vertical(20.0).line_height, 25.0);
    }
}
