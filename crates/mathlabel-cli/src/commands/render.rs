//! `mathlabel render`
//!
//! The output extension picks the path: `.svg` goes through the vector
//! exporter, `.png` through the raster renderer, which needs a real font.

use std::fs;

use anyhow::{bail, Context, Result};
use mathlabel::export_svg::SvgExporter;
use mathlabel::prelude::*;
use mathlabel::raster::{PixmapSurface, RasterConfig};

use super::Setup;
use crate::cli::RenderArgs;

pub fn run(args: &RenderArgs) -> Result<()> {
    let raster = RasterConfig {
        scale: args.scale,
        ..RasterConfig::default()
    };
    let mut setup = Setup::new(&args.label, raster)?;
    setup.element.stroke_color = args.color.clone();
    if let Some(width) = args.width {
        setup.element.text = setup.engine.wrap(&setup.element, width, None);
    }

    let extension = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("svg") => render_svg(&setup, args),
        Some("png") => render_png(&setup, args),
        _ => bail!(
            "cannot tell the format of {}; use .png or .svg",
            args.output.display()
        ),
    }
}

fn render_svg(setup: &Setup, args: &RenderArgs) -> Result<()> {
    let layout = setup.engine.layout(&setup.element, None, None);
    let exporter = SvgExporter::new().with_padding(args.margin);
    let document = exporter.export_document(
        &setup.element.text,
        setup.element.kind,
        &layout,
        &setup.element.style(None),
    )?;
    fs::write(&args.output, document)
        .with_context(|| format!("writing {}", args.output.display()))?;
    eprintln!(
        "wrote {} ({}x{})",
        args.output.display(),
        layout.metrics.width,
        layout.metrics.height
    );
    Ok(())
}

fn render_png(setup: &Setup, args: &RenderArgs) -> Result<()> {
    let font = setup
        .font
        .clone()
        .context("PNG output draws glyphs and needs --font-file")?;
    let layout = setup.engine.layout(&setup.element, None, None);
    let mut surface = PixmapSurface::for_layout(&layout, font, args.scale, args.margin)?;
    if let Some(background) = &args.background {
        surface.fill(background);
    }

    let pass = setup
        .engine
        .render(&setup.element, &mut surface, None, &CancellationToken::new());
    let late = setup.engine.flush(&mut surface);
    log::debug!("{:?}, {} images drawn after decoding", pass, late);

    surface
        .save_png(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    eprintln!(
        "wrote {} ({}x{})",
        args.output.display(),
        surface.pixmap().width(),
        surface.pixmap().height()
    );
    Ok(())
}
