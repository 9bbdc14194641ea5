//! `mathlabel measure`

use anyhow::Result;
use mathlabel::raster::RasterConfig;

use super::Setup;
use crate::cli::MeasureArgs;

pub fn run(args: &MeasureArgs) -> Result<()> {
    let setup = Setup::new(&args.label, RasterConfig::default())?;
    let layout = setup.engine.layout(&setup.element, None, args.width);
    let m = layout.metrics;

    if args.json {
        let lines: Vec<_> = layout
            .lines
            .iter()
            .map(|line| {
                serde_json::json!({
                    "width": line.metrics.width,
                    "height": line.metrics.height,
                    "baseline": line.metrics.baseline,
                    "segments": line.segments.len(),
                })
            })
            .collect();
        let report = serde_json::json!({
            "width": m.width,
            "height": m.height,
            "baseline": m.baseline,
            "engineReady": layout.engine_ready,
            "lines": lines,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} {} {}", m.width, m.height, m.baseline);
    }
    log::debug!("{}", setup.engine.cache_report());
    Ok(())
}
