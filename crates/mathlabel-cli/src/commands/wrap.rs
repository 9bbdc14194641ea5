//! `mathlabel wrap`

use anyhow::Result;
use mathlabel::raster::RasterConfig;

use super::Setup;
use crate::cli::WrapArgs;

pub fn run(args: &WrapArgs) -> Result<()> {
    let setup = Setup::new(&args.label, RasterConfig::default())?;
    println!("{}", setup.engine.wrap(&setup.element, args.width, None));
    Ok(())
}
