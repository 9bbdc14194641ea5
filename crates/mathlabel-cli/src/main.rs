//! Mathlabel CLI - measure, wrap and render mixed text/math labels

mod cli;
mod commands;

use clap::Parser;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Measure(args) => commands::measure::run(args),
        Commands::Wrap(args) => commands::wrap::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
