//! Command-line interface definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mathlabel - mixed text and math labels from the command line
#[derive(Parser, Debug)]
#[command(name = "mathlabel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the size of a label
    #[command(alias = "m")]
    Measure(MeasureArgs),

    /// Re-flow a label to a width and print the new source
    #[command(alias = "w")]
    Wrap(WrapArgs),

    /// Draw a label to a PNG or SVG file
    #[command(alias = "r")]
    Render(RenderArgs),
}

/// Delimiter convention for math inside text
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotationArg {
    /// `\(` and `\)`
    Tex,
    /// Backticks
    Ascii,
}

/// Options shared by every command
#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Label source (reads from stdin if omitted)
    pub text: Option<String>,

    /// Math delimiter convention
    #[arg(short = 'n', long, value_enum, default_value = "tex")]
    pub notation: NotationArg,

    /// Treat the whole input as math
    #[arg(long)]
    pub math_only: bool,

    /// Treat the input as plain text; delimiters are literal
    #[arg(long, conflicts_with = "math_only")]
    pub plain: bool,

    /// Font size in pixels
    #[arg(short = 's', long, default_value = "20")]
    pub font_size: f32,

    /// Font file used to measure and draw text (.ttf, .otf)
    #[arg(short = 'f', long)]
    pub font_file: Option<PathBuf>,

    /// Math converter program; gets the notation and mode as arguments
    /// and math source on stdin, and prints SVG
    #[arg(short = 'e', long)]
    pub engine_cmd: Option<String>,

    /// Extra argument for the converter, before notation and mode
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MeasureArgs {
    #[command(flatten)]
    pub label: LabelArgs,

    /// Wrap to this width before measuring
    #[arg(short = 'w', long)]
    pub width: Option<f32>,

    /// Print JSON instead of plain numbers
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct WrapArgs {
    #[command(flatten)]
    pub label: LabelArgs,

    /// Container width; padding is taken off both sides
    #[arg(short = 'w', long)]
    pub width: f32,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub label: LabelArgs,

    /// Output file; the extension picks PNG or SVG
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Wrap to this container width first
    #[arg(short = 'w', long)]
    pub width: Option<f32>,

    /// Text and math color (CSS)
    #[arg(short = 'c', long, default_value = "#000000")]
    pub color: String,

    /// PNG background (CSS); transparent if omitted
    #[arg(short = 'b', long)]
    pub background: Option<String>,

    /// Device pixels per layout unit, PNG only
    #[arg(long, default_value = "1.0")]
    pub scale: f32,

    /// Margin around the label
    #[arg(short = 'm', long, default_value = "10")]
    pub margin: f32,
}
