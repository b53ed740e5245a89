use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Aggregated results file (.json, .csv or .parquet).
    ///
    /// Pickled summaries are not read; export the aggregated mapping as
    /// nested JSON or as a long `scenario,method,metric,value` table first.
    #[arg(
        short,
        long,
        default_value = "data/results/metric_summary.json"
    )]
    pub input: PathBuf,

    /// Directory the figures are written to
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Image format of the exported figures
    #[arg(long, value_enum, default_value_t = ImageFormat::Svg)]
    pub format: ImageFormat,

    /// Plot configuration (JSON: styles and figures)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Repetitions per configuration (overrides config)
    #[arg(long)]
    pub repeat: Option<NonZeroUsize>,

    /// Open the interactive viewer after exporting
    #[arg(long, default_value_t = false)]
    pub show: bool,
}
