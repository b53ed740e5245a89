mod app;
mod cli;
mod color;
mod config;
mod data;
mod figure;
mod render;
mod state;
mod style;
mod ui;

use anyhow::Result;
use clap::Parser;

use cli::Args;
use config::PlotConfig;
use data::loader::load_file;
use figure::build_all;
use render::export_all;
use state::AppState;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PlotConfig::load(path)?,
        None => PlotConfig::default(),
    };
    if let Some(repeat) = args.repeat {
        config.override_repeat(repeat);
    }

    log::info!("Loading results from {}", args.input.display());
    let results = load_file(&args.input)?;

    let figures = build_all(&results, &config.figures, &config.styles)?;
    export_all(&figures, &args.out_dir, args.format)?;

    if args.show {
        let mut state = AppState::new(config, args.out_dir, args.format);
        state.set_results(args.input, &results)?;
        app::run(state)?;
    }
    Ok(())
}
