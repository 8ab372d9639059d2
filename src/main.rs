use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::de::DeserializeOwned;
use serde_json::Value;

use clustergram::engine::{OrderKind, ViewRequest};
use clustergram::{Axis, Clustergram, Config};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Clustergram network JSON (row_nodes, col_nodes, links, views).
    #[arg(value_name = "FILE")]
    dataset: PathBuf,

    /// Config JSON; flags below override its values.
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PX", default_value_t = 1440.0)]
    width: f64,

    #[arg(long, value_name = "PX", default_value_t = 920.0)]
    height: f64,

    /// Order for both axes: ini, rank, clust or class.
    #[arg(long, value_parser = parse_json_or_word::<OrderKind>)]
    order: Option<OrderKind>,

    #[arg(long, value_parser = parse_json_or_word::<OrderKind>)]
    row_order: Option<OrderKind>,

    #[arg(long, value_parser = parse_json_or_word::<OrderKind>)]
    col_order: Option<OrderKind>,

    /// Initial view: `default` or a JSON object such as `{"N_row_sum": 50}`.
    #[arg(long, value_parser = parse_json_or_word::<ViewRequest>)]
    view: Option<ViewRequest>,

    /// Swap rows and columns before laying out.
    #[arg(long)]
    transpose: bool,

    /// Center this row, zoomed to the column switch level.
    #[arg(long, value_name = "NAME")]
    search: Option<String>,

    /// Emit single-line JSON.
    #[arg(long)]
    compact: bool,

    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn parse_json_or_word<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_str(raw)
        .or_else(|_| serde_json::from_value(Value::String(raw.to_owned())))
        .map_err(|error| error.to_string())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            Config::from_json_str(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Config::default(),
    };

    if args.order.is_some() {
        config.order = args.order;
    }
    if args.row_order.is_some() {
        config.row_order = args.row_order;
    }
    if args.col_order.is_some() {
        config.col_order = args.col_order;
    }
    if let Some(view) = &args.view {
        config.ini_view = Some(view.clone());
    }
    config.transpose |= args.transpose;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let config = load_config(&args)?;
    let raw = fs::read_to_string(&args.dataset)
        .with_context(|| format!("failed to read dataset {}", args.dataset.display()))?;
    let mut clustergram = Clustergram::from_json(&raw, config, args.width, args.height)
        .with_context(|| format!("failed to lay out {}", args.dataset.display()))?;

    if let Some(name) = &args.search {
        clustergram
            .find_row(name)
            .with_context(|| format!("search for {name:?} failed"))?;
        info!(
            "focused row {name:?} at scale {:.2} (row order {})",
            clustergram.zoom_state().scale,
            clustergram.order(Axis::Row).label()
        );
    }

    let plan = clustergram.render_plan();
    let rendered = if args.compact {
        serde_json::to_string(&plan)
    } else {
        serde_json::to_string_pretty(&plan)
    }
    .context("failed to serialize render plan")?;
    println!("{rendered}");
    Ok(())
}
