use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use stockview_core::{Dimension, Measure, RowOrder};
use tracing_subscriber::EnvFilter;

mod errors;
mod handlers;
mod operations;
mod state;
mod ui;

use errors::map_run_error;
use handlers::{apply_filter_change, parse_filter_change, run_drill_steps};
use state::AppState;
use ui::{print_report, Report};

/// Stock overview - filter, aggregate and drill into a base's boxes
///
/// Examples:
///   # Boxes per category, restricted by the URL
///   stockview stock.json --query "box_state=InStock%2CLost&tag_ids=80"
///
///   # Edit filters (facet id or URL parameter name, comma-separated values)
///   stockview stock.json --set tags=80,85 --clear product
///
///   # Drill into a slice, then into one of its sub-slices
///   stockview stock.json --drill "Clothing>productName" --drill "Jacket>gender"
///
///   # Count items instead of boxes, grouped by size
///   stockview stock.json --measure itemsCount --base sizeName
#[derive(Parser, Debug)]
#[command(name = "stockview")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Filtering Logic:\n  \
    - Values of one facet are combined with OR\n  \
    - Different facets are combined with AND\n  \
    - state and tags are sent with the stock query; other facets filter the fetched rows\n  \
    - An empty value (--set product=) clears the facet\n\n\
Groupings:\n  \
    categoryName, productName, gender, sizeName, locationName, boxState, tag\n\n\
Logging:\n  \
    RUST_LOG overrides the default level (e.g. RUST_LOG=stockview_core=debug)")]
struct Cli {
    /// Path to the stock dataset JSON file
    #[arg(value_name = "DATASET")]
    dataset: PathBuf,

    /// Engine config JSON file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Query string the view is opened with
    #[arg(short, long, value_name = "QUERY", default_value = "")]
    query: String,

    /// Set a filter (format: facet=v1,v2; can be specified multiple times)
    #[arg(short, long = "set", value_name = "FACET=VALUES")]
    sets: Vec<String>,

    /// Clear a filter (can be specified multiple times)
    #[arg(long = "clear", value_name = "FACET")]
    clears: Vec<String>,

    /// Count to aggregate: boxesCount or itemsCount
    #[arg(short, long, value_name = "MEASURE")]
    measure: Option<Measure>,

    /// Top-level grouping; resets the drilldown
    #[arg(short, long, value_name = "GROUPING")]
    base: Option<Dimension>,

    /// Drill into a slice (format: VALUE>GROUPING; applied in order)
    #[arg(short, long = "drill", value_name = "VALUE>GROUPING")]
    drills: Vec<String>,

    /// Levels to step back out after drilling
    #[arg(long = "out", value_name = "N", default_value_t = 0)]
    drill_out: usize,

    /// Row order: value or label
    #[arg(long, value_name = "ORDER", default_value = "value")]
    sort: RowOrder,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Log engine decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        let (title, message, details) = map_run_error(&err);
        eprintln!("{} {}", format!("{}:", title).red().bold(), message);
        if !details.is_empty() {
            eprintln!("\n{}", details);
        }
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "stockview=debug,stockview_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut app = AppState::load(&cli.dataset, cli.config.as_deref(), &cli.query)?;

    let change = parse_filter_change(&cli.sets, &cli.clears, cli.measure).context("parsing filters")?;
    let filters = apply_filter_change(&mut app, change, cli.base)?;
    let drill = run_drill_steps(&mut app, &cli.drills, cli.drill_out).context("drilling down")?;

    let report = Report::build(&app, cli.sort, filters, drill);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_repeated_flags() {
        let cli = Cli::parse_from([
            "stockview",
            "stock.json",
            "--set",
            "tags=80",
            "-s",
            "state=Lost",
            "--drill",
            "Clothing>productName",
            "--measure",
            "itemsCount",
            "--base",
            "sizeName",
            "--sort",
            "label",
        ]);

        assert_eq!(cli.sets, vec!["tags=80".to_string(), "state=Lost".to_string()]);
        assert_eq!(cli.drills.len(), 1);
        assert_eq!(cli.measure, Some(Measure::ItemsCount));
        assert_eq!(cli.base, Some(Dimension::SizeName));
        assert_eq!(cli.sort, RowOrder::Label);
    }

    #[test]
    fn test_cli_rejects_unknown_grouping() {
        assert!(Cli::try_parse_from(["stockview", "stock.json", "--base", "colour"]).is_err());
    }
}
