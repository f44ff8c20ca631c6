use colored::Colorize;
use serde::Serialize;
use stockview_core::{sort_rows, AggregatedRow, Dimension, Measure, QueryVariables, RowOrder};

use crate::handlers::{DrillReport, FilterSummary};
use crate::state::AppState;

const BAR_WIDTH: usize = 30;

/// Everything one run produced, in the shape printed or emitted as JSON
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub base_id: String,
    pub url: String,
    pub url_replaces: usize,
    pub query_variables: QueryVariables,
    pub measure: Measure,
    pub path: Vec<Dimension>,
    pub values: Vec<String>,
    pub rows: Vec<AggregatedRow>,
    pub total: u64,
    pub changed: Vec<String>,
    pub refetched: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Vec<Dimension>>,
}

impl Report {
    pub fn build(app: &AppState, order: RowOrder, filters: FilterSummary, drill: DrillReport) -> Self {
        let mut rows = app.chart_rows();
        sort_rows(&mut rows, order);
        let total = rows.iter().map(|row| row.value).sum();
        let drilldown = app.sync.drilldown();

        Self {
            base_id: app.sync.base_id().to_string(),
            url: app.url(),
            url_replaces: app.sync.port().replace_count(),
            query_variables: app.sync.query_variables(),
            measure: app.sync.measure(),
            path: drilldown.path().to_vec(),
            values: drilldown.values().to_vec(),
            rows,
            total,
            changed: filters.changed,
            refetched: filters.refetched,
            notes: drill.notes,
            prompt: drill.prompt,
        }
    }
}

/// Breadcrumb of the drilldown path, e.g. `categoryName = Clothing › productName`
pub fn format_path(path: &[Dimension], values: &[String]) -> String {
    path.iter()
        .enumerate()
        .map(|(i, dimension)| match values.get(i) {
            Some(value) => format!("{} = {}", dimension, value),
            None => dimension.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" › ")
}

/// Bar proportional to `value / max`; any non-zero value gets at least one cell
pub fn format_bar(value: u64, max: u64, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let cells = ((value as u128 * width as u128) / max as u128).max(1) as usize;
    "█".repeat(cells)
}

pub fn print_report(report: &Report) {
    println!("{} {}", "Base".bold(), report.base_id);
    let url = if report.url.is_empty() { "(no query)" } else { report.url.as_str() };
    println!("{} {}", "URL".bold(), url.cyan());
    println!("{} {}", "Measure".bold(), report.measure);
    println!("{} {}", "Grouping".bold(), format_path(&report.path, &report.values));

    if !report.changed.is_empty() {
        let refetch = if report.refetched { " (refetched)" } else { "" };
        println!("{} {}{}", "Changed".bold(), report.changed.join(", "), refetch.dimmed());
    }
    println!();

    if report.rows.is_empty() {
        println!("{}", "No data matches the current filters.".yellow());
    } else {
        let label_width = report.rows.iter().map(|row| row.id.chars().count()).max().unwrap_or(0);
        let max = report.rows.iter().map(|row| row.value).max().unwrap_or(0);
        for row in &report.rows {
            println!(
                "  {:<width$}  {:>8}  {}",
                row.id,
                row.value,
                format_bar(row.value, max, BAR_WIDTH).green(),
                width = label_width
            );
        }
        println!("  {:<width$}  {:>8}", "total".bold(), report.total, width = label_width);
    }

    for note in &report.notes {
        println!("{} {}", "note:".yellow(), note);
    }

    if let Some(options) = &report.prompt {
        let names: Vec<String> = options.iter().map(ToString::to_string).collect();
        println!();
        println!(
            "{} drill depth limit reached; regroup with --base {}",
            "!".yellow().bold(),
            names.join(" | ")
        );
    }
}
