use anyhow::{bail, Context, Result};
use stockview_core::{facet_for_param, Dimension, FilterChange, FilterValue, Measure};
use tracing::info;

use crate::state::AppState;

/// Summary of a committed filter change
#[derive(Debug, Default)]
pub struct FilterSummary {
    pub changed: Vec<String>,
    pub refetched: bool,
    pub url_replaced: bool,
}

/// Parse `facet=v1,v2` edits into one change.
/// URL parameter names are accepted in place of facet ids; an empty
/// right-hand side clears the facet.
pub fn parse_filter_change(
    sets: &[String],
    clears: &[String],
    measure: Option<Measure>,
) -> Result<FilterChange> {
    let mut change = FilterChange::new();

    for raw in sets {
        let Some((key, values)) = raw.split_once('=') else {
            bail!("invalid filter '{}': expected FACET=VALUES", raw);
        };
        let facet_id = resolve_facet(key)?;
        let values: Vec<String> = values
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        change = change.set(facet_id, FilterValue::list(values));
    }

    for raw in clears {
        change = change.clear(resolve_facet(raw)?);
    }

    if let Some(measure) = measure {
        change = change.measure(measure);
    }

    Ok(change)
}

fn resolve_facet(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        bail!("filter name cannot be empty");
    }
    Ok(facet_for_param(key).unwrap_or(key).to_string())
}

/// Commit a change, switching the base grouping in the same URL replace when asked
pub fn apply_filter_change(
    app: &mut AppState,
    change: FilterChange,
    base: Option<Dimension>,
) -> Result<FilterSummary> {
    let outcome = match base {
        Some(base) => app
            .sync
            .regroup(base, change, &mut app.transport)
            .context("switching grouping")?,
        None if change.is_empty() => return Ok(FilterSummary::default()),
        None => app
            .sync
            .apply(change, &mut app.transport)
            .context("applying filters")?,
    };

    let refetched = outcome.refetched.is_some();
    if let Some(facts) = outcome.refetched {
        info!(rows = facts.len(), "refetched after filter change");
        app.record_fetch(facts);
    }

    Ok(FilterSummary {
        changed: outcome.changed,
        refetched,
        url_replaced: outcome.url_replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_sets_and_clears() {
        let change = parse_filter_change(
            &strings(&["tag_ids=80, 85", "product="]),
            &strings(&["size_ids"]),
            Some(Measure::ItemsCount),
        )
        .unwrap();

        let expected = FilterChange::new()
            .set("tags", FilterValue::list(["80", "85"]))
            .set("product", FilterValue::list(Vec::<String>::new()))
            .clear("size")
            .measure(Measure::ItemsCount);
        assert_eq!(change, expected);
    }

    #[test]
    fn test_parse_rejects_missing_equals() {
        assert!(parse_filter_change(&strings(&["tags"]), &[], None).is_err());
        assert!(parse_filter_change(&strings(&["=80"]), &[], None).is_err());
    }
}
