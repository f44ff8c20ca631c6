use anyhow::{anyhow, Result};
use stockview_core::{Dimension, DrillOutcome};
use tracing::{info, warn};

use crate::state::AppState;

/// One `VALUE>GROUPING` step: select the slice labelled VALUE, then regroup it by GROUPING
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillStep {
    pub selection: String,
    pub next: Dimension,
}

/// What happened while walking the requested drill steps
#[derive(Debug, Default)]
pub struct DrillReport {
    pub notes: Vec<String>,
    /// Groupings on offer when the path hit its ceiling
    pub prompt: Option<Vec<Dimension>>,
}

pub fn parse_drill_step(raw: &str) -> Result<DrillStep> {
    let (selection, next) = raw
        .rsplit_once('>')
        .ok_or_else(|| anyhow!("invalid drill step '{}': expected VALUE>GROUPING", raw))?;
    let selection = selection.trim();
    if selection.is_empty() {
        return Err(anyhow!("invalid drill step '{}': missing slice label", raw));
    }
    let next = next.trim().parse::<Dimension>().map_err(|e| anyhow!(e))?;

    Ok(DrillStep {
        selection: selection.to_string(),
        next,
    })
}

/// Walk drill steps in order, then step back out `drill_out` levels.
/// Stops at the first step that hits the depth ceiling.
pub fn run_drill_steps(app: &mut AppState, steps: &[String], drill_out: usize) -> Result<DrillReport> {
    let mut report = DrillReport::default();

    for raw in steps {
        let step = parse_drill_step(raw)?;

        if !app.chart_rows().iter().any(|row| row.id == step.selection) {
            report
                .notes
                .push(format!("no slice '{}' at {}", step.selection, app.sync.drilldown().current()));
        }

        let drilldown = app.sync.drilldown_mut();
        drilldown.select(step.selection.clone());
        match drilldown.drill_in(step.next) {
            DrillOutcome::Drilled => {
                info!(selection = %step.selection, next = %step.next, "drilled in");
            }
            DrillOutcome::AlreadyGrouped => {
                drilldown.clear_selection();
                report
                    .notes
                    .push(format!("'{}' is already part of the path", step.next));
            }
            DrillOutcome::AtCeiling { options } => {
                warn!(depth = drilldown.depth(), "drilldown ceiling reached");
                drilldown.clear_selection();
                report.prompt = Some(options);
                break;
            }
            DrillOutcome::NoSelection => {
                report.notes.push(format!("nothing selected before {}", step.next));
            }
        }
    }

    for _ in 0..drill_out {
        if !app.sync.drilldown_mut().drill_out() {
            report.notes.push("already at the top level".to_string());
            break;
        }
    }

    Ok(report)
}
