use crate::config::DEFAULT_MAX_DRILL_DEPTH;
use crate::grouping::{group_and_sum, resolve_rows};
use crate::models::{AggregatedRow, Dimension, DimensionTables, FactRow, Measure};
use tracing::debug;

/// Result of asking to drill one level deeper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillOutcome {
    Drilled,
    /// No slice was selected first
    NoSelection,
    /// The path is as deep as allowed; the host shows the grouping prompt instead
    AtCeiling { options: Vec<Dimension> },
    /// The dimension is already a level of the path
    AlreadyGrouped,
}

/// Grouping path of a drilldown chart.
///
/// `values[i]` is the label selected at level `path[i]`; the last level is
/// what the chart shows, so `values` is always one shorter than `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrilldownState {
    path: Vec<Dimension>,
    values: Vec<String>,
    pending: Option<String>,
    max_depth: usize,
}

impl DrilldownState {
    pub fn new(base: Dimension) -> Self {
        Self::with_max_depth(base, DEFAULT_MAX_DRILL_DEPTH)
    }

    pub fn with_max_depth(base: Dimension, max_depth: usize) -> Self {
        Self {
            path: vec![base],
            values: Vec::new(),
            pending: None,
            max_depth: max_depth.max(1),
        }
    }

    pub fn path(&self) -> &[Dimension] {
        &self.path
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn pending_selection(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Dimension the chart currently displays
    pub fn current(&self) -> Dimension {
        self.path[self.path.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Start over from a different top-level grouping
    pub fn reset(&mut self, base: Dimension) {
        debug!(base = %base, "drilldown reset");
        self.path = vec![base];
        self.values.clear();
        self.pending = None;
    }

    /// Dimensions not yet in the path; empty once the ceiling is reached
    pub fn next_options(&self) -> Vec<Dimension> {
        if self.at_ceiling() {
            return Vec::new();
        }
        self.unused()
    }

    /// Remember the clicked slice and return the groupings it can be opened by
    pub fn select(&mut self, label: impl Into<String>) -> Vec<Dimension> {
        self.pending = Some(label.into());
        self.next_options()
    }

    pub fn clear_selection(&mut self) {
        self.pending = None;
    }

    pub fn drill_in(&mut self, next: Dimension) -> DrillOutcome {
        if self.at_ceiling() {
            return DrillOutcome::AtCeiling {
                options: self.unused(),
            };
        }
        if self.path.contains(&next) {
            return DrillOutcome::AlreadyGrouped;
        }
        let Some(selection) = self.pending.take() else {
            return DrillOutcome::NoSelection;
        };

        debug!(next = %next, selection = %selection, "drill in");
        self.path.push(next);
        self.values.push(selection);
        DrillOutcome::Drilled
    }

    /// Step back one level; the base level stays. Returns whether anything changed.
    pub fn drill_out(&mut self) -> bool {
        if self.path.len() <= 1 {
            return false;
        }
        self.path.pop();
        self.values.pop();
        self.pending = None;
        debug!(depth = self.path.len(), "drill out");
        true
    }

    /// Aggregate `facts` for the current level.
    ///
    /// Output depends only on the arguments and the path/values; the engine
    /// keeps nothing between calls. Rows are not sorted.
    pub fn recompute(
        &self,
        facts: &[FactRow],
        tables: &DimensionTables,
        measure: Measure,
    ) -> Vec<AggregatedRow> {
        let resolved = resolve_rows(facts, tables);
        let selected: Vec<_> = resolved
            .into_iter()
            .filter(|row| {
                self.path
                    .iter()
                    .zip(&self.values)
                    .all(|(dimension, value)| row.labels(*dimension, tables).contains(&value.as_str()))
            })
            .collect();

        group_and_sum(&selected, self.current(), measure, tables)
    }

    fn at_ceiling(&self) -> bool {
        self.path.len() >= self.max_depth
    }

    fn unused(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|dimension| !self.path.contains(dimension))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoxState, DimensionEntry, ProductGender};
    use pretty_assertions::assert_eq;

    fn tables() -> DimensionTables {
        let entry = |id: i64, name: &str| DimensionEntry {
            id,
            name: name.to_string(),
        };
        DimensionTables {
            categories: vec![entry(1, "Clothing"), entry(2, "Food")],
            sizes: vec![entry(10, "S"), entry(11, "M")],
            tags: vec![entry(80, "Winter")],
        }
    }

    fn fact(category_id: i64, product: &str, gender: ProductGender, size_id: i64, boxes: u64) -> FactRow {
        FactRow {
            category_id,
            size_id,
            product_id: 1,
            product_name: product.to_string(),
            gender,
            location_id: 1,
            location_name: "Warehouse".to_string(),
            box_state: BoxState::InStock,
            tag_ids: vec![80],
            boxes_count: boxes,
            items_count: boxes * 12,
        }
    }

    fn facts() -> Vec<FactRow> {
        vec![
            fact(1, "Jacket", ProductGender::Women, 10, 3),
            fact(1, "Jacket", ProductGender::Men, 11, 2),
            fact(1, "Socks", ProductGender::Women, 10, 4),
            fact(2, "Rice", ProductGender::None, 10, 6),
            // unknown category
            fact(9, "Jacket", ProductGender::Women, 10, 100),
        ]
    }

    fn row(id: &str, value: u64) -> AggregatedRow {
        AggregatedRow {
            id: id.to_string(),
            value,
        }
    }

    #[test]
    fn test_drill_in_then_out_restores_state() {
        let mut state = DrilldownState::new(Dimension::CategoryName);
        let before = state.clone();

        state.select("Clothing");
        assert_eq!(state.drill_in(Dimension::ProductName), DrillOutcome::Drilled);
        assert_eq!(state.path(), &[Dimension::CategoryName, Dimension::ProductName]);
        assert_eq!(state.values(), &["Clothing".to_string()]);
        assert_eq!(state.pending_selection(), None);

        assert!(state.drill_out());
        assert_eq!(state, before);
    }

    #[test]
    fn test_drill_in_requires_a_selection() {
        let mut state = DrilldownState::new(Dimension::CategoryName);
        assert_eq!(state.drill_in(Dimension::ProductName), DrillOutcome::NoSelection);
        assert_eq!(state.depth(), 1);
    }

    #[test]
    fn test_drill_in_rejects_duplicate_levels() {
        let mut state = DrilldownState::new(Dimension::CategoryName);
        state.select("Clothing");
        assert_eq!(state.drill_in(Dimension::CategoryName), DrillOutcome::AlreadyGrouped);
        // the selection survives for a second attempt
        assert_eq!(state.pending_selection(), Some("Clothing"));
    }

    #[test]
    fn test_ceiling_blocks_further_drilling() {
        let mut state = DrilldownState::with_max_depth(Dimension::CategoryName, 2);
        state.select("Clothing");
        assert_eq!(state.drill_in(Dimension::ProductName), DrillOutcome::Drilled);

        assert!(state.select("Jacket").is_empty());
        let outcome = state.drill_in(Dimension::Gender);
        assert_eq!(
            outcome,
            DrillOutcome::AtCeiling {
                options: vec![
                    Dimension::Gender,
                    Dimension::SizeName,
                    Dimension::LocationName,
                    Dimension::BoxState,
                    Dimension::Tag,
                ]
            }
        );
        assert_eq!(state.depth(), 2);
    }

    #[test]
    fn test_base_level_cannot_be_removed() {
        let mut state = DrilldownState::new(Dimension::ProductName);
        assert!(!state.drill_out());
        assert_eq!(state.path(), &[Dimension::ProductName]);
    }

    #[test]
    fn test_select_offers_unused_dimensions() {
        let mut state = DrilldownState::new(Dimension::CategoryName);
        let options = state.select("Food");
        assert_eq!(options.len(), Dimension::ALL.len() - 1);
        assert!(!options.contains(&Dimension::CategoryName));
    }

    #[test]
    fn test_reset_clears_path_and_values() {
        let mut state = DrilldownState::new(Dimension::CategoryName);
        state.select("Clothing");
        state.drill_in(Dimension::ProductName);
        state.reset(Dimension::Gender);

        assert_eq!(state.path(), &[Dimension::Gender]);
        assert!(state.values().is_empty());
    }

    #[test]
    fn test_recompute_follows_the_path() {
        let facts = facts();
        let tables = tables();
        let mut state = DrilldownState::new(Dimension::CategoryName);

        assert_eq!(
            state.recompute(&facts, &tables, Measure::BoxesCount),
            vec![row("Clothing", 9), row("Food", 6)]
        );

        state.select("Clothing");
        state.drill_in(Dimension::ProductName);
        assert_eq!(
            state.recompute(&facts, &tables, Measure::BoxesCount),
            vec![row("Jacket", 5), row("Socks", 4)]
        );

        state.select("Jacket");
        state.drill_in(Dimension::Gender);
        assert_eq!(
            state.recompute(&facts, &tables, Measure::ItemsCount),
            vec![row("Women", 36), row("Men", 24)]
        );
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let facts = facts();
        let tables = tables();
        let mut state = DrilldownState::new(Dimension::SizeName);
        state.select("S");
        state.drill_in(Dimension::CategoryName);

        let first = state.recompute(&facts, &tables, Measure::BoxesCount);
        let second = state.recompute(&facts, &tables, Measure::BoxesCount);
        assert_eq!(first, second);
    }

    #[test]
    fn test_recompute_without_matches_is_empty() {
        let tables = tables();
        let mut state = DrilldownState::new(Dimension::CategoryName);
        state.select("Toys");
        state.drill_in(Dimension::ProductName);

        assert!(state.recompute(&facts(), &tables, Measure::BoxesCount).is_empty());
        assert!(state.recompute(&[], &tables, Measure::BoxesCount).is_empty());
    }
}
