use crate::models::{AggregatedRow, Dimension, DimensionEntry, DimensionTables, FactRow, Measure};
use std::collections::HashMap;
use tracing::debug;

/// A fact row joined against its category and size tables
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRow<'a> {
    pub fact: &'a FactRow,
    pub category_name: &'a str,
    pub size_name: &'a str,
}

impl<'a> ResolvedRow<'a> {
    /// Group labels this row falls under for a dimension.
    /// Only tags yield more than one label; tags missing from the table yield none.
    pub fn labels(&self, dimension: Dimension, tables: &'a DimensionTables) -> Vec<&'a str> {
        match dimension {
            Dimension::CategoryName => vec![self.category_name],
            Dimension::ProductName => vec![self.fact.product_name.as_str()],
            Dimension::Gender => vec![self.fact.gender.as_str()],
            Dimension::SizeName => vec![self.size_name],
            Dimension::LocationName => vec![self.fact.location_name.as_str()],
            Dimension::BoxState => vec![self.fact.box_state.as_str()],
            Dimension::Tag => self
                .fact
                .tag_ids
                .iter()
                .filter_map(|id| lookup(&tables.tags, *id))
                .collect(),
        }
    }
}

fn lookup(entries: &[DimensionEntry], id: i64) -> Option<&str> {
    entries.iter().find(|entry| entry.id == id).map(|entry| entry.name.as_str())
}

/// Inner-join facts against the category and size tables.
/// Rows whose keys resolve nowhere are dropped.
pub fn resolve_rows<'a>(facts: &'a [FactRow], tables: &'a DimensionTables) -> Vec<ResolvedRow<'a>> {
    let categories: HashMap<i64, &str> = tables
        .categories
        .iter()
        .map(|entry| (entry.id, entry.name.as_str()))
        .collect();
    let sizes: HashMap<i64, &str> = tables
        .sizes
        .iter()
        .map(|entry| (entry.id, entry.name.as_str()))
        .collect();

    let resolved: Vec<ResolvedRow<'a>> = facts
        .iter()
        .filter_map(|fact| {
            Some(ResolvedRow {
                fact,
                category_name: categories.get(&fact.category_id).copied()?,
                size_name: sizes.get(&fact.size_id).copied()?,
            })
        })
        .collect();

    let dropped = facts.len() - resolved.len();
    if dropped > 0 {
        debug!(dropped, "fact rows without a matching category or size");
    }

    resolved
}

/// Sum the measure per label of `dimension`.
/// Groups come out in the order their label is first seen.
pub fn group_and_sum<'a>(
    rows: &[ResolvedRow<'a>],
    dimension: Dimension,
    measure: Measure,
    tables: &'a DimensionTables,
) -> Vec<AggregatedRow> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<AggregatedRow> = Vec::new();

    for row in rows {
        let value = row.fact.measure(measure);
        for label in row.labels(dimension, tables) {
            match positions.get(label) {
                Some(&index) => groups[index].value += value,
                None => {
                    positions.insert(label, groups.len());
                    groups.push(AggregatedRow {
                        id: label.to_string(),
                        value,
                    });
                }
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoxState, ProductGender};
    use pretty_assertions::assert_eq;

    fn entry(id: i64, name: &str) -> DimensionEntry {
        DimensionEntry {
            id,
            name: name.to_string(),
        }
    }

    fn tables() -> DimensionTables {
        DimensionTables {
            categories: vec![entry(1, "Clothing"), entry(2, "Food")],
            sizes: vec![entry(10, "M"), entry(11, "L")],
            tags: vec![entry(80, "Winter"), entry(85, "Donation")],
        }
    }

    fn fact(category_id: i64, size_id: i64, product: &str, boxes: u64, tags: &[i64]) -> FactRow {
        FactRow {
            category_id,
            size_id,
            product_id: 1,
            product_name: product.to_string(),
            gender: ProductGender::Women,
            location_id: 1,
            location_name: "Warehouse".to_string(),
            box_state: BoxState::InStock,
            tag_ids: tags.to_vec(),
            boxes_count: boxes,
            items_count: boxes * 10,
        }
    }

    #[test]
    fn test_unresolved_rows_are_dropped() {
        let tables = tables();
        let facts = vec![
            fact(1, 10, "Jacket", 2, &[]),
            fact(99, 10, "Mystery", 5, &[]),
            fact(2, 77, "Rice", 1, &[]),
        ];

        let resolved = resolve_rows(&facts, &tables);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].category_name, "Clothing");
        assert_eq!(resolved[0].size_name, "M");
    }

    #[test]
    fn test_group_and_sum_keeps_first_seen_order() {
        let tables = tables();
        let facts = vec![
            fact(2, 10, "Rice", 1, &[]),
            fact(1, 10, "Jacket", 2, &[]),
            fact(2, 11, "Beans", 3, &[]),
        ];
        let resolved = resolve_rows(&facts, &tables);

        let rows = group_and_sum(&resolved, Dimension::CategoryName, Measure::BoxesCount, &tables);
        assert_eq!(
            rows,
            vec![
                AggregatedRow { id: "Food".to_string(), value: 4 },
                AggregatedRow { id: "Clothing".to_string(), value: 2 },
            ]
        );

        let items = group_and_sum(&resolved, Dimension::SizeName, Measure::ItemsCount, &tables);
        assert_eq!(
            items,
            vec![
                AggregatedRow { id: "M".to_string(), value: 30 },
                AggregatedRow { id: "L".to_string(), value: 30 },
            ]
        );
    }

    #[test]
    fn test_tag_grouping_counts_each_tag() {
        let tables = tables();
        let facts = vec![
            fact(1, 10, "Jacket", 2, &[80, 85]),
            fact(1, 10, "Scarf", 1, &[80, 404]),
            fact(1, 10, "Hat", 7, &[]),
        ];
        let resolved = resolve_rows(&facts, &tables);

        let rows = group_and_sum(&resolved, Dimension::Tag, Measure::BoxesCount, &tables);
        assert_eq!(
            rows,
            vec![
                AggregatedRow { id: "Winter".to_string(), value: 3 },
                AggregatedRow { id: "Donation".to_string(), value: 2 },
            ]
        );
    }
}
