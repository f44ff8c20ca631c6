use crate::models::{facet, FactRow, FilterSet};
use crate::normalize::{absent_policy_for, normalize_ids};

/// Client-only facets, in the order they are checked
const ROW_FACETS: &[&str] = &[
    facet::PRODUCT_CATEGORY,
    facet::PRODUCT,
    facet::SIZE,
    facet::GENDER,
    facet::LOCATION,
];

/// The fact key a client-only facet restricts
fn row_key(facet_id: &str, row: &FactRow) -> Option<i64> {
    match facet_id {
        facet::PRODUCT_CATEGORY => Some(row.category_id),
        facet::PRODUCT => Some(row.product_id),
        facet::SIZE => Some(row.size_id),
        facet::GENDER => Some(row.gender.id()),
        facet::LOCATION => Some(row.location_id),
        _ => None,
    }
}

/// Apply the client-only filters to already fetched rows
pub fn apply_row_filters(facts: &[FactRow], filters: &FilterSet) -> Vec<FactRow> {
    let active = active_row_filters(filters);
    facts
        .iter()
        .filter(|row| matches_active(row, &active))
        .cloned()
        .collect()
}

/// Check one row against the client-only filters.
/// AND between facets, OR within one facet's ids.
pub fn matches_row_filters(row: &FactRow, filters: &FilterSet) -> bool {
    matches_active(row, &active_row_filters(filters))
}

/// True when some client-only facet actually restricts rows
pub fn has_row_filters(filters: &FilterSet) -> bool {
    !active_row_filters(filters).is_empty()
}

type ActiveFilter = (&'static str, Vec<i64>);

fn active_row_filters(filters: &FilterSet) -> Vec<ActiveFilter> {
    ROW_FACETS
        .iter()
        .filter_map(|&facet_id| {
            let value = filters.get(facet_id)?;
            // a facet without a single valid id restricts nothing
            let ids = normalize_ids(value, absent_policy_for(facet_id)).valid();
            (!ids.is_empty()).then_some((facet_id, ids))
        })
        .collect()
}

fn matches_active(row: &FactRow, active: &[ActiveFilter]) -> bool {
    active
        .iter()
        .all(|(facet_id, ids)| row_key(facet_id, row).is_some_and(|key| ids.contains(&key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoxState, FilterValue, ProductGender};
    use pretty_assertions::assert_eq;

    fn fact(category_id: i64, product_id: i64, gender: ProductGender, location_id: i64) -> FactRow {
        FactRow {
            category_id,
            size_id: 1,
            product_id,
            product_name: format!("product {}", product_id),
            gender,
            location_id,
            location_name: format!("location {}", location_id),
            box_state: BoxState::InStock,
            tag_ids: Vec::new(),
            boxes_count: 1,
            items_count: 1,
        }
    }

    fn facts() -> Vec<FactRow> {
        vec![
            fact(1, 10, ProductGender::Women, 100),
            fact(1, 11, ProductGender::Men, 100),
            fact(2, 20, ProductGender::Women, 200),
        ]
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        assert_eq!(apply_row_filters(&facts(), &FilterSet::new()).len(), 3);
        assert!(!has_row_filters(&FilterSet::new()));
    }

    #[test]
    fn test_or_within_facet() {
        let mut filters = FilterSet::new();
        filters.set(facet::PRODUCT, FilterValue::list(["10", "20"]));

        let ids: Vec<i64> = apply_row_filters(&facts(), &filters)
            .iter()
            .map(|row| row.product_id)
            .collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn test_and_between_facets() {
        let mut filters = FilterSet::new();
        filters.set(facet::PRODUCT_CATEGORY, FilterValue::wrapped("1"));
        filters.set(
            facet::GENDER,
            FilterValue::list([ProductGender::Women.id().to_string()]),
        );

        let rows = apply_row_filters(&facts(), &filters);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, 10);
    }

    #[test]
    fn test_facet_without_valid_ids_is_ignored() {
        let mut filters = FilterSet::new();
        filters.set(facet::LOCATION, FilterValue::list(["", "nowhere"]));

        assert!(!has_row_filters(&filters));
        assert_eq!(apply_row_filters(&facts(), &filters).len(), 3);
    }

    #[test]
    fn test_forwarded_facets_are_not_reapplied() {
        let mut filters = FilterSet::new();
        filters.set(facet::TAGS, FilterValue::list(["80"]));
        filters.set(facet::STATE, FilterValue::list(["Lost"]));

        assert!(matches_row_filters(&facts()[0], &filters));
    }
}
