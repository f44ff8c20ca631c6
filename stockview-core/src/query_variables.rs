use crate::models::{facet, FilterSet, FilterValue};
use crate::normalize::{absent_policy_for, normalize_id_strings, normalize_ids};
use serde::{Deserialize, Serialize};

/// Page size that stands in for "everything in one page"; the server caps it
pub const DEFAULT_PAGINATION_SIZE: u32 = 100_000;

/// A `filterInput` field of the boxes query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardedVariable {
    /// Enum names, sent as-is
    States,
    /// Parsed tag ids; entries that do not parse are dropped
    TagIds,
}

impl ForwardedVariable {
    pub fn name(self) -> &'static str {
        match self {
            ForwardedVariable::States => "states",
            ForwardedVariable::TagIds => "tagIds",
        }
    }

    fn write(self, input: &mut FilterInput, facet_id: &str, value: &FilterValue) {
        let policy = absent_policy_for(facet_id);
        match self {
            ForwardedVariable::States => input.states = Some(normalize_id_strings(value, policy)),
            ForwardedVariable::TagIds => input.tag_ids = Some(normalize_ids(value, policy).valid()),
        }
    }
}

/// Facets forwarded to the remote query, with the variable they travel under.
/// Every other facet only filters rows on the client.
pub const FORWARDED_FACETS: &[(&str, ForwardedVariable)] = &[
    (facet::STATE, ForwardedVariable::States),
    (facet::TAGS, ForwardedVariable::TagIds),
];

pub fn forwarded_variable(facet_id: &str) -> Option<ForwardedVariable> {
    FORWARDED_FACETS
        .iter()
        .find(|(id, _)| *id == facet_id)
        .map(|(_, variable)| *variable)
}

pub fn is_forwarded(facet_id: &str) -> bool {
    forwarded_variable(facet_id).is_some()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
}

impl FilterInput {
    pub fn is_empty(&self) -> bool {
        self.states.is_none() && self.tag_ids.is_none()
    }
}

/// Variables of the boxes query. Also the key a fetch is tracked under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryVariables {
    pub base_id: String,
    pub filter_input: FilterInput,
    pub pagination_input: u32,
}

/// Map table filters to query variables with the default page size
pub fn to_query_variables(base_id: &str, filters: &FilterSet) -> QueryVariables {
    to_query_variables_with_page_size(base_id, filters, DEFAULT_PAGINATION_SIZE)
}

pub fn to_query_variables_with_page_size(
    base_id: &str,
    filters: &FilterSet,
    pagination_size: u32,
) -> QueryVariables {
    let mut filter_input = FilterInput::default();

    for spec in filters.iter() {
        if let Some(variable) = forwarded_variable(&spec.id) {
            variable.write(&mut filter_input, &spec.id, &spec.value);
        }
    }

    QueryVariables {
        base_id: base_id.to_string(),
        filter_input,
        pagination_input: pagination_size,
    }
}
