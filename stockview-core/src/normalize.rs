use crate::models::{facet, Absence, FilterValue};
use regex::Regex;
use std::sync::LazyLock;

static INTEGER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("integer prefix pattern is valid"));

/// What an absent filter value turns into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbsentPolicy {
    /// One entry holding the literal word `null` / `undefined`
    #[default]
    Literal,
    /// No entries at all
    Empty,
}

/// The tag facet drops absent values, every other facet keeps the literal word
pub fn absent_policy_for(facet_id: &str) -> AbsentPolicy {
    if facet_id == facet::TAGS {
        AbsentPolicy::Empty
    } else {
        AbsentPolicy::Literal
    }
}

/// Parsed ids in input order. `None` marks an entry that did not parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedIds(Vec<Option<i64>>);

impl NormalizedIds {
    pub fn entries(&self) -> &[Option<i64>] {
        &self.0
    }

    /// Only the entries that parsed, in order
    pub fn valid(&self) -> Vec<i64> {
        self.0.iter().flatten().copied().collect()
    }

    /// String forms, with unparsed entries rendered as `NaN`
    pub fn to_strings(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|entry| match entry {
                Some(id) => id.to_string(),
                None => "NaN".to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Flatten a filter value into id strings.
///
/// Option objects contribute their `id`, everything else its string form.
/// Empty strings are dropped; nothing else is validated here.
pub fn normalize_id_strings(value: &FilterValue, policy: AbsentPolicy) -> Vec<String> {
    let elements: Vec<&FilterValue> = match value {
        FilterValue::Absent(_) if policy == AbsentPolicy::Empty => return Vec::new(),
        FilterValue::ListOf(items) => items.iter().collect(),
        other => vec![other],
    };

    elements
        .into_iter()
        .map(element_string)
        .filter(|s| !s.is_empty())
        .collect()
}

fn element_string(element: &FilterValue) -> String {
    match element {
        FilterValue::Scalar(s) => s.clone(),
        FilterValue::Wrapped(Some(id)) => id.clone(),
        // an object without an `id`, or a nested list, reads as undefined
        FilterValue::Wrapped(None) | FilterValue::ListOf(_) => Absence::Undefined.as_str().to_string(),
        FilterValue::Absent(absence) => absence.as_str().to_string(),
    }
}

/// Normalize a filter value into parsed ids; duplicates are kept.
/// Ids are non-negative, so a negative parse counts as unparsed.
pub fn normalize_ids(value: &FilterValue, policy: AbsentPolicy) -> NormalizedIds {
    NormalizedIds(
        normalize_id_strings(value, policy)
            .iter()
            .map(|s| parse_int(s).filter(|id| *id >= 0))
            .collect(),
    )
}

/// Leading-integer parse: optional whitespace and sign, then digits.
/// Trailing garbage is ignored (`"12px"` is 12); no digits means `None`.
pub fn parse_int(s: &str) -> Option<i64> {
    INTEGER_PREFIX
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().trim_start_matches('+').parse().ok())
}
