use crate::models::AggregatedRow;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static LEADING_ARTICLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(the|a|an|der|die|das|le|la|les|el|los|las|il|lo|gli|un|une|een)\s+")
        .expect("leading article pattern is valid")
});

/// Presentation order of chart rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowOrder {
    /// Largest slice first, ties by label
    #[default]
    ValueDescending,
    Label,
}

impl std::str::FromStr for RowOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(RowOrder::ValueDescending),
            "label" => Ok(RowOrder::Label),
            other => Err(format!("unknown sort order '{}' (expected 'value' or 'label')", other)),
        }
    }
}

/// Order aggregated rows for display
pub fn sort_rows(rows: &mut [AggregatedRow], order: RowOrder) {
    rows.sort_by(|a, b| match order {
        RowOrder::ValueDescending => b.value.cmp(&a.value).then_with(|| compare_labels(&a.id, &b.id)),
        RowOrder::Label => compare_labels(&a.id, &b.id),
    });
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    let a_key = normalize_for_sorting(a);
    let b_key = normalize_for_sorting(b);

    // Secondary sort: original label for ties
    a_key.cmp(&b_key).then_with(|| a.cmp(b))
}

/// Normalize a label for library-style sorting
/// - Strip leading articles (a, an, the)
/// - Normalize unicode (NFD then lowercase)
/// - Collapse whitespace
pub fn normalize_for_sorting(s: &str) -> String {
    let without_articles = strip_leading_articles(s);
    let normalized: String = without_articles.nfd().collect::<String>().to_lowercase();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_leading_articles(s: &str) -> String {
    LEADING_ARTICLE.replace(s, "").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(pairs: &[(&str, u64)]) -> Vec<AggregatedRow> {
        pairs
            .iter()
            .map(|(id, value)| AggregatedRow {
                id: id.to_string(),
                value: *value,
            })
            .collect()
    }

    fn labels(rows: &[AggregatedRow]) -> Vec<&str> {
        rows.iter().map(|row| row.id.as_str()).collect()
    }

    #[test]
    fn test_value_descending_with_label_ties() {
        let mut data = rows(&[("Socks", 3), ("Jacket", 9), ("Hat", 3)]);
        sort_rows(&mut data, RowOrder::ValueDescending);
        assert_eq!(labels(&data), vec!["Jacket", "Hat", "Socks"]);
    }

    #[test]
    fn test_label_order_ignores_articles_and_case() {
        let mut data = rows(&[("the Zebra Blanket", 1), ("apron", 1), ("Émile Coat", 1), ("Boots", 1)]);
        sort_rows(&mut data, RowOrder::Label);
        assert_eq!(labels(&data), vec!["apron", "Boots", "Émile Coat", "the Zebra Blanket"]);
    }

    #[test]
    fn test_normalize_for_sorting() {
        assert_eq!(normalize_for_sorting("The   Winter  Jackets"), "winter jackets");
        assert_eq!(strip_leading_articles("An apple"), "apple");
        assert_eq!(strip_leading_articles("Andes"), "Andes");
    }

    #[test]
    fn test_parse_row_order() {
        assert_eq!("label".parse::<RowOrder>(), Ok(RowOrder::Label));
        assert!("random".parse::<RowOrder>().is_err());
    }
}
