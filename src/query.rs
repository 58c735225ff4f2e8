//! Translation of query-string parameters into document filters.

use std::{collections::BTreeMap, fmt};

use serde_json::Value;

use crate::store::Document;

/// A single-field predicate, decided once when the query string is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Matches a string field equal to the literal value. No type coercion:
    /// a numeric field never matches a numeric-looking string.
    Exact(String),
    /// Matches a numeric field within the closed interval.
    Range(f64, f64),
    /// Matches a string field equal to any of the values.
    In(Vec<String>),
}

impl FieldFilter {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldFilter::Exact(expected) => value.as_str() == Some(expected.as_str()),
            FieldFilter::Range(lo, hi) => value
                .as_f64()
                .map(|v| *lo <= v && v <= *hi)
                .unwrap_or(false),
            FieldFilter::In(values) => value
                .as_str()
                .map(|v| values.iter().any(|candidate| candidate == v))
                .unwrap_or(false),
        }
    }
}

/// A conjunction of per-field predicates. A document matches if every
/// predicate matches; the empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: BTreeMap<String, FieldFilter>,
}

impl Filter {
    /// Build a filter from raw query pairs.
    ///
    /// Per key: a repeated key becomes a closed [`FieldFilter::Range`] (all
    /// values parsed as numbers, sorted ascending, first two taken), a single
    /// value containing commas becomes a [`FieldFilter::In`] over the split
    /// substrings, anything else an exact match on the literal string.
    pub fn from_query_pairs<I>(pairs: I) -> Result<Self, InvalidNumber>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            grouped.entry(key).or_default().push(value);
        }
        let mut fields = BTreeMap::new();
        for (key, values) in grouped {
            let filter = if values.len() >= 2 {
                let mut numbers = Vec::with_capacity(values.len());
                for value in &values {
                    let number = value
                        .parse::<f64>()
                        .ok()
                        .filter(|n| !n.is_nan())
                        .ok_or_else(|| InvalidNumber { key: key.clone() })?;
                    numbers.push(number);
                }
                numbers.sort_by(f64::total_cmp);
                FieldFilter::Range(numbers[0], numbers[1])
            } else if values[0].contains(',') {
                FieldFilter::In(values[0].split(',').map(str::to_string).collect())
            } else {
                FieldFilter::Exact(values[0].clone())
            };
            fields.insert(key, filter);
        }
        Ok(Self { fields })
    }

    /// Build an exact-match-only filter from raw query pairs, skipping the
    /// range/membership rules. Used for updates, which take their query
    /// params as-is. A repeated key keeps its last value.
    pub fn exact_from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(key, value)| (key, FieldFilter::Exact(value)))
            .collect();
        Self { fields }
    }

    /// A filter matching a single field exactly.
    pub fn exact(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(key.into(), FieldFilter::Exact(value.into()));
        Self { fields }
    }

    /// Whether the document satisfies every field predicate. A document
    /// missing a filtered field does not match.
    pub fn matches(&self, doc: &Document) -> bool {
        self.fields.iter().all(|(key, filter)| {
            doc.get(key)
                .map(|value| filter.matches(value))
                .unwrap_or(false)
        })
    }
}

/// A query parameter that was expected to be numeric but failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidNumber {
    key: String,
}

impl fmt::Display for InvalidNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid number for parameter \"{}\"", self.key)
    }
}

impl std::error::Error for InvalidNumber {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn single_value_is_exact() {
        let filter = Filter::from_query_pairs(pairs(&[("name", "Pen")])).unwrap();
        assert!(filter.matches(&doc(json!({"name": "Pen"}))));
        assert!(!filter.matches(&doc(json!({"name": "Pencil"}))));
        // missing field does not match
        assert!(!filter.matches(&doc(json!({"price": 1.5}))));
    }

    #[test]
    fn exact_does_not_coerce_numbers() {
        let filter = Filter::from_query_pairs(pairs(&[("price", "1.5")])).unwrap();
        assert!(!filter.matches(&doc(json!({"price": 1.5}))));
        assert!(filter.matches(&doc(json!({"price": "1.5"}))));
    }

    #[test]
    fn comma_value_is_membership() {
        let filter = Filter::from_query_pairs(pairs(&[("name", "Pen,Ink")])).unwrap();
        assert!(filter.matches(&doc(json!({"name": "Pen"}))));
        assert!(filter.matches(&doc(json!({"name": "Ink"}))));
        assert!(!filter.matches(&doc(json!({"name": "Brush"}))));
        // membership is order-independent
        let flipped = Filter::from_query_pairs(pairs(&[("name", "Ink,Pen")])).unwrap();
        assert!(flipped.matches(&doc(json!({"name": "Pen"}))));
    }

    #[test]
    fn membership_keeps_split_substrings_verbatim() {
        let filter = Filter::from_query_pairs(pairs(&[("price", "1,2")])).unwrap();
        // values stay strings, numeric fields do not match
        assert!(!filter.matches(&doc(json!({"price": 1}))));
        assert!(filter.matches(&doc(json!({"price": "2"}))));
    }

    #[test]
    fn repeated_key_is_sorted_closed_range() {
        let filter = Filter::from_query_pairs(pairs(&[("price", "10"), ("price", "2")])).unwrap();
        assert!(filter.matches(&doc(json!({"price": 2}))));
        assert!(filter.matches(&doc(json!({"price": 10}))));
        assert!(filter.matches(&doc(json!({"price": 5.5}))));
        assert!(!filter.matches(&doc(json!({"price": 1.99}))));
        assert!(!filter.matches(&doc(json!({"price": 10.01}))));
        // strings are not coerced for range matching
        assert!(!filter.matches(&doc(json!({"price": "5"}))));
    }

    #[test]
    fn range_uses_two_smallest_of_many_values() {
        let filter = Filter::from_query_pairs(pairs(&[
            ("price", "5"),
            ("price", "1"),
            ("price", "3"),
        ]))
        .unwrap();
        assert!(filter.matches(&doc(json!({"price": 2}))));
        assert!(!filter.matches(&doc(json!({"price": 4}))));
    }

    #[test]
    fn non_numeric_range_bound_is_an_error() {
        let err =
            Filter::from_query_pairs(pairs(&[("price", "abc"), ("price", "10")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid number for parameter \"price\"");
        let err =
            Filter::from_query_pairs(pairs(&[("price", "1"), ("price", "NaN")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid number for parameter \"price\"");
    }

    #[test]
    fn keys_combine_with_implicit_and() {
        let filter =
            Filter::from_query_pairs(pairs(&[("name", "Pen"), ("price", "1"), ("price", "2")]))
                .unwrap();
        assert!(filter.matches(&doc(json!({"name": "Pen", "price": 1.5}))));
        assert!(!filter.matches(&doc(json!({"name": "Ink", "price": 1.5}))));
        assert!(!filter.matches(&doc(json!({"name": "Pen", "price": 3}))));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = Filter::from_query_pairs(pairs(&[])).unwrap();
        assert!(filter.matches(&doc(json!({"name": "Pen"}))));
        assert!(filter.matches(&doc(json!({}))));
    }

    #[test]
    fn exact_pairs_skip_translation() {
        let filter = Filter::exact_from_pairs(pairs(&[("name", "Pen,Ink")]));
        // no membership split for update filters
        assert!(filter.matches(&doc(json!({"name": "Pen,Ink"}))));
        assert!(!filter.matches(&doc(json!({"name": "Pen"}))));
    }
}
