//! Dual-encoded query parameters.
//!
//! Every key appears in both mappings or in neither: the single-valued map
//! holds the first value, the multi-valued map all values in order. A key
//! whose only value is empty is omitted.

use std::collections::BTreeMap;

/// Query parameters in both gateway encodings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    pub single: BTreeMap<String, String>,
    pub multi: BTreeMap<String, Vec<String>>,
}

impl QueryParameters {
    /// Build from decoded (key, value) pairs in their original order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut multi: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            multi.entry(key.into()).or_default().push(value.into());
        }
        multi.retain(|_, values| values.len() > 1 || values.iter().any(|v| !v.is_empty()));

        let single = multi
            .iter()
            .filter_map(|(key, values)| Some((key.clone(), values.first()?.clone())))
            .collect();
        Self { single, multi }
    }

    /// Parse a raw `application/x-www-form-urlencoded` query string.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(query) => Self::from_pairs(url::form_urlencoded::parse(query.as_bytes())),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_wins() {
        let params = QueryParameters::parse(Some("a=1&b=2&b=3"));
        assert_eq!(
            params.single,
            BTreeMap::from([("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())])
        );
        assert_eq!(
            params.multi,
            BTreeMap::from([
                ("a".to_string(), vec!["1".to_string()]),
                ("b".to_string(), vec!["2".to_string(), "3".to_string()]),
            ])
        );
    }

    #[test]
    fn test_lone_empty_values_omitted() {
        let params = QueryParameters::parse(Some("a=&b&c=1"));
        assert!(!params.single.contains_key("a"));
        assert!(!params.multi.contains_key("a"));
        assert!(!params.single.contains_key("b"));
        assert_eq!(params.single["c"], "1");
    }

    #[test]
    fn test_repeated_key_keeps_empty_values() {
        let params = QueryParameters::parse(Some("d=&d=4"));
        assert_eq!(params.single["d"], "");
        assert_eq!(params.multi["d"], vec!["".to_string(), "4".to_string()]);
    }

    #[test]
    fn test_percent_decoding() {
        let params = QueryParameters::parse(Some("q=hello%20world&tag=a+b"));
        assert_eq!(params.single["q"], "hello world");
        assert_eq!(params.single["tag"], "a b");
    }

    #[test]
    fn test_no_query() {
        assert_eq!(QueryParameters::parse(None), QueryParameters::default());
        assert_eq!(QueryParameters::parse(Some("")), QueryParameters::default());
    }
}
