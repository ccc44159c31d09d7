//! Ordered query/form parameters.
//!
//! The same encoding is used for request bodies, query strings appended to
//! endpoint paths, and cache scope derivation, so the output must be stable:
//! pairs are emitted in insertion order and only values are percent-encoded.

/// Ordered `key=value` parameters for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, keeping insertion order.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Lazily yield `key=escaped(value)` for each pair.
    pub fn encoded_pairs(&self) -> impl Iterator<Item = String> + '_ {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
    }

    pub fn to_query_string(&self) -> String {
        self.encoded_pairs().collect::<Vec<_>>().join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Append an encoded query to an endpoint path, respecting an existing `?`.
pub fn append_query(endpoint: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => {
            let separator = if endpoint.contains('?') { '&' } else { '?' };
            format!("{}{}{}", endpoint, separator, q)
        }
        _ => endpoint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_values_in_order() {
        let params = QueryParams::new().with("a", "1").with("b", "x y");
        assert_eq!(params.to_query_string(), "a=1&b=x%20y");
    }

    #[test]
    fn test_keys_are_not_escaped() {
        let params = QueryParams::new().with("type id", "a&b=c");
        assert_eq!(params.to_query_string(), "type id=a%26b%3Dc");
    }

    #[test]
    fn test_no_implicit_sorting() {
        let params: QueryParams = [("z", "1"), ("a", "2")].into_iter().collect();
        let pairs: Vec<String> = params.encoded_pairs().collect();
        assert_eq!(pairs, vec!["z=1", "a=2"]);
    }

    #[test]
    fn test_identical_input_yields_identical_encoding() {
        let build = || QueryParams::new().with("section_id", "12").with("term_id", "99");
        assert_eq!(build().to_query_string(), build().to_query_string());
    }

    #[test]
    fn test_empty_params() {
        assert_eq!(QueryParams::new().to_query_string(), "");
    }

    #[test]
    fn test_append_query() {
        assert_eq!(append_query("api.php", Some("a=1")), "api.php?a=1");
        assert_eq!(
            append_query("api.php?action=getTerms", Some("a=1")),
            "api.php?action=getTerms&a=1"
        );
        assert_eq!(append_query("api.php", None), "api.php");
        assert_eq!(append_query("api.php", Some("")), "api.php");
    }
}
