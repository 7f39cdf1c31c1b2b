//! # Ordered Query-String Codec
//!
//! The OData endpoints are sensitive to literal query text: values such as
//! `$filter` expressions must travel exactly as the caller wrote them, and
//! parameter order must survive a parse/serialize round trip. Generic
//! query-string libraries percent-decode and re-encode on the way through,
//! which is not an exact inverse of the simple split/join semantics needed
//! here, so this module keeps its own codec: split on `&`, split each pair
//! on the first `=`, keep values opaque, and join back with `&` in the
//! original insertion order.

use std::fmt;

/// An ordered sequence of `key=value` query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    /// Parses a raw query string (without the leading `?`).
    ///
    /// Empty segments are skipped; a segment without `=` becomes a key with
    /// an empty value. Values are not percent-decoded.
    pub fn parse(raw: &str) -> Self {
        let mut pairs = Vec::new();
        for param in raw.split('&') {
            if param.is_empty() {
                continue;
            }
            match param.split_once('=') {
                Some((key, value)) => pairs.push((key.to_string(), value.to_string())),
                None => pairs.push((param.to_string(), String::new())),
            }
        }
        Self { pairs }
    }

    /// True when no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// True when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// The value stored for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Updates `key` in place, preserving its position; appends when the
    /// key is new.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value.to_string(),
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
    }

    /// Merges a disjunction of filter clauses into the `$filter` parameter.
    ///
    /// An existing filter `A` merged with `B or C` becomes
    /// `(A) and (B or C)`; without one, the disjunction becomes the sole
    /// filter.
    pub fn merge_filter(&mut self, disjunction: &str) {
        match self.get("$filter").map(str::to_string) {
            Some(existing) => {
                self.set("$filter", &format!("({}) and ({})", existing, disjunction))
            }
            None => self.set("$filter", disjunction),
        }
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.pairs.iter().enumerate() {
            if index > 0 {
                write!(f, "&")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_preserves_order_and_round_trips() {
        let raw = "$select=Id,CourseCode&$expand=Terms&$orderby=LastModifiedDateTime";
        let query = QueryString::parse(raw);

        assert_eq!(query.get("$select"), Some("Id,CourseCode"));
        assert_eq!(query.get("$expand"), Some("Terms"));
        assert_eq!(query.to_string(), raw);
    }

    #[test]
    fn values_may_contain_equals_signs() {
        let query = QueryString::parse("$filter=Id eq 1&x=a=b");
        assert_eq!(query.get("$filter"), Some("Id eq 1"));
        assert_eq!(query.get("x"), Some("a=b"));
    }

    #[test]
    fn empty_query_is_empty() {
        assert!(QueryString::parse("").is_empty());
    }

    #[test]
    fn set_updates_in_place_without_reordering() {
        let mut query = QueryString::parse("$select=Id&$filter=IsActive&$expand=Terms");
        query.set("$filter", "IsActive eq true");
        assert_eq!(
            query.to_string(),
            "$select=Id&$filter=IsActive eq true&$expand=Terms"
        );
    }

    #[test]
    fn merge_filter_wraps_the_existing_filter() {
        let mut query = QueryString::parse("$filter=A");
        query.merge_filter("B or C");
        assert_eq!(query.get("$filter"), Some("(A) and (B or C)"));
    }

    #[test]
    fn merge_filter_without_an_existing_filter_appends_one() {
        let mut query = QueryString::parse("$select=Id");
        query.merge_filter("Id eq 1 or Id eq 2");
        assert_eq!(query.to_string(), "$select=Id&$filter=Id eq 1 or Id eq 2");
    }
}
