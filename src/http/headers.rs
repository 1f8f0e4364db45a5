//! Header and parameter containers.
//!
//! Header names are stored in canonical form (`content-type` → `Content-Type`),
//! so lookups are case-insensitive whatever casing the peer used.

use std::collections::BTreeMap;

/// Canonical form of a header name: first letter and every letter following
/// a hyphen upper-cased, the rest lower-cased.
pub fn canonical_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.trim().chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Header name → ordered values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, Vec<String>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping earlier values for the same name.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .entry(canonical_key(name))
            .or_default()
            .push(value.into());
    }

    /// Replace all values for `name` with a single one.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(canonical_key(name), vec![value.into()]);
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&canonical_key(name))
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&canonical_key(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&canonical_key(name))
    }

    /// Whether any comma-separated token of `name` equals `token`, ignoring case.
    pub fn has_token(&self, name: &str, token: &str) -> bool {
        self.get_all(name)
            .iter()
            .flat_map(|value| value.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Name → ordered values, used for query parameters and path captures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, Vec<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(name.into()).or_default().push(value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.add(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_names() {
        assert_eq!(canonical_key("content-TYPE"), "Content-Type");
        assert_eq!(canonical_key("x-forwarded-for"), "X-Forwarded-For");
        assert_eq!(canonical_key("HOST"), "Host");
    }

    #[test]
    fn lookups_ignore_case() {
        let mut headers = Headers::new();
        headers.add("accept", "text/html");
        headers.add("ACCEPT", "text/plain");
        assert_eq!(headers.get("Accept"), Some("text/html"));
        assert_eq!(headers.get_all("aCCept"), ["text/html", "text/plain"]);
        assert_eq!(headers.len(), 1);

        headers.set("accept", "*/*");
        assert_eq!(headers.get_all("Accept"), ["*/*"]);
    }

    #[test]
    fn token_search() {
        let mut headers = Headers::new();
        headers.add("Connection", "Upgrade, Keep-Alive");
        assert!(headers.has_token("connection", "keep-alive"));
        assert!(!headers.has_token("connection", "close"));
    }

    #[test]
    fn params_keep_order() {
        let params: Params = vec![("tag", "a"), ("tag", "b"), ("q", "x")].into_iter().collect();
        assert_eq!(params.get_all("tag"), ["a", "b"]);
        assert_eq!(params.get("q"), Some("x"));
        assert_eq!(params.get("missing"), None);
    }
}
