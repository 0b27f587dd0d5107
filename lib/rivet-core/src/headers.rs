//! Ordered header multimap.
//!
//! Header names are matched case-insensitively but stored as given. Values
//! may repeat per name and keep their insertion order, which request signing
//! depends on.

/// An ordered multimap of header name to value(s).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a value, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Sets a header, replacing every existing value for that name.
    ///
    /// The new value takes the position of the first replaced entry, so
    /// re-applying a filter does not reorder the map.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => {
                self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
                self.entries.insert(index, (name, value));
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Removes every value for the name, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    /// First value for the name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for the name, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if at least one value exists for the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of entries (counting repeated names).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

impl<N, V> Extend<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn extend<T: IntoIterator<Item = (N, V)>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.append(name, value);
        }
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<&http::HeaderMap> for Headers {
    /// Converts a hyper header map, skipping values that are not visible ASCII.
    fn from(map: &http::HeaderMap) -> Self {
        map.iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "application/xml");

        assert_eq!(headers.get("content-type"), Some("application/xml"));
        assert!(headers.contains("CONTENT-TYPE"));
        assert_eq!(headers.get("Accept"), None);
    }

    #[test]
    fn append_keeps_repeated_values_in_order() {
        let headers: Headers = [("X-Meta", "a"), ("Accept", "*/*"), ("x-meta", "b")]
            .into_iter()
            .collect();

        assert_eq!(headers.get_all("X-Meta").collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut headers: Headers = [
            ("Accept", "*/*"),
            ("Authorization", "old"),
            ("X-Trace", "1"),
            ("authorization", "older"),
        ]
        .into_iter()
        .collect();

        headers.insert("Authorization", "new");

        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(
            pairs,
            [("Accept", "*/*"), ("Authorization", "new"), ("X-Trace", "1")]
        );
    }

    #[test]
    fn insert_is_idempotent() {
        let mut once = Headers::new();
        once.append("Accept", "*/*");
        once.insert("X-Auth-Token", "t");

        let mut twice = once.clone();
        twice.insert("X-Auth-Token", "t");

        assert_eq!(once, twice);
    }

    #[test]
    fn insert_missing_appends() {
        let mut headers = Headers::new();
        headers.insert("Accept", "*/*");
        assert_eq!(headers.get("accept"), Some("*/*"));
    }

    #[test]
    fn remove_counts_all_values() {
        let mut headers: Headers = [("A", "1"), ("a", "2"), ("B", "3")].into_iter().collect();
        assert_eq!(headers.remove("A"), 2);
        assert_eq!(headers.len(), 1);
        assert!(!headers.is_empty());
    }

    #[test]
    fn from_http_header_map() {
        let mut map = http::HeaderMap::new();
        map.append("x-count", http::HeaderValue::from_static("7"));
        map.append("x-count", http::HeaderValue::from_static("8"));

        let headers = Headers::from(&map);
        assert_eq!(headers.get_all("X-Count").collect::<Vec<_>>(), ["7", "8"]);
    }
}
