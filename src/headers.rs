use std::collections::{btree_map, BTreeMap};

use actix_web::http::header::HeaderMap;

/// Comparable snapshot of a response's headers.
///
/// Names are stored lower-cased and in order, each with every value it was sent with. Values that
/// are not valid UTF-8 are converted lossily.
///
/// # Examples
/// ```
/// use actix_test_api::ResponseHeaders;
///
/// let headers = ResponseHeaders::from_iter([("Content-Type", "text/plain")]);
/// assert_eq!(headers.get("content-type"), Some("text/plain"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    inner: BTreeMap<String, Vec<String>>,
}

impl ResponseHeaders {
    /// Snapshots an Actix header map.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        map.iter()
            .map(|(name, val)| {
                (
                    name.as_str(),
                    String::from_utf8_lossy(val.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    /// Appends a value to `name`.
    pub fn append(&mut self, name: impl AsRef<str>, val: impl Into<String>) {
        self.inner
            .entry(name.as_ref().to_ascii_lowercase())
            .or_default()
            .push(val.into());
    }

    /// Returns the first value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Returns every value of `name`, possibly none.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns true if `name` is present.
    pub fn contains_key(&self, name: &str) -> bool {
        self.inner.contains_key(&name.to_ascii_lowercase())
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over names and their values.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<String>> {
        self.inner.iter()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = ResponseHeaders::default();
        for (name, val) in iter {
            headers.append(name, val);
        }
        headers
    }
}

impl From<&HeaderMap> for ResponseHeaders {
    fn from(map: &HeaderMap) -> Self {
        Self::from_header_map(map)
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::header::{self, HeaderValue};

    use super::*;

    #[test]
    fn snapshot_lowercases_and_keeps_all_values() {
        let mut map = HeaderMap::new();
        map.append(header::SET_COOKIE, HeaderValue::from_static("a=b"));
        map.append(header::SET_COOKIE, HeaderValue::from_static("c=d"));
        map.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let headers = ResponseHeaders::from(&map);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get_all("set-cookie"), ["a=b", "c=d"]);
        assert!(headers.get_all("x-missing").is_empty());
    }

    #[test]
    fn built_headers_compare_to_snapshot() {
        let mut map = HeaderMap::new();
        map.insert(
            header::HeaderName::from_static("x-custom"),
            HeaderValue::from_static("1"),
        );

        assert_eq!(
            ResponseHeaders::from_header_map(&map),
            ResponseHeaders::from_iter([("X-Custom", "1")]),
        );
    }
}
