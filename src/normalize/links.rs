//! Ordered label → URL mapping.

use serde::{Serialize, Serializer};

/// Label used when an upstream gives no usable name.
pub const FALLBACK_LABEL: &str = "Link";

/// Returns `true` for absolute http(s) URLs.
#[must_use]
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Ordered mapping of link labels to URLs.
///
/// Keeps discovery order. Re-inserting an existing label replaces its URL in
/// place. Only http(s) URLs get in, and labels are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMap {
    entries: Vec<(String, String)>,
}

impl LinkMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a link, returning `false` if the URL was rejected.
    pub fn insert(&mut self, label: impl AsRef<str>, url: impl AsRef<str>) -> bool {
        let url = url.as_ref().trim();
        if !is_http_url(url) {
            return false;
        }

        let label = match label.as_ref().trim() {
            "" => FALLBACK_LABEL,
            l => l,
        };

        if let Some(entry) = self.entries.iter_mut().find(|(l, _)| l == label) {
            entry.1 = url.to_string();
        } else {
            self.entries.push((label.to_string(), url.to_string()));
        }
        true
    }

    /// Number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no link was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// URL stored under `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, u)| u.as_str())
    }

    /// Iterates `(label, url)` pairs in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, u)| (l.as_str(), u.as_str()))
    }

    /// Labels in discovery order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Positional window `[start, start + len)`, clipped to the map size.
    #[must_use]
    pub fn window(&self, start: usize, len: usize) -> &[(String, String)] {
        let start = start.min(self.entries.len());
        let end = start.saturating_add(len).min(self.entries.len());
        &self.entries[start..end]
    }
}

impl Serialize for LinkMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<L: AsRef<str>, U: AsRef<str>> FromIterator<(L, U)> for LinkMap {
    fn from_iter<I: IntoIterator<Item = (L, U)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (label, url) in iter {
            map.insert(label, url);
        }
        map
    }
}
