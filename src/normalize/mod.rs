//! Response normalization.
//!
//! Upstream bypass services each answer with their own JSON layout. This
//! module coerces any of them into [`NormalizedResult`]: scalar fields with an
//! `"N/A"` sentinel plus an ordered [`LinkMap`]. Normalization never fails;
//! missing structure only means missing fields.

/// Link label rules
pub mod labels;
/// Ordered link map
pub mod links;
/// Poster worker normalization
pub mod poster;
/// Link discovery chain
pub mod strategies;

pub use links::LinkMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Sentinel for a field the upstream did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Canonical shape of one bypass result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedResult {
    /// File title or `"N/A"`
    pub title: String,
    /// Human-readable size or `"N/A"`
    pub filesize: String,
    /// Container/format or `"N/A"`
    pub format: String,
    /// Download links in discovery order
    pub links: LinkMap,
    /// Canonical service id
    pub service: String,
}

impl NormalizedResult {
    /// A result with every scalar unknown and no links.
    #[must_use]
    pub fn empty(service: &str) -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            filesize: NOT_AVAILABLE.to_string(),
            format: NOT_AVAILABLE.to_string(),
            links: LinkMap::new(),
            service: service.to_string(),
        }
    }
}

/// One result, or several variants of the same submission (e.g. qualities)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Normalized {
    /// A single result
    Single(NormalizedResult),
    /// Multiple variants, in upstream order
    Many(Vec<Normalized>),
}

impl Normalized {
    /// Flattens nested variants into a list of results.
    #[must_use]
    pub fn flatten(&self) -> Vec<&NormalizedResult> {
        match self {
            Self::Single(r) => vec![r],
            Self::Many(items) => items.iter().flat_map(Self::flatten).collect(),
        }
    }
}

/// Python-style truthiness: null, false, 0, "" and empty containers are absent.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First present, truthy value among `keys`.
pub(crate) fn first_truthy<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| is_truthy(v))
}

/// Display form of a scalar: strings verbatim, everything else as JSON text.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Looks `keys` up in the root first, then in the outer payload.
fn scalar(root: &Map<String, Value>, outer: &Map<String, Value>, keys: &[&str]) -> String {
    first_truthy(root, keys)
        .or_else(|| first_truthy(outer, keys))
        .map_or_else(|| NOT_AVAILABLE.to_string(), value_to_string)
}

/// Normalizes an upstream payload for `service`.
#[must_use]
pub fn normalize(payload: &Value, service: &str) -> Normalized {
    let Some(outer) = payload.as_object() else {
        return Normalized::Single(NormalizedResult::empty(service));
    };

    let root = match outer.get("final") {
        Some(Value::Object(inner)) => inner,
        _ => outer,
    };

    if let Some(Value::Array(items)) = root.get("results").or_else(|| outer.get("results")) {
        return Normalized::Many(items.iter().map(|item| normalize(item, service)).collect());
    }

    let mut title = scalar(root, outer, &["title", "file_name"]);
    let mut filesize = scalar(root, outer, &["filesize", "file_size"]);
    let format = scalar(root, outer, &["format", "file_format"]);

    if let Some(Value::Object(meta)) = root.get("metadata") {
        if title == NOT_AVAILABLE {
            if let Some(v) = first_truthy(meta, &["file_name", "title"]) {
                title = value_to_string(v);
            }
        }
        if filesize == NOT_AVAILABLE {
            if let Some(v) = first_truthy(meta, &["size", "filesize"]) {
                filesize = value_to_string(v);
            }
        }
    }

    let links = strategies::discover_links(&strategies::Context { root, service });

    Normalized::Single(NormalizedResult {
        title,
        filesize,
        format,
        links,
        service: service.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn single(n: Normalized) -> NormalizedResult {
        match n {
            Normalized::Single(r) => r,
            Normalized::Many(_) => panic!("expected a single result"),
        }
    }

    #[test]
    fn test_final_root_and_outer_fallback() {
        let payload = json!({
            "title": "Outer Title",
            "final": {
                "filesize": "1.2 GB",
                "links": {"instant_final": "https://instant"}
            }
        });
        let r = single(normalize(&payload, "gdflix"));
        assert_eq!(r.title, "Outer Title");
        assert_eq!(r.filesize, "1.2 GB");
        assert_eq!(r.format, NOT_AVAILABLE);
        assert_eq!(r.links.get("Instant"), Some("https://instant"));
        assert_eq!(r.service, "gdflix");
    }

    #[test]
    fn test_alternate_scalar_keys() {
        let payload = json!({
            "file_name": "movie.mkv",
            "file_size": 2048,
            "file_format": "mkv",
            "title": ""
        });
        let r = single(normalize(&payload, "hubcloud"));
        assert_eq!(r.title, "movie.mkv");
        assert_eq!(r.filesize, "2048");
        assert_eq!(r.format, "mkv");
    }

    #[test]
    fn test_metadata_override() {
        let payload = json!({
            "metadata": {"file_name": "clip.mp4", "size": "30 MB"},
            "url": "https://d"
        });
        let r = single(normalize(&payload, "terabox"));
        assert_eq!(r.title, "clip.mp4");
        assert_eq!(r.filesize, "30 MB");
        assert_eq!(r.links.get("Direct Link"), Some("https://d"));
    }

    #[test]
    fn test_results_fan_out() {
        let a = json!({"title": "A 720p", "url": "https://a"});
        let b = json!({"title": "A 1080p", "links": {"zip_final": "https://b"}});
        let payload = json!({"results": [a.clone(), b.clone()]});

        let got = normalize(&payload, "hubdrive");
        assert_eq!(
            got,
            Normalized::Many(vec![normalize(&a, "hubdrive"), normalize(&b, "hubdrive")])
        );
        assert_eq!(got.flatten().len(), 2);
    }

    #[test]
    fn test_non_object_payload() {
        let r = single(normalize(&json!(["x"]), "gdflix"));
        assert_eq!(r, NormalizedResult::empty("gdflix"));
    }

    #[test]
    fn test_no_links_found() {
        let r = single(normalize(&json!({"title": "T", "success": true}), "gdflix"));
        assert!(r.links.is_empty());
        assert_eq!(r.title, "T");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(1.5)));
    }
}
