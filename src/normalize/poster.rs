//! Poster worker normalization.
//!
//! Poster workers return artwork URLs under many names, sometimes nested
//! deep inside the payload. Known keys are tried first; otherwise every URL
//! in the document is collected with its key path and ranked by hints.

use super::{first_truthy, value_to_string, NOT_AVAILABLE};
use serde::Serialize;
use serde_json::{Map, Value};

const PORTRAIT_KEYS: &[&str] = &[
    "portrait",
    "poster",
    "poster_url",
    "thumbnail",
    "image",
    "image_url",
    "cover",
    "thumb",
];
const LANDSCAPE_KEYS: &[&str] = &["landscape", "landscape_url", "backdrop", "banner", "fanart"];

const PORTRAIT_HINTS: &[&str] = &["portrait", "vertical", "poster", "thumb", "cover", "thumbnail"];
const LANDSCAPE_HINTS: &[&str] = &["landscape", "horizontal", "backdrop", "banner", "hero"];

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".avif", ".jfif"];
const IMAGE_WORDS: &[&str] = &["image", "img", "poster", "cover", "banner", "art", "thumb"];

/// Artwork and metadata scraped for one title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PosterInfo {
    /// Title or `"N/A"`
    pub title: String,
    /// Release year or `"N/A"`
    pub year: String,
    /// Movie / show / ... or `"N/A"`
    pub kind: String,
    /// Portrait artwork
    pub poster: Option<String>,
    /// Landscape artwork
    pub landscape: Option<String>,
    /// Provider display name
    pub source: String,
}

/// Heuristic: does this URL point at an image?
#[must_use]
pub fn looks_like_image(url: &str) -> bool {
    let lower = url.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || IMAGE_WORDS.iter().any(|w| lower.contains(w))
}

/// Walks the document and records `(lowercased key path, url)` for every URL string.
fn collect_url_pairs(node: &Value, path: &str, out: &mut Vec<(String, String)>) {
    match node {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                collect_url_pairs(v, &key, out);
            }
        }
        Value::Array(items) => {
            for (idx, v) in items.iter().enumerate() {
                let key = if path.is_empty() {
                    idx.to_string()
                } else {
                    format!("{path}[{idx}]")
                };
                collect_url_pairs(v, &key, out);
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with("http://") || s.starts_with("https://") {
                out.push((path.to_lowercase(), s.to_string()));
            }
        }
        _ => {}
    }
}

fn is_image(candidate: Option<&String>) -> bool {
    candidate.is_some_and(|u| looks_like_image(u))
}

fn first_hinted(pairs: &[(String, String)], hints: &[&str]) -> Option<String> {
    pairs
        .iter()
        .find(|(key, _)| hints.iter().any(|h| key.contains(h)))
        .map(|(_, url)| url.clone())
}

fn field(root: &Map<String, Value>, keys: &[&str]) -> String {
    first_truthy(root, keys).map_or_else(|| NOT_AVAILABLE.to_string(), value_to_string)
}

/// Normalizes a poster worker payload; `None` when it is not a JSON object.
#[must_use]
pub fn normalize_poster(payload: &Value, source: &str) -> Option<PosterInfo> {
    let outer = payload.as_object()?;
    let root = match outer.get("data") {
        Some(Value::Object(inner)) => inner,
        _ => outer,
    };

    let mut poster = first_truthy(root, PORTRAIT_KEYS).map(value_to_string);
    let mut landscape = first_truthy(root, LANDSCAPE_KEYS).map(value_to_string);

    if !is_image(poster.as_ref()) || !is_image(landscape.as_ref()) {
        let mut pairs = Vec::new();
        collect_url_pairs(payload, "", &mut pairs);
        let images: Vec<(String, String)> = pairs
            .iter()
            .filter(|(_, url)| looks_like_image(url))
            .cloned()
            .collect();
        let all_urls: Vec<&String> = if images.is_empty() {
            pairs.iter().map(|(_, u)| u).collect()
        } else {
            images.iter().map(|(_, u)| u).collect()
        };

        if !is_image(poster.as_ref()) {
            if let Some(hit) = first_hinted(&images, PORTRAIT_HINTS) {
                poster = Some(hit);
            }
        }
        if !is_image(landscape.as_ref()) {
            if let Some(hit) = first_hinted(&images, LANDSCAPE_HINTS) {
                landscape = Some(hit);
            }
        }

        if poster.is_none() {
            poster = all_urls.first().map(|u| (*u).clone());
        }
        if landscape.is_none() {
            landscape = all_urls
                .get(1)
                .filter(|u| Some(**u) != poster.as_ref())
                .map(|u| (*u).clone());
        }
    }

    Some(PosterInfo {
        title: field(root, &["title", "name", "show", "movie"]),
        year: field(root, &["year", "release_year", "release"]),
        kind: field(root, &["type", "kind"]),
        poster,
        landscape,
        source: source.to_string(),
    })
}
