//! Link discovery strategies.
//!
//! Each strategy looks for one upstream shape and returns whatever links it
//! finds; the chain stops at the first non-empty result.

use super::labels::{label_from_key, label_from_name};
use super::links::{is_http_url, LinkMap};
use super::{first_truthy, value_to_string};
use serde_json::{Map, Value};
use tracing::trace;

/// Keys that may hold the URL inside a per-link object.
const URL_KEYS: &[&str] = &[
    "link",
    "url",
    "google_final",
    "edited",
    "telegram_file",
    "gofile_final",
];

/// Keys the generic scan never treats as links.
const GENERIC_SKIP: &[&str] = &["title", "filesize", "format", "file_format", "success", "links"];

/// Services whose payloads use the `api*` / `streamapi` layout.
const API_FAMILY: &[&str] = &["terabox", "bypass"];

/// Input for a strategy
pub struct Context<'a> {
    /// Selected root object
    pub root: &'a Map<String, Value>,
    /// Canonical service id
    pub service: &'a str,
}

/// A single link-discovery strategy
pub type LinkStrategy = fn(&Context<'_>) -> LinkMap;

/// The discovery chain, in priority order.
pub const STRATEGIES: &[(&str, LinkStrategy)] = &[
    ("direct_url", direct_url),
    ("link_list", link_list),
    ("link_object", link_object),
    ("api_family", api_family),
    ("generic_scan", generic_scan),
];

/// Runs the chain and returns the first non-empty link map.
#[must_use]
pub fn discover_links(ctx: &Context<'_>) -> LinkMap {
    for (name, strategy) in STRATEGIES {
        let links = strategy(ctx);
        if !links.is_empty() {
            trace!(strategy = *name, count = links.len(), "Links discovered");
            return links;
        }
    }
    LinkMap::new()
}

/// Root-level `url` string.
pub fn direct_url(ctx: &Context<'_>) -> LinkMap {
    let mut links = LinkMap::new();
    if let Some(Value::String(url)) = ctx.root.get("url") {
        links.insert("Direct Link", url);
    }
    links
}

/// `links` / `files` arrays of `{type|tag|text|quality, url|link}` objects.
pub fn link_list(ctx: &Context<'_>) -> LinkMap {
    let mut links = LinkMap::new();
    for key in ["links", "files"] {
        let Some(Value::Array(items)) = ctx.root.get(key) else {
            continue;
        };
        for item in items.iter().filter_map(Value::as_object) {
            let Some(url) = first_truthy(item, &["url", "link"]) else {
                continue;
            };
            let label = first_truthy(item, &["type", "tag", "text", "quality"])
                .map_or_else(|| "Link".to_string(), value_to_string);
            links.insert(label, value_to_string(url));
        }
    }
    links
}

/// URL and optional `name`-derived label from a per-link object.
fn probe_object(obj: &Map<String, Value>) -> Option<(String, Option<String>)> {
    let url = first_truthy(obj, URL_KEYS).map(value_to_string)?;
    let label = first_truthy(obj, &["name"]).map(|n| label_from_name(&value_to_string(n)));
    Some((url, label))
}

/// Inserts one `key: value` pair the way `links` objects are read.
fn insert_keyed(links: &mut LinkMap, key: &str, value: &Value) {
    match value {
        Value::String(url) => {
            links.insert(label_from_key(key), url);
        }
        Value::Object(obj) => {
            if let Some((url, label)) = probe_object(obj) {
                links.insert(label.unwrap_or_else(|| label_from_key(key)), url);
            }
        }
        _ => {}
    }
}

/// `links` object keyed by mirror name.
pub fn link_object(ctx: &Context<'_>) -> LinkMap {
    let mut links = LinkMap::new();
    if let Some(Value::Object(raw)) = ctx.root.get("links") {
        for (key, value) in raw {
            insert_keyed(&mut links, key, value);
        }
    }
    links
}

fn insert_sub_links(links: &mut LinkMap, prefix: &str, obj: &Map<String, Value>) {
    for (sub_key, sub_value) in obj {
        if let Value::String(url) = sub_value {
            if is_http_url(url) {
                links.insert(format!("{prefix} - {}", sub_key.to_uppercase()), url);
            }
        }
    }
}

/// Terabox / generic-bypass layout: `url`, `api1: {dl1, stream}`, `streamapi: {...}`.
pub fn api_family(ctx: &Context<'_>) -> LinkMap {
    let mut links = LinkMap::new();
    if !API_FAMILY.contains(&ctx.service) {
        return links;
    }

    if let Some(Value::String(url)) = ctx.root.get("url") {
        links.insert("Direct Link", url);
    }

    for (key, value) in ctx.root {
        if let (true, Value::Object(obj)) = (key.starts_with("api"), value) {
            insert_sub_links(&mut links, &key.to_uppercase(), obj);
        }
    }

    if let Some(Value::Object(obj)) = ctx.root.get("streamapi") {
        insert_sub_links(&mut links, "StreamAPI", obj);
    }

    links
}

/// Last resort: every root key that looks like a link.
pub fn generic_scan(ctx: &Context<'_>) -> LinkMap {
    let mut links = LinkMap::new();
    for (key, value) in ctx.root {
        if GENERIC_SKIP.contains(&key.as_str()) {
            continue;
        }
        insert_keyed(&mut links, key, value);
    }
    links
}
