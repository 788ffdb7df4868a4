//! Bypass result rendering: single results, paged links, variants and bulk output.

use crate::bot::pagination::{page_bounds, page_callback, page_count, NOOP_CALLBACK};
use crate::error::RelayError;
use crate::fetch::BulkResult;
use crate::normalize::{NormalizedResult, NOT_AVAILABLE};
use crate::services::display_name;
use html_escape::{encode_double_quoted_attribute, encode_text};
use lazy_regex::regex_replace_all;
use serde_json::Value;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Shown when a result carries no usable link.
pub const NO_LINKS: &str = "• No direct links found.";

fn is_known(value: &str) -> bool {
    !value.is_empty() && value != NOT_AVAILABLE
}

/// Source line plus the file title, if known.
#[must_use]
pub fn header_block(result: &NormalizedResult) -> String {
    let mut lines = vec![format!(
        "<b>✺Source:</b> {}",
        encode_text(&display_name(&result.service))
    )];
    if is_known(&result.title) {
        lines.push(String::new());
        lines.push("<b>File:</b>".to_string());
        lines.push(format!("<blockquote>{}</blockquote>", encode_text(&result.title)));
    }
    lines.join("\n")
}

/// Size and format lines followed by a blank line; empty when both are unknown.
#[must_use]
pub fn meta_block(result: &NormalizedResult) -> String {
    let mut lines = Vec::new();
    if is_known(&result.filesize) {
        lines.push(format!("<b>Size:</b> {}", encode_text(&result.filesize)));
    }
    if is_known(&result.format) {
        lines.push(format!("<b>Format:</b> {}", encode_text(&result.format)));
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n\n", lines.join("\n"))
    }
}

/// One bullet per link.
#[must_use]
pub fn links_block(links: &[(String, String)]) -> String {
    if links.is_empty() {
        return NO_LINKS.to_string();
    }
    links
        .iter()
        .map(|(label, url)| {
            format!(
                "• <b>{}:</b> <a href=\"{}\">Click Here</a>",
                encode_text(label),
                encode_double_quoted_attribute(url)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fills the result template in a single pass.
///
/// Unknown `{...}` groups are left untouched.
#[must_use]
pub fn fill_template(
    template: &str,
    header: &str,
    meta: &str,
    links: &str,
    original_url: &str,
) -> String {
    let original = encode_double_quoted_attribute(original_url);
    regex_replace_all!(
        r"\{(header_block|meta_block|links_block|original_url)\}",
        template,
        |_, name: &str| match name {
            "header_block" => header.to_string(),
            "meta_block" => meta.to_string(),
            "links_block" => links.to_string(),
            _ => original.to_string(),
        }
    )
    .into_owned()
}

/// Renders `page` of a single result; only that page's links are listed.
#[must_use]
pub fn render_page(
    template: &str,
    result: &NormalizedResult,
    original_url: &str,
    page: usize,
) -> String {
    let (start, len) = page_bounds(page, result.links.len());
    fill_template(
        template,
        &header_block(result),
        &meta_block(result),
        &links_block(result.links.window(start, len)),
        original_url,
    )
}

/// Renders a single result with every link.
#[must_use]
pub fn render_single(template: &str, result: &NormalizedResult, original_url: &str) -> String {
    fill_template(
        template,
        &header_block(result),
        &meta_block(result),
        &links_block(result.links.window(0, result.links.len())),
        original_url,
    )
}

/// Renders several variants of one submission under numbered headers.
#[must_use]
pub fn render_variants(results: &[&NormalizedResult], original_url: &str) -> String {
    let mut sections: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "<b>━━ Result {} ━━</b>\n{}\n\n{}{}",
                i + 1,
                header_block(result),
                meta_block(result),
                links_block(result.links.window(0, result.links.len()))
            )
        })
        .collect();
    if sections.is_empty() {
        sections.push(NO_LINKS.to_string());
    }
    sections.push(format!(
        "<b>Original:</b> <a href=\"{}\">Open</a>",
        encode_double_quoted_attribute(original_url)
    ));
    sections.join("\n\n")
}

fn bulk_value(value: &Value) -> String {
    match value {
        Value::String(s) => encode_text(s).into_owned(),
        other => encode_text(&other.to_string()).into_owned(),
    }
}

/// Renders a bulk answer: numbered lines for lists, `key: value` for mappings.
#[must_use]
pub fn render_bulk(result: &BulkResult) -> String {
    let lines: Vec<String> = match result {
        BulkResult::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{}. {}", i + 1, bulk_value(v)))
            .collect(),
        BulkResult::Mapping(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", encode_text(k), bulk_value(v)))
            .collect(),
        BulkResult::Opaque(value) => vec![bulk_value(value)],
    };
    format!("<b>Bulk Bypass Results:</b>\n\n{}", lines.join("\n"))
}

/// Error line shown in place of a result.
#[must_use]
pub fn render_error(err: &RelayError) -> String {
    format!("<b>Error:</b> <code>{}</code>", encode_text(&err.to_string()))
}

/// Usage hint for a command invoked without a URL.
#[must_use]
pub fn usage(command: &str) -> String {
    format!(
        "<b>Usage:</b>\n/{command} &lt;url&gt;  <i>or</i>\nReply to a URL with <code>/{command}</code>"
    )
}

/// Placeholder shown while links are being resolved.
#[must_use]
pub fn processing(count: usize) -> String {
    format!("<i>Processing {count} link(s)...</i>")
}

/// `« Prev | p/total | Next »` row for a paginated result.
#[must_use]
pub fn navigation_row(session: &str, page: usize, total_links: usize) -> Vec<InlineKeyboardButton> {
    let pages = page_count(total_links);
    let mut row = Vec::new();
    if page > 1 {
        row.push(InlineKeyboardButton::callback(
            "« Prev",
            page_callback(session, page - 1),
        ));
    }
    row.push(InlineKeyboardButton::callback(
        format!("{page}/{pages}"),
        NOOP_CALLBACK,
    ));
    if page < pages {
        row.push(InlineKeyboardButton::callback(
            "Next »",
            page_callback(session, page + 1),
        ));
    }
    row
}

/// Keyboard made of the given rows, skipping empty ones.
#[must_use]
pub fn keyboard(rows: Vec<Vec<InlineKeyboardButton>>) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<_> = rows.into_iter().filter(|r| !r.is_empty()).collect();
    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BYPASS_TEMPLATE;
    use crate::normalize::LinkMap;
    use serde_json::json;
    use teloxide::types::InlineKeyboardButtonKind;

    fn sample(n: usize) -> NormalizedResult {
        let mut result = NormalizedResult::empty("gdflix");
        result.title = "Movie <2024>.mkv".to_string();
        result.filesize = "1.2 GB".to_string();
        result.links = (1..=n)
            .map(|i| (format!("L{i}"), format!("https://dl.example/{i}")))
            .collect::<LinkMap>();
        result
    }

    #[test]
    fn test_header_and_meta() {
        let result = sample(1);
        assert_eq!(
            header_block(&result),
            "<b>✺Source:</b> GDFlix\n\n<b>File:</b>\n<blockquote>Movie &lt;2024&gt;.mkv</blockquote>"
        );
        assert_eq!(meta_block(&result), "<b>Size:</b> 1.2 GB\n\n");
        assert_eq!(meta_block(&NormalizedResult::empty("gdflix")), "");
    }

    #[test]
    fn test_links_block_empty() {
        assert_eq!(links_block(&[]), NO_LINKS);
    }

    #[test]
    fn test_fill_template_single_pass() {
        let out = fill_template(
            "{header_block}|{meta_block}|{links_block}|{original_url}|{other}",
            "{meta_block}",
            "M",
            "L",
            "https://a.example/?x=\"1\"",
        );
        assert_eq!(
            out,
            "{meta_block}|M|L|https://a.example/?x=&quot;1&quot;|{other}"
        );
    }

    #[test]
    fn test_render_page_lists_only_that_page() {
        let result = sample(12);
        let page3 = render_page(DEFAULT_BYPASS_TEMPLATE, &result, "https://o.example", 3);
        assert!(page3.contains("https://dl.example/11"));
        assert!(page3.contains("https://dl.example/12"));
        assert!(!page3.contains("https://dl.example/10\""));
        assert!(page3.contains("<a href=\"https://o.example\">Open</a>"));

        let clamped = render_page(DEFAULT_BYPASS_TEMPLATE, &result, "https://o.example", 0);
        assert!(clamped.contains("https://dl.example/1\""));
        assert!(!clamped.contains("https://dl.example/6\""));
    }

    #[test]
    fn test_render_variants_numbered() {
        let a = sample(1);
        let b = sample(2);
        let out = render_variants(&[&a, &b], "https://o.example");
        assert!(out.contains("Result 1"));
        assert!(out.contains("Result 2"));
        assert!(out.ends_with("<b>Original:</b> <a href=\"https://o.example\">Open</a>"));
    }

    #[test]
    fn test_capped_variants_keep_tags_balanced() {
        use crate::utils::{cap_message, TELEGRAM_MESSAGE_LIMIT, TRUNCATION_MARKER};

        let variants: Vec<NormalizedResult> = (0..12)
            .map(|_| {
                let mut result = sample(8);
                result.service = "hubcloud".to_string();
                result
            })
            .collect();
        let refs: Vec<&NormalizedResult> = variants.iter().collect();
        let rendered = render_variants(&refs, "https://o.example");
        assert!(rendered.chars().count() > TELEGRAM_MESSAGE_LIMIT);

        let capped = cap_message(&rendered);
        assert!(capped.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
        assert!(capped.ends_with(TRUNCATION_MARKER));
        for (open, close) in [("<b>", "</b>"), ("<a ", "</a>"), ("<blockquote>", "</blockquote>")] {
            assert_eq!(
                capped.matches(open).count(),
                capped.matches(close).count(),
                "unbalanced {open}"
            );
        }
    }

    #[test]
    fn test_render_bulk_shapes() {
        let list = BulkResult::List(vec![json!("https://a"), json!({"error": "x"})]);
        assert_eq!(
            render_bulk(&list),
            "<b>Bulk Bypass Results:</b>\n\n1. https://a\n2. {\"error\":\"x\"}"
        );

        let mut map = serde_json::Map::new();
        map.insert("https://in".to_string(), json!("https://out"));
        assert_eq!(
            render_bulk(&BulkResult::Mapping(map)),
            "<b>Bulk Bypass Results:</b>\n\nhttps://in: https://out"
        );
    }

    #[test]
    fn test_render_error_escapes() {
        let err = RelayError::Rejected("<bad>".to_string());
        assert_eq!(render_error(&err), "<b>Error:</b> <code>&lt;bad&gt;</code>");
    }

    #[test]
    fn test_navigation_row() {
        let first = navigation_row("s", 1, 12);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].text, "1/3");
        assert!(matches!(
            &first[1].kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "bp_page_s_2"
        ));

        let middle = navigation_row("s", 2, 12);
        assert_eq!(middle.len(), 3);

        let last = navigation_row("s", 3, 12);
        assert_eq!(last.len(), 2);
        assert!(matches!(
            &last[0].kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "bp_page_s_2"
        ));
    }

    #[test]
    fn test_keyboard_skips_empty_rows() {
        assert!(keyboard(vec![vec![], vec![]]).is_none());
        let kb = keyboard(vec![vec![], navigation_row("s", 1, 12)]);
        assert_eq!(kb.map(|k| k.inline_keyboard.len()), Some(1));
    }
}
