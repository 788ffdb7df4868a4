//! Poster result rendering.

use crate::normalize::poster::PosterInfo;
use crate::normalize::NOT_AVAILABLE;
use html_escape::{encode_double_quoted_attribute, encode_text};

fn link_line(label: &str, url: Option<&str>) -> String {
    url.map_or_else(
        || format!("<b>{label}:</b> {NOT_AVAILABLE}"),
        |u| {
            format!(
                "<b>{label}:</b> <a href=\"{}\">Click Here</a>",
                encode_double_quoted_attribute(u)
            )
        },
    )
}

/// Renders scraped poster info.
#[must_use]
pub fn render_poster(info: &PosterInfo) -> String {
    let mut lines = vec![
        format!("<b>✺Source:</b> {}", encode_text(&info.source)),
        String::new(),
        format!("<b>Title:</b> {}", encode_text(&info.title)),
    ];
    if info.year != NOT_AVAILABLE {
        lines.push(format!("<b>Year:</b> {}", encode_text(&info.year)));
    }
    if info.kind != NOT_AVAILABLE {
        lines.push(format!("<b>Type:</b> {}", encode_text(&info.kind)));
    }
    lines.push(String::new());
    lines.push(link_line("Portrait", info.poster.as_deref()));
    lines.push(link_line("Landscape", info.landscape.as_deref()));
    lines.join("\n")
}
