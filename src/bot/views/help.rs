//! `/start` and `/help` text, generated from the service registry.

use crate::services::{ServiceKind, ServiceRegistry};
use std::fmt::Write;
use teloxide::types::InlineKeyboardButton;

fn command_lines(registry: &ServiceRegistry, kind: ServiceKind, suffix: &str) -> String {
    let mut out = String::new();
    for service in registry.of_kind(kind) {
        let commands = service
            .aliases
            .iter()
            .map(|a| format!("/{a}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "{commands} - {} {suffix}", service.display_name);
    }
    out
}

/// Full help message listing every bypass and poster command.
#[must_use]
pub fn help_text(registry: &ServiceRegistry) -> String {
    format!(
        "<b><u>LINK BYPASS &amp; POSTER BOT</u></b>\n\
         <blockquote expandable>\
         <b>Bypasses direct links from cloud sites and scrapes posters from OTT platforms.</b>\
         </blockquote>\n\
         <b>✺ Bypass</b>\n\
         <blockquote expandable>{}</blockquote>\n\
         <b>✺ Posters</b>\n\
         <blockquote expandable>{}</blockquote>\n\
         <blockquote expandable><b>Examples</b>\n\
         <code>/gdf https://gdflix.example/file/abc</code>\n\
         <code>/bypass https://a.example/1 https://b.example/2</code>\n\
         Reply to a message containing a link with the command to use that link.\
         </blockquote>",
        command_lines(registry, ServiceKind::Bypass, "links").trim_end(),
        command_lines(registry, ServiceKind::Poster, "poster").trim_end(),
    )
}

/// "Updates" / "Repo" link buttons for whichever URLs are configured and valid.
#[must_use]
pub fn link_buttons(updates_url: Option<&str>, repo_url: Option<&str>) -> Vec<InlineKeyboardButton> {
    [("Updates", updates_url), ("Repo", repo_url)]
        .into_iter()
        .filter_map(|(text, raw)| {
            let parsed = url::Url::parse(raw?).ok()?;
            Some(InlineKeyboardButton::url(text, parsed))
        })
        .collect()
}
