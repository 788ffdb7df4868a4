//! URL extraction from inbound chat messages.
//!
//! Works on [`MessageParts`], a transport-neutral view of a message, so the
//! precedence rules can be tested without constructing Telegram updates.

use teloxide::types::Message;

/// The pieces of a chat message that may carry links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageParts {
    /// Whitespace-split command tokens, command token first. Empty when the
    /// message is not a command.
    pub command: Vec<String>,
    /// Text (or caption) of the replied-to message
    pub reply_text: Option<String>,
    /// Text (or caption) of the message itself
    pub text: Option<String>,
}

impl MessageParts {
    /// Builds the parts view from a Telegram message.
    #[must_use]
    pub fn from_message(msg: &Message) -> Self {
        let text = msg.text().or_else(|| msg.caption()).map(str::to_string);
        let command = text
            .as_deref()
            .filter(|t| t.starts_with('/'))
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let reply_text = msg
            .reply_to_message()
            .and_then(|r| r.text().or_else(|| r.caption()))
            .map(str::to_string);

        Self {
            command,
            reply_text,
            text,
        }
    }

    /// Command arguments, without the command token itself.
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }
}

/// Returns `true` if the token should be treated as a link.
#[must_use]
pub fn is_url_token(token: &str) -> bool {
    token.starts_with("http://") || token.starts_with("https://")
}

fn urls_in(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().filter(|part| is_url_token(part))
}

/// Returns the single target of a command, the legacy way.
///
/// The first command argument wins verbatim (validation happens later in the
/// fetcher), then the first URL of the replied-to message, then the first URL
/// of the message text.
#[must_use]
pub fn first_url(parts: &MessageParts) -> Option<String> {
    if let Some(arg) = parts.args().first() {
        return Some(arg.trim().to_string());
    }

    if let Some(url) = parts.reply_text.as_deref().and_then(|t| urls_in(t).next()) {
        return Some(url.to_string());
    }

    parts
        .text
        .as_deref()
        .and_then(|t| urls_in(t).next())
        .map(str::to_string)
}

/// Collects every URL in the message, in precedence order, without duplicates.
///
/// Order: command arguments, replied-to text, own text (command tokens
/// skipped). A later exact duplicate is dropped.
#[must_use]
pub fn all_urls(parts: &MessageParts) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut push = |candidate: &str| {
        if !urls.iter().any(|u| u == candidate) {
            urls.push(candidate.to_string());
        }
    };

    for arg in parts.args() {
        let arg = arg.trim();
        if is_url_token(arg) {
            push(arg);
        }
    }

    if let Some(reply) = parts.reply_text.as_deref() {
        for url in urls_in(reply) {
            push(url);
        }
    }

    if let Some(text) = parts.text.as_deref() {
        for url in text
            .split_whitespace()
            .filter(|part| !part.starts_with('/'))
            .filter(|part| is_url_token(part))
        {
            push(url);
        }
    }

    urls
}
