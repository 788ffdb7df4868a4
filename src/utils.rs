//! Small text helpers and the Telegram retry wrapper.

use anyhow::Result;
use lazy_regex::lazy_regex;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;

/// Hard Telegram limit for a message body, in characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Length an over-long message is cut down to before the marker is appended.
pub const TRUNCATED_LENGTH: usize = 4000;

/// Appended to messages cut down to [`TRUNCATED_LENGTH`].
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

static RE_HTML_TAG: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)[^>]*>");

/// Truncates a string to at most `max_chars` characters, respecting UTF-8 boundaries.
///
/// # Examples
///
/// ```
/// use bypass_relay::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Applies the chat message limit to HTML text.
///
/// Text over [`TELEGRAM_MESSAGE_LIMIT`] characters keeps its whole lines up
/// to [`TRUNCATED_LENGTH`] characters, gets every still-open tag closed and
/// is marked. A first line that alone exceeds the budget is cut mid-line,
/// but never inside a tag or an entity.
///
/// # Examples
///
/// ```
/// use bypass_relay::utils::cap_message;
///
/// assert_eq!(cap_message("short"), "short");
/// let long = format!("<b>{}</b>", "x\n".repeat(3000));
/// let capped = cap_message(&long);
/// assert!(capped.ends_with("x</b>\n... (truncated)"));
/// ```
#[must_use]
pub fn cap_message(text: &str) -> String {
    if text.chars().count() <= TELEGRAM_MESSAGE_LIMIT {
        return text.to_string();
    }
    let kept = &text[..cut_point(text, TRUNCATED_LENGTH)];
    let closers: String = unclosed_tags(kept)
        .iter()
        .rev()
        .map(|tag| format!("</{tag}>"))
        .collect();
    format!("{kept}{closers}{TRUNCATION_MARKER}")
}

/// Byte offset of the last whole line ending within `max_chars` characters.
fn cut_point(text: &str, max_chars: usize) -> usize {
    let mut end = 0;
    let mut chars = 0;
    for line in text.split_inclusive('\n') {
        let len = line.chars().count();
        if chars + len > max_chars {
            break;
        }
        chars += len;
        end += line.len();
    }
    if end > 0 {
        return text[..end].trim_end_matches('\n').len();
    }

    let prefix = &text[..truncate_str(text, max_chars).len()];
    let mut cut = prefix.len();
    if let Some(lt) = prefix.rfind('<') {
        if !prefix[lt..].contains('>') {
            cut = lt;
        }
    }
    if let Some(amp) = prefix[..cut].rfind('&') {
        if !prefix[amp..cut].contains(';') {
            cut = amp;
        }
    }
    cut
}

/// Tags opened in `html` and not closed, outermost first.
fn unclosed_tags(html: &str) -> Vec<&str> {
    let mut open: Vec<&str> = Vec::new();
    for caps in RE_HTML_TAG.captures_iter(html) {
        let Some(name) = caps.get(2).map(|m| m.as_str()) else {
            continue;
        };
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            if let Some(pos) = open.iter().rposition(|t| t.eq_ignore_ascii_case(name)) {
                open.truncate(pos);
            }
        } else {
            open.push(name);
        }
    }
    open
}

/// Retry a Telegram API operation with exponential backoff.
///
/// The retry strategy uses exponential backoff with jitter:
/// - Initial delay: 500ms
/// - Max delay: 4s
/// - Max retries: 3 (see constants in `config.rs`)
///
/// # Errors
///
/// Returns the last error if all attempts fail.
///
/// # Examples
///
/// ```no_run
/// use bypass_relay::utils::retry_telegram_operation;
/// use anyhow::Result;
///
/// async fn answer() -> Result<u32> {
///     Ok(1)
/// }
///
/// # async fn example() -> Result<()> {
/// let value = retry_telegram_operation(|| async { answer().await }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} retries: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_truncate_str_unicode() {
        let s = "Привет, мир!";
        assert_eq!(truncate_str(s, 6), "Привет");
        assert_eq!(truncate_str(s, 50), "Привет, мир!");
    }

    #[test]
    fn test_cap_message_limits() {
        let exact = "a".repeat(TELEGRAM_MESSAGE_LIMIT);
        assert_eq!(cap_message(&exact), exact);

        let over = "b".repeat(TELEGRAM_MESSAGE_LIMIT + 1);
        let capped = cap_message(&over);
        assert_eq!(
            capped.chars().count(),
            TRUNCATED_LENGTH + TRUNCATION_MARKER.chars().count()
        );
        assert!(capped.starts_with(&"b".repeat(TRUNCATED_LENGTH)));
        assert!(capped.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_cap_message_counts_chars_not_bytes() {
        // 3000 two-byte characters: over 4096 bytes, under 4096 chars.
        let text = "é".repeat(3000);
        assert_eq!(cap_message(&text), text);
    }

    #[test]
    fn test_cap_message_closes_tags_spanning_the_cut() {
        let text = format!("<blockquote>{}</blockquote>", "line\n".repeat(1000));
        let capped = cap_message(&text);
        assert!(capped.ends_with("line</blockquote>\n... (truncated)"));
        assert!(capped.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
    }

    #[test]
    fn test_cap_message_never_splits_a_tag() {
        let text = format!(
            "{}<a href=\"https://example.com\">go</a>{}",
            "x".repeat(3995),
            "y".repeat(200)
        );
        assert_eq!(
            cap_message(&text),
            format!("{}{TRUNCATION_MARKER}", "x".repeat(3995))
        );
    }

    #[test]
    fn test_cap_message_never_splits_an_entity() {
        let text = format!("{}&amp;{}", "x".repeat(3998), "y".repeat(200));
        assert_eq!(
            cap_message(&text),
            format!("{}{TRUNCATION_MARKER}", "x".repeat(3998))
        );
    }

    #[test]
    fn test_unclosed_tags_tracks_nesting() {
        assert_eq!(
            unclosed_tags("<b>a</b> <blockquote><a href=\"x\">t"),
            vec!["blockquote", "a"]
        );
        assert!(unclosed_tags("<b>x</b><i>y</i>").is_empty());
    }

    #[tokio::test]
    async fn test_retry_telegram_operation_recovers() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result = retry_telegram_operation(|| async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("flaky");
            }
            Ok(7)
        })
        .await;

        assert_eq!(result.ok(), Some(7));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
