//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Every outbound message is HTML, capped to the Telegram length limit, and
//! retried on transient failures using exponential backoff with jitter.
//!
//! # Usage
//!
//! ```ignore
//! use bypass_relay::bot::resilient::{send_html, edit_html_safe};
//!
//! let msg = send_html(&bot, chat_id, Some(reply_to), "<i>Processing 1 link(s)...</i>", None).await?;
//! let edited = edit_html_safe(&bot, chat_id, msg.id, &text, keyboard).await;
//! ```

use crate::utils::{cap_message, retry_telegram_operation};
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, Message, MessageId, ParseMode, ReplyParameters};
use tracing::{debug, warn};

const ERROR_NOT_MODIFIED: &str = "message is not modified";
const ERROR_NOT_FOUND: &str = "message to edit not found";

/// Send an HTML message with automatic retry on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    reply_to: Option<MessageId>,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<Message> {
    let text = cap_message(text);
    retry_telegram_operation(|| async {
        let mut req = bot
            .send_message(chat_id, text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(id) = reply_to {
            req = req.reply_parameters(ReplyParameters::new(id).allow_sending_without_reply());
        }
        if let Some(kb) = markup.clone() {
            req = req.reply_markup(kb);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Edit a message to HTML text with automatic retry on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn edit_html(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<Message> {
    let text = cap_message(text);
    retry_telegram_operation(|| async {
        let mut req = bot
            .edit_message_text(chat_id, msg_id, text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(kb) = markup.clone() {
            req = req.reply_markup(kb);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram edit error: {e}"))
    })
    .await
}

/// Edit with graceful degradation.
///
/// "Not modified" and "not found" answers are expected (double taps on a
/// navigation button, deleted placeholders) and only logged at debug level.
///
/// # Returns
///
/// `true` if the message was edited.
pub async fn edit_html_safe(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> bool {
    match edit_html(bot, chat_id, msg_id, text, markup).await {
        Ok(_) => true,
        Err(e) => {
            let err_msg = e.to_string();
            if is_benign_edit_error(&err_msg) {
                debug!("Message update skipped: {err_msg}");
            } else {
                warn!("Failed to edit message after retries: {e}");
            }
            false
        }
    }
}

fn is_benign_edit_error(message: &str) -> bool {
    message.contains(ERROR_NOT_MODIFIED) || message.contains(ERROR_NOT_FOUND)
}
