//! Command and callback handlers.

use crate::bot::pagination::{
    clamp_page, page_count, parse_callback, CallbackAction, PaginationSession, SessionStore,
};
use crate::bot::resilient::{edit_html_safe, send_html};
use crate::bot::views::bypass::{
    keyboard, navigation_row, processing, render_bulk, render_error, render_page,
    render_single, render_variants, usage,
};
use crate::bot::views::help::{help_text, link_buttons};
use crate::bot::views::poster::render_poster;
use crate::config::{Settings, LINKS_PER_PAGE};
use crate::error::RelayError;
use crate::extract::{all_urls, first_url, MessageParts};
use crate::fetch::{BypassFetcher, PosterFetcher};
use crate::normalize::Normalized;
use crate::services::{normalize_alias, ServiceKind, ServiceRegistry};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId};
use tracing::{info, warn};

/// Generic failure shown when a handler errors unexpectedly.
pub const GENERIC_FAILURE: &str =
    "<b>Error:</b> <code>Something went wrong while bypassing the URL.</code>";

/// Where a command goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/start` or `/help`
    Help,
    /// A bypass alias, normalized
    Bypass(String),
    /// A poster alias, normalized
    Poster(String),
}

/// The bot's own username, fetched once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotUsername(pub String);

/// Maps a command token (`/GDF@my_bot`) to its route.
///
/// A command addressed to another bot (`/gdf@other_bot`) has no route.
#[must_use]
pub fn route(registry: &ServiceRegistry, token: &str, bot_username: &str) -> Option<Route> {
    if !token.starts_with('/') {
        return None;
    }
    if let Some((_, target)) = token.split_once('@') {
        if !target.eq_ignore_ascii_case(bot_username) {
            return None;
        }
    }
    let alias = normalize_alias(token);
    if matches!(alias.as_str(), "start" | "help") {
        return Some(Route::Help);
    }
    match registry.resolve(&alias)?.kind {
        ServiceKind::Bypass => Some(Route::Bypass(alias)),
        ServiceKind::Poster => Some(Route::Poster(alias)),
    }
}

/// Only private chats, groups and supergroups are served.
#[must_use]
pub fn is_supported_chat(msg: &Message) -> bool {
    msg.chat.is_private() || msg.chat.is_group() || msg.chat.is_supergroup()
}

fn footer_row(settings: &Settings) -> Vec<teloxide::types::InlineKeyboardButton> {
    link_buttons(settings.updates_url.as_deref(), settings.repo_url.as_deref())
}

/// Text and keyboard for `page` of a paginated session.
fn page_view(
    settings: &Settings,
    session_id: &str,
    session: &PaginationSession,
    page: usize,
) -> (String, Option<InlineKeyboardMarkup>) {
    let total = session.result.links.len();
    let page = clamp_page(page, page_count(total));
    let text = render_page(
        &settings.bypass_template,
        &session.result,
        &session.original_url,
        page,
    );
    let markup = keyboard(vec![
        navigation_row(session_id, page, total),
        footer_row(settings),
    ]);
    (text, markup)
}

/// Handles any text/caption message that starts with a known command.
///
/// # Errors
///
/// Returns an error if a Telegram request fails after retries.
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    settings: Arc<Settings>,
    bypass: Arc<BypassFetcher>,
    poster: Arc<PosterFetcher>,
    sessions: Arc<SessionStore>,
    bot_username: Arc<BotUsername>,
) -> Result<()> {
    if !is_supported_chat(&msg) {
        return Ok(());
    }
    let parts = MessageParts::from_message(&msg);
    let Some(token) = parts.command.first() else {
        return Ok(());
    };
    let Some(route) = route(bypass.registry(), token, &bot_username.0) else {
        return Ok(());
    };

    match route {
        Route::Help => {
            let markup = keyboard(vec![footer_row(&settings)]);
            send_html(&bot, msg.chat.id, Some(msg.id), &help_text(bypass.registry()), markup)
                .await?;
            Ok(())
        }
        Route::Bypass(alias) => {
            handle_bypass(&bot, &msg, &parts, &alias, &settings, &bypass, &sessions).await
        }
        Route::Poster(alias) => handle_poster(&bot, &msg, &parts, &alias, &poster).await,
    }
}

async fn handle_bypass(
    bot: &Bot,
    msg: &Message,
    parts: &MessageParts,
    alias: &str,
    settings: &Settings,
    bypass: &BypassFetcher,
    sessions: &SessionStore,
) -> Result<()> {
    let urls = all_urls(parts);
    if urls.is_empty() {
        send_html(bot, msg.chat.id, Some(msg.id), &usage(alias), None).await?;
        return Ok(());
    }

    let wait = send_html(bot, msg.chat.id, Some(msg.id), &processing(urls.len()), None).await?;
    let (text, markup) = if urls.len() > 1 {
        info!("Bulk request with {} links from chat {}", urls.len(), msg.chat.id);
        match bypass.fetch_bulk(&urls).await {
            Ok(result) => (render_bulk(&result), None),
            Err(e) => (render_error(&e), None),
        }
    } else {
        let target = &urls[0];
        match bypass.fetch(alias, target).await {
            Ok(result) => single_view(settings, sessions, result, target).await,
            Err(e) => (render_error(&e), None),
        }
    };

    edit_or_send(bot, msg, wait.id, &text, markup).await
}

async fn single_view(
    settings: &Settings,
    sessions: &SessionStore,
    result: Normalized,
    original_url: &str,
) -> (String, Option<InlineKeyboardMarkup>) {
    match result {
        Normalized::Single(result) if result.links.len() > LINKS_PER_PAGE => {
            let session = PaginationSession {
                result,
                original_url: original_url.to_string(),
            };
            let id = sessions.create(session.clone()).await;
            page_view(settings, &id, &session, 1)
        }
        Normalized::Single(result) => (
            render_single(&settings.bypass_template, &result, original_url),
            keyboard(vec![footer_row(settings)]),
        ),
        many @ Normalized::Many(_) => (
            render_variants(&many.flatten(), original_url),
            keyboard(vec![footer_row(settings)]),
        ),
    }
}

async fn handle_poster(
    bot: &Bot,
    msg: &Message,
    parts: &MessageParts,
    alias: &str,
    poster: &PosterFetcher,
) -> Result<()> {
    let Some(target) = first_url(parts) else {
        send_html(bot, msg.chat.id, Some(msg.id), &usage(alias), None).await?;
        return Ok(());
    };

    let wait = send_html(bot, msg.chat.id, Some(msg.id), &processing(1), None).await?;
    let text = match poster.fetch(alias, &target).await {
        Ok(info) => render_poster(&info),
        Err(e) => render_error(&e),
    };
    edit_or_send(bot, msg, wait.id, &text, None).await
}

/// Replaces the placeholder; falls back to a fresh message if the edit fails.
async fn edit_or_send(
    bot: &Bot,
    msg: &Message,
    placeholder: MessageId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    if !edit_html_safe(bot, msg.chat.id, placeholder, text, markup.clone()).await {
        send_html(bot, msg.chat.id, Some(msg.id), text, markup).await?;
    }
    Ok(())
}

/// Sends the generic failure reply after an unexpected handler error.
pub async fn report_failure(bot: &Bot, msg: &Message) {
    if let Err(e) = send_html(bot, msg.chat.id, Some(msg.id), GENERIC_FAILURE, None).await {
        warn!("Failed to report handler error to chat {}: {e}", msg.chat.id);
    }
}

/// How a pagination callback is answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackReply {
    /// Acknowledge without changing anything
    Ack,
    /// Acknowledge with an alert
    Alert(String),
    /// Acknowledge, then show `page` of the session
    Show {
        /// Session id
        session: String,
        /// Stored result
        state: Arc<PaginationSession>,
        /// Requested page, unclamped
        page: usize,
    },
}

/// Decides the answer to callback `data`; `None` for foreign callback data.
///
/// # Errors
///
/// Returns any session store error other than an expired session.
pub async fn callback_reply(
    data: Option<&str>,
    sessions: &SessionStore,
) -> Result<Option<CallbackReply>, RelayError> {
    let Some(action) = data.and_then(parse_callback) else {
        return Ok(None);
    };
    let CallbackAction::Page { session, page } = action else {
        return Ok(Some(CallbackReply::Ack));
    };
    match sessions.get(&session).await {
        Ok(state) => Ok(Some(CallbackReply::Show {
            session,
            state,
            page,
        })),
        Err(e @ RelayError::SessionNotFound(_)) => Ok(Some(CallbackReply::Alert(e.to_string()))),
        Err(e) => Err(e),
    }
}

/// Handles pagination callbacks (`bp_page_<id>_<n>`, `bp_noop`).
///
/// # Errors
///
/// Returns an error if the callback has no message to edit.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    settings: Arc<Settings>,
    sessions: Arc<SessionStore>,
) -> Result<()> {
    let Some(reply) = callback_reply(q.data.as_deref(), &sessions).await? else {
        return Ok(());
    };

    let (session, state, page) = match reply {
        CallbackReply::Ack => {
            let _ = bot.answer_callback_query(q.id.clone()).await;
            return Ok(());
        }
        CallbackReply::Alert(text) => {
            let _ = bot
                .answer_callback_query(q.id.clone())
                .text(text)
                .show_alert(true)
                .await;
            return Ok(());
        }
        CallbackReply::Show {
            session,
            state,
            page,
        } => (session, state, page),
    };
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let message = q
        .message
        .as_ref()
        .ok_or_else(|| anyhow!("Callback message missing"))?;
    let (text, markup) = page_view(&settings, &session, &state, page);
    edit_html_safe(&bot, message.chat().id, message.id(), &text, markup).await;
    Ok(())
}
