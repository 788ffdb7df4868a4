//! Link pagination for long bypass results.
//!
//! A result with more than [`LINKS_PER_PAGE`] links is stored under a fresh
//! session id; navigation callbacks carry that id and a 1-based page number.

use crate::config::LINKS_PER_PAGE;
use crate::error::RelayError;
use crate::normalize::NormalizedResult;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Prefix of page navigation callback data: `bp_page_<session>_<page>`
pub const PAGE_CALLBACK_PREFIX: &str = "bp_page_";
/// Callback data of the inert page indicator button
pub const NOOP_CALLBACK: &str = "bp_noop";

/// A paginated result kept for navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSession {
    /// The normalized result being paged
    pub result: NormalizedResult,
    /// URL the user submitted
    pub original_url: String,
}

/// What a callback query asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Show `page` of `session`
    Page {
        /// Session id
        session: String,
        /// Requested page, unclamped
        page: usize,
    },
    /// The page indicator was pressed
    Noop,
}

/// Number of pages needed for `total` links (at least one).
#[must_use]
pub const fn page_count(total: usize) -> usize {
    if total == 0 {
        1
    } else {
        total.div_ceil(LINKS_PER_PAGE)
    }
}

/// Clamps a requested page into `[1, total_pages]`.
#[must_use]
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Start offset and length of a (clamped) page.
#[must_use]
pub fn page_bounds(page: usize, total: usize) -> (usize, usize) {
    let page = clamp_page(page, page_count(total));
    let start = (page - 1) * LINKS_PER_PAGE;
    (start, LINKS_PER_PAGE.min(total.saturating_sub(start)))
}

/// Builds the callback data for `page` of `session`.
#[must_use]
pub fn page_callback(session: &str, page: usize) -> String {
    format!("{PAGE_CALLBACK_PREFIX}{session}_{page}")
}

/// Parses callback data produced by [`page_callback`] or [`NOOP_CALLBACK`].
///
/// # Examples
///
/// ```
/// use bypass_relay::bot::pagination::{parse_callback, CallbackAction};
///
/// assert_eq!(
///     parse_callback("bp_page_abc_2"),
///     Some(CallbackAction::Page { session: "abc".into(), page: 2 })
/// );
/// assert_eq!(parse_callback("bp_noop"), Some(CallbackAction::Noop));
/// assert_eq!(parse_callback("other"), None);
/// ```
#[must_use]
pub fn parse_callback(data: &str) -> Option<CallbackAction> {
    if data == NOOP_CALLBACK {
        return Some(CallbackAction::Noop);
    }
    let rest = data.strip_prefix(PAGE_CALLBACK_PREFIX)?;
    let (session, page) = rest.rsplit_once('_')?;
    if session.is_empty() {
        return None;
    }
    Some(CallbackAction::Page {
        session: session.to_string(),
        page: page.parse().ok()?,
    })
}

/// Bounded, expiring store of pagination sessions
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, Arc<PaginationSession>>,
}

impl SessionStore {
    /// Creates a store holding at most `max_capacity` sessions for `ttl` each.
    #[must_use]
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { sessions }
    }

    /// Stores `session` under a new id and returns the id.
    pub async fn create(&self, session: PaginationSession) -> String {
        let id = Uuid::new_v4().simple().to_string();
        debug!(
            "Pagination session {id}: {} links",
            session.result.links.len()
        );
        self.sessions.insert(id.clone(), Arc::new(session)).await;
        id
    }

    /// Looks a session up.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::SessionNotFound` when the id is unknown or expired.
    pub async fn get(&self, id: &str) -> Result<Arc<PaginationSession>, RelayError> {
        self.sessions
            .get(id)
            .await
            .ok_or_else(|| RelayError::SessionNotFound(id.to_string()))
    }
}
