//! Telegram message texts and keyboards.

/// Bypass results, bulk output, errors and navigation
pub mod bypass;
/// Help text and link buttons
pub mod help;
/// Poster results
pub mod poster;
