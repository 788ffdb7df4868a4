/// Command and callback handlers
pub mod handlers;
/// Pagination sessions for long link lists
pub mod pagination;
/// Telegram sends/edits with retry
pub mod resilient;
/// Message texts and keyboards
pub mod views;
