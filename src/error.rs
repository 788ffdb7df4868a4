//! Error taxonomy shared by the fetchers and the Telegram handlers.

use thiserror::Error;

/// Coarse classification of a [`RelayError`], used to decide retry and
/// reporting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input: missing/invalid URL, unknown alias.
    Input,
    /// Connection failure or timeout while talking to an upstream.
    Transport,
    /// Upstream answered, but with something unusable.
    Protocol,
    /// A pagination callback referenced a session that no longer exists.
    SessionNotFound,
    /// Anything unexpected inside the bot itself.
    Internal,
}

/// Errors produced while relaying a link to an upstream service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// The command alias does not map to any known service
    #[error("Unknown platform for this command.")]
    UnknownService(String),
    /// The service exists but has no endpoint configured
    #[error("Bypass endpoint not configured for this service.")]
    EndpointNotConfigured(String),
    /// The submitted URL is not an absolute http(s) URL
    #[error("Invalid URL.")]
    InvalidUrl(String),
    /// The URL is well-formed but does not fit what the service expects
    #[error("{0}")]
    InvalidInput(String),
    /// Bulk submission contained invalid entries
    #[error("{0} invalid URL(s) in the batch.")]
    InvalidBatch(usize),
    /// Connection-level failure
    #[error("Failed to reach the service: {0}")]
    Network(String),
    /// The request did not complete in time
    #[error("Request timeout. The service might be slow or unavailable.")]
    Timeout,
    /// Upstream returned a non-200 status
    #[error("Service error (HTTP {0})")]
    Status(u16),
    /// Upstream body was not JSON
    #[error("Invalid response from the service.")]
    InvalidJson(String),
    /// Upstream JSON had an unusable top-level shape
    #[error("Unexpected response from the service.")]
    UnexpectedResponse,
    /// Upstream explicitly reported failure (`{"success": false}`)
    #[error("{0}")]
    Rejected(String),
    /// Transfer.it answered without a download URL
    #[error("File Expired or File Not Found")]
    FileExpired,
    /// Pagination session is gone
    #[error("Session expired. Please send the link again.")]
    SessionNotFound(String),
    /// Unexpected internal failure
    #[error("Something went wrong while processing the request.")]
    Internal(String),
}

impl RelayError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownService(_)
            | Self::EndpointNotConfigured(_)
            | Self::InvalidUrl(_)
            | Self::InvalidInput(_)
            | Self::InvalidBatch(_) => ErrorKind::Input,
            Self::Network(_) | Self::Timeout => ErrorKind::Transport,
            Self::Status(_)
            | Self::InvalidJson(_)
            | Self::UnexpectedResponse
            | Self::Rejected(_)
            | Self::FileExpired => ErrorKind::Protocol,
            Self::SessionNotFound(_) => ErrorKind::SessionNotFound,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether a retry policy may repeat the failed call.
    ///
    /// Only transport failures qualify; a bad status or body will not change
    /// by asking again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport)
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(RelayError::InvalidUrl("x".into()).kind(), ErrorKind::Input);
        assert_eq!(RelayError::Timeout.kind(), ErrorKind::Transport);
        assert_eq!(RelayError::Status(502).kind(), ErrorKind::Protocol);
        assert_eq!(
            RelayError::SessionNotFound("abc".into()).kind(),
            ErrorKind::SessionNotFound
        );
    }

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(RelayError::Network("reset".into()).is_retryable());
        assert!(RelayError::Timeout.is_retryable());
        assert!(!RelayError::Status(500).is_retryable());
        assert!(!RelayError::InvalidJson("eof".into()).is_retryable());
        assert!(!RelayError::Rejected("expired".into()).is_retryable());
    }

    #[test]
    fn test_rejected_message_is_passed_through() {
        assert_eq!(RelayError::Rejected("expired".into()).to_string(), "expired");
        assert_eq!(RelayError::Status(404).to_string(), "Service error (HTTP 404)");
    }
}
