//! Error taxonomy for object downloads.
//!
//! Every failure of a fetch maps to exactly one [`DownloadError`] variant so
//! callers can decide on retries without inspecting message text.

use crate::transport::TransportError;

/// Error returned by [`crate::resolver::Resolver::fetch`].
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A request URL could not be formed (bad base URL or identifier).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection-level failure (refused, timeout, DNS, aborted transfer).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The terminal response had a non-2xx status.
    #[error("remote returned HTTP {status}{}", diagnostic(.body))]
    Remote { status: u32, body: String },

    /// The metadata document could not be read or parsed.
    #[error("decode error: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A well-formed response lacked a field the protocol requires.
    #[error("protocol error: {0}")]
    Protocol(String),
}

fn diagnostic(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

impl DownloadError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub(crate) fn decode(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Decode(Box::new(source))
    }

    /// HTTP status of a `Remote` error.
    pub fn status(&self) -> Option<u32> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Hint for callers that run their own retry policy: transport failures,
    /// throttling and 5xx responses may succeed later; everything else needs
    /// an operator or server fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Remote { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Configuration(_) | Self::Decode(_) | Self::Protocol(_) => false,
        }
    }
}
