/// Crate-wide result alias.
pub type BadgeResult<T> = Result<T, BadgeError>;

/// Error taxonomy for composition, encoding and dispatch.
///
/// Layer fetch and encoding errors are normally recovered inside the compositor; they only
/// surface when callers use the fetch/encode building blocks directly. `Transport` is the single
/// fatal outcome of a batch dispatch attempt.
#[derive(thiserror::Error, Debug)]
pub enum BadgeError {
    /// Invalid input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image reference could not be fetched or decoded.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The verification mark or an output image could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// A layer could not be painted.
    #[error("render error: {0}")]
    Render(String),

    /// The dispatch request itself failed. No recipient was marked delivered.
    #[error("transport error: {message}")]
    Transport {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Reason surfaced to the operator.
        message: String,
    },

    /// An action was requested before the session reached the required phase.
    #[error("not ready: {0}")]
    NotReady(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else, with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BadgeError {
    /// Build a [`BadgeError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BadgeError::Fetch`].
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`BadgeError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`BadgeError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`BadgeError::Transport`].
    pub fn transport(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: msg.into(),
        }
    }

    /// Build a [`BadgeError::NotReady`].
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    /// Build a [`BadgeError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for a failed dispatch call (as opposed to per-recipient failures).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<serde_json::Error> for BadgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
