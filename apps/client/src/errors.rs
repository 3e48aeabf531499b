use thiserror::Error;

/// Lifecycle-level error type.
/// Every variant converts to a `Notice` so the embedding page can surface it
/// as a toast without inspecting the variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid resume: {0}")]
    InvalidDocument(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Server error (status {status}): {detail}")]
    ServerError { status: u16, detail: String },

    #[error("Failed to decode response: {0}")]
    DecodeFailure(String),
}

/// Severity of a user-visible notice. Drives toast styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A short user-visible message (title + description) emitted by the
/// controller on every terminal event. Delivery mechanics (toasts) live in
/// the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Error,
            title: title.into(),
            description: description.into(),
        }
    }
}

impl LifecycleError {
    /// Maps the error to the notice shown to the user. Only the wording
    /// differs between variants; the caller treats all of them uniformly.
    pub fn notice(&self) -> Notice {
        let (title, description) = match self {
            LifecycleError::MissingInput(msg) => ("Missing input", msg.clone()),
            LifecycleError::InvalidDocument(msg) => ("Invalid resume", msg.clone()),
            LifecycleError::NetworkFailure(msg) => {
                tracing::error!("Network failure: {msg}");
                (
                    "Connection failed",
                    "Could not reach the generation service. Check your connection and try again."
                        .to_string(),
                )
            }
            LifecycleError::Timeout(secs) => (
                "Generation timed out",
                format!("The server did not respond within {secs} seconds. Please try again."),
            ),
            LifecycleError::ServerError { status, detail } => {
                tracing::error!("Server error {status}: {detail}");
                ("Generation failed", detail.clone())
            }
            LifecycleError::DecodeFailure(msg) => {
                tracing::error!("Decode failure: {msg}");
                (
                    "Unexpected response",
                    "The server returned a response we could not read.".to_string(),
                )
            }
        };

        Notice::error(title, description)
    }
}
