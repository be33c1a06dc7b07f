//! Error types for the live select controller.

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while attaching or driving a widget.
///
/// Only attaching is fallible; everything after that is tolerant and reports
/// anomalies through `tracing` instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The widget root is not part of the document.
    #[error("Widget root element is not in the document")]
    UnknownNode,

    /// The widget root has no `id`, so pushed events cannot be addressed to it.
    #[error("Widget root element has no id attribute")]
    MissingId,

    /// A pushed event payload could not be decoded.
    #[error("Invalid payload for '{event}' event: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a payload error.
    pub fn payload(event: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Payload {
            event: event.into(),
            source,
        }
    }
}
