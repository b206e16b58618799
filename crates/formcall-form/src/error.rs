//! Error types for the form core.

use formcall_types::FormField;

/// Errors raised by the form store, the update listener and tool dispatch.
///
/// None of these are fatal to a session: listener errors are logged and
/// discarded, tool errors are reported back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Inbound payload bytes are not valid UTF-8.
    #[error("update payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Inbound payload is not a `{"field", "value"}` object.
    #[error("malformed update payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload named a field selector we do not collect.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// An empty value was supplied for a field.
    #[error("empty value for field: {0}")]
    EmptyValue(FormField),

    /// The state snapshot could not be encoded for broadcast.
    #[error("failed to encode state snapshot: {0}")]
    Snapshot(String),

    /// No tool is registered under this name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A tool was called with missing or mistyped arguments.
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
}

/// Errors reported by a [`crate::StatePublisher`].
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The publisher has left the room.
    #[error("publisher is not connected")]
    NotConnected,

    /// The underlying transport refused the packet.
    #[error("data channel error: {0}")]
    Transport(String),
}
