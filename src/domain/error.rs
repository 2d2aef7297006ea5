//! Domain error types for patchwise.
//!
//! These errors represent domain-level failures that callers are expected to
//! handle: invalid review operations, unavailable documents, malformed
//! payloads and protocol contract violations.

use thiserror::Error;

/// Errors surfaced by the diff apply engine and review controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("Block index {index} is out of range for {file_uri} ({len} pending blocks)")]
    InvalidBlockIndex {
        file_uri: String,
        index: usize,
        len: usize,
    },

    #[error("Diff for {0} is already resolved")]
    AlreadyResolved(String),

    #[error("Diff for {0} is still streaming")]
    StillStreaming(String),

    #[error("Diff for {0} has unresolved blocks awaiting review")]
    ReviewPending(String),

    #[error("No active diff for {0}")]
    NoActiveDiff(String),

    #[error("Document {0} is no longer available")]
    DocumentUnavailable(String),

    #[error("Document {0} does not match the original content of the stream")]
    OriginalMismatch(String),
}

/// Errors reported by a [`crate::infra::document::DocumentHost`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Document is not open: {0}")]
    NotOpen(String),

    #[error("Line range {start}+{len} is outside document {uri}")]
    OutOfRange { uri: String, start: usize, len: usize },
}

/// Structural validation failures for untrusted payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Expected a JSON object")]
    NotAnObject,

    #[error("Expected a JSON array")]
    NotAnArray,

    #[error("Missing required field `{0}`")]
    MissingField(String),

    #[error("Field `{field}` must be {expected}")]
    WrongKind {
        field: String,
        expected: &'static str,
    },

    #[error("Unexpected field `{0}`")]
    UnexpectedField(String),

    #[error("Invalid element {index} of `{field}`: {source}")]
    InvalidElement {
        field: String,
        index: usize,
        #[source]
        source: Box<ShapeError>,
    },

    #[error("Invalid entry `{key}` of `{field}`: {source}")]
    InvalidEntry {
        field: String,
        key: String,
        #[source]
        source: Box<ShapeError>,
    },

    #[error("Payload passed shape checks but could not be decoded: {0}")]
    Decode(String),
}

/// Errors raised while decoding a synchronization message envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Payload for {message_type} does not match its shape: {source}")]
    PayloadMismatch {
        message_type: String,
        #[source]
        source: serde_json::Error,
    },
}
