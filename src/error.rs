//! Error types for the PDF writer.
//!
//! This module defines all error types that can occur while building,
//! transforming and flushing PDF objects.

use crate::object::ObjectRef;

/// Result type alias for PDF writer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF generation.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Write or mutation attempted on an object that is no longer open
    #[error("Invalid state: object {object} is {state}")]
    InvalidState {
        /// Object the call was addressed to
        object: ObjectRef,
        /// Lifecycle state the object was in
        state: &'static str,
    },

    /// Allocation attempted after the trailer was written
    #[error("Document is sealed: no objects can be allocated after the trailer")]
    DocumentSealed,

    /// Two structure elements claimed the same marked-content identifier
    #[error("Marked content {mcid} on page {page} is already claimed")]
    DuplicateMarkedContent {
        /// Page index
        page: usize,
        /// Marked-content identifier
        mcid: u32,
    },

    /// A marked-content identifier on a page has no owning structure element
    #[error("Marked content {mcid} on page {page} has no structure element")]
    MissingMarkedContent {
        /// Page index
        page: usize,
        /// Marked-content identifier
        mcid: u32,
    },

    /// Compression or encryption of a stream body failed
    #[error("Pipeline failure for object {object}: {reason}")]
    PipelineFailure {
        /// Object whose stream could not be transformed
        object: ObjectRef,
        /// Reason reported by the codec or cipher
        reason: String,
    },

    /// Handle does not name an allocated object
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectRef),

    /// Document end was requested while objects were never finalized
    #[error("Objects never finalized: {0:?}")]
    UnflushedObjects(Vec<u32>),

    /// Page index does not name a page of the document
    #[error("Unknown page: {0}")]
    UnknownPage(usize),

    /// Drawing operation issued while no page is open
    #[error("No page is open")]
    NoCurrentPage,

    /// Marked-content sequences cannot be nested
    #[error("Marked content sequences cannot be nested")]
    NestedMarkedContent,

    /// Handle is an object but not a structure element
    #[error("Object {0} is not a structure element")]
    NotAStructureElement(ObjectRef),

    /// Incoherent document configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Encryption setup error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// An earlier sink failure left the writer unusable
    #[error("Writer failed: {0}")]
    WriterFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_error() {
        let err = Error::InvalidState {
            object: ObjectRef::new(7, 0),
            state: "flushed",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("7 0 R"));
        assert!(msg.contains("flushed"));
    }

    #[test]
    fn test_duplicate_marked_content_error() {
        let err = Error::DuplicateMarkedContent { page: 0, mcid: 3 };
        let msg = format!("{}", err);
        assert!(msg.contains("Marked content 3"));
        assert!(msg.contains("page 0"));
    }

    #[test]
    fn test_unflushed_objects_error() {
        let err = Error::UnflushedObjects(vec![4, 9]);
        assert!(format!("{}", err).contains("[4, 9]"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
