//! Error types for the PDF object model

use std::io;
use thiserror::Error;

/// Main error type for object model operations
///
/// Only the fatal class of failures is reported through this type. Reads
/// that merely find the wrong kind of object return documented defaults
/// instead.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Operation applied to the wrong kind of object
    #[error("Invalid object type: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Index outside the logical length of an array or dictionary
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange {
        index: usize,
        len: usize,
    },

    /// Object number outside the range permitted by the file format
    #[error("Object number out of range: {0}")]
    ObjectNumberOutOfRange(i64),

    /// A traversal reached an object it was already visiting
    #[error("Cycle detected in object graph")]
    CycleDetected,

    /// A traversal nested deeper than the configured limit
    #[error("Recursion limit of {0} exceeded")]
    RecursionLimit(usize),

    /// Caller-provided output buffer cannot hold the serialization
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
    },

    /// Value bound to a different document than its new container
    #[error("Container and item belong to different documents")]
    DocumentMismatch,

    /// Malformed dictionary path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Malformed object syntax
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax {
        offset: usize,
        message: String,
    },

    /// Invalid key length
    #[error("Invalid key length: {0}")]
    InvalidKeyLength(usize),

    /// Invalid data length
    #[error("Invalid data length for {operation}")]
    InvalidDataLength {
        operation: String,
    },

    /// Cryptographic operation failed
    #[error("Cryptographic operation failed: {0}")]
    Crypt(String),

    /// Traversal cancelled through a cookie
    #[error("Operation aborted")]
    Aborted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for object model operations
pub type PdfResult<T> = Result<T, PdfError>;

impl PdfError {
    /// Create a new type mismatch error
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Create a new index error
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create a new syntax error
    pub fn syntax(offset: usize, msg: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: msg.into(),
        }
    }

    /// Create a new crypt error
    pub fn crypt(msg: impl Into<String>) -> Self {
        Self::Crypt(msg.into())
    }

    /// Create a new invalid data length error
    pub fn invalid_length(operation: impl Into<String>) -> Self {
        Self::InvalidDataLength {
            operation: operation.into(),
        }
    }

    /// Check if error comes from traversing a malformed graph
    pub fn is_graph_error(&self) -> bool {
        matches!(self, Self::CycleDetected | Self::RecursionLimit(_))
    }

    /// Check if error is cryptographic
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::Crypt(_) | Self::InvalidKeyLength(_) | Self::InvalidDataLength { .. }
        )
    }

    /// Check if error is related to object structure
    pub fn is_structure_error(&self) -> bool {
        matches!(
            self,
            Self::TypeMismatch { .. }
                | Self::IndexOutOfRange { .. }
                | Self::ObjectNumberOutOfRange(_)
                | Self::InvalidPath(_)
                | Self::DocumentMismatch
                | Self::Syntax { .. }
        )
    }
}

impl From<aes::cipher::InvalidLength> for PdfError {
    fn from(err: aes::cipher::InvalidLength) -> Self {
        Self::Crypt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PdfError::syntax(12, "unexpected token");
        assert!(matches!(err, PdfError::Syntax { offset: 12, .. }));

        let err = PdfError::crypt("key schedule failed");
        assert!(matches!(err, PdfError::Crypt(_)));

        let err = PdfError::invalid_length("AES encryption");
        assert!(matches!(err, PdfError::InvalidDataLength { .. }));
    }

    #[test]
    fn test_error_categorization() {
        let graph = PdfError::CycleDetected;
        assert!(graph.is_graph_error());
        assert!(!graph.is_structure_error());

        let crypto = PdfError::InvalidKeyLength(3);
        assert!(crypto.is_crypto_error());
        assert!(!crypto.is_graph_error());

        let structure = PdfError::index_out_of_range(4, 2);
        assert!(structure.is_structure_error());
        assert!(!structure.is_crypto_error());
    }

    #[test]
    fn test_error_display() {
        let err = PdfError::type_mismatch("array", "dict");
        assert_eq!(err.to_string(), "Invalid object type: expected array, found dict");

        let err = PdfError::BufferTooSmall {
            needed: 10,
            available: 4,
        };
        assert_eq!(err.to_string(), "Buffer too small: need 10 bytes, have 4");

        let err = PdfError::ObjectNumberOutOfRange(8388608);
        assert_eq!(err.to_string(), "Object number out of range: 8388608");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::WriteZero, "sink closed");
        let err: PdfError = io_err.into();
        assert!(matches!(err, PdfError::Io(_)));
    }
}
