//! Error types and result types for JSON codec and pagination operations.
//!
//! This module provides error handling for every fallible operation in the crate.
//! Use [`DocJsonResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors produced by the JSON codec and the pagination helpers.
///
/// This enum covers serialization errors, malformed input, reference resolution
/// failures propagated from a [`DocumentLoader`](crate::document::DocumentLoader),
/// and pagination range errors.
#[derive(Error, Debug)]
pub enum DocJsonError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The supplied JSON text could not be parsed.
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),
    /// A referenced document was not found during reference resolution.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// A field value could not be converted to or from its declared scalar kind.
    /// The first argument is the field name, the second describes the failure.
    #[error("Invalid value for field {0}: {1}")]
    InvalidField(String, String),
    /// Reference following was requested but no document loader is configured.
    /// The argument is the collection that would have been queried.
    #[error("No document loader configured to resolve references into {0}")]
    MissingLoader(String),
    /// The requested page number is invalid (pages are 1-indexed).
    #[error("Invalid page number: {0}")]
    InvalidPage(usize),
    /// The requested page is past the end of the result set.
    #[error("Page {0} is out of range")]
    PageOutOfRange(usize),
    /// An error occurred in the underlying document source.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for JSON codec and pagination operations.
///
/// This type alias is used throughout the crate to indicate operations that may fail
/// with a [`DocJsonError`].
pub type DocJsonResult<T> = Result<T, DocJsonError>;

impl From<BsonError> for DocJsonError {
    fn from(err: BsonError) -> Self {
        DocJsonError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocJsonError {
    fn from(err: SerdeJsonError) -> Self {
        DocJsonError::Serialization(err.to_string())
    }
}
