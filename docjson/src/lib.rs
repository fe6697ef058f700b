//! Human-readable JSON for document-mapped data.
//!
//! This crate is the primary entry point for users of the docjson project.
//! It re-exports the codec, schema model, and pagination helpers from
//! `docjson-core`, plus the in-memory document source from `docjson-memory`.
//!
//! # Features
//!
//! - **Human-readable JSON** - ObjectIds as hex strings, datetimes as
//!   RFC 3339 text, the identifier always under the public key `id`
//! - **Reference following** - Optionally inline referenced documents up to a
//!   depth bound, with a follow-reference escape hatch for cyclic graphs
//! - **Schema-directed decoding** - Parse JSON back into storage form,
//!   normalizing reference markers in either bare or inline shape
//! - **Pagination** - Result-set pages and `$slice`-projected array-field
//!   pages with adjacency metadata
//!
//! # Quick Start
//!
//! ```ignore
//! use docjson::prelude::*;
//! use docjson::memory::InMemoryLoader;
//! use bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Author {
//!     #[serde(rename = "_id")]
//!     pub id: ObjectId,
//!     pub name: String,
//! }
//!
//! impl JsonDocument for Author {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: Schema = Schema {
//!             collection: "authors",
//!             fields: &[
//!                 FieldSpec::new("id", FieldKind::Scalar(ScalarKind::ObjectId)),
//!                 FieldSpec::new("name", FieldKind::Scalar(ScalarKind::String)),
//!             ],
//!         };
//!         &SCHEMA
//!     }
//! }
//!
//! fn main() -> DocJsonResult<()> {
//!     let author = Author { id: ObjectId::new(), name: "Alice".into() };
//!
//!     // Encode: the storage identifier surfaces under the public key "id".
//!     let json = encode(&author, EncodeOptions::default())?;
//!
//!     // Decode: the same text reconstructs an equivalent instance.
//!     let back: Author = decode(&json, false)?;
//!     assert_eq!(back.id, author.id);
//!     Ok(())
//! }
//! ```
//!
//! # Reference following
//!
//! Referenced documents are emitted as bare identifiers by default. With a
//! [`DocumentLoader`](document::DocumentLoader) and
//! `EncodeOptions::default().following()`, the encoder inlines each referenced
//! document recursively, up to `max_depth` dereferences (embedded
//! sub-documents never count against the bound). Fields declared
//! `FieldKind::FollowReference` always stay identifiers, which is the
//! designed way to break reference cycles.

pub use docjson_core::{annotate, convert, decode, document, encode, error, page, schema};

// Re-export BSON types for convenience
pub use bson;

pub mod prelude;

/// In-memory document source implementation.
pub mod memory {
    pub use docjson_memory::InMemoryLoader;
}
