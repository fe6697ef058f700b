//! Human-readable JSON serialization, deserialization, and pagination for
//! document-mapped data.
//!
//! This crate is the core of the docjson project and provides:
//!
//! - **Schema model** ([`schema`]) - Declared field layouts, the reference
//!   classifier, and per-field exclusion policies
//! - **Document traits** ([`document`]) - The contract documents and the
//!   external mapping layer implement
//! - **Annotations** ([`annotate`]) - Transient per-pass serialization marks
//! - **Encoder** ([`encode`]) - JSON encoding with optional recursive
//!   reference-following up to a depth bound
//! - **Decoder** ([`decode`]) - JSON decoding with reference normalization
//! - **Value conversion** ([`convert`]) - Human-readable BSON⇄JSON transcoding
//! - **Pagination** ([`page`]) - Result-set and array-field pagination
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docjson_core::{
//!     document::JsonDocument,
//!     encode::{encode, EncodeOptions},
//!     schema::{FieldKind, FieldSpec, ScalarKind, Schema},
//! };
//! use bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(rename = "_id")]
//!     pub id: ObjectId,
//!     pub name: String,
//! }
//!
//! impl JsonDocument for User {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: Schema = Schema {
//!             collection: "users",
//!             fields: &[
//!                 FieldSpec::new("id", FieldKind::Scalar(ScalarKind::ObjectId)),
//!                 FieldSpec::new("name", FieldKind::Scalar(ScalarKind::String)),
//!             ],
//!         };
//!         &SCHEMA
//!     }
//! }
//!
//! let user = User { id: ObjectId::new(), name: "Alice".to_string() };
//! let json = encode(&user, EncodeOptions::default())?;
//! # Ok::<(), docjson_core::error::DocJsonError>(())
//! ```

pub mod annotate;
pub mod convert;
pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
pub mod page;
pub mod schema;
