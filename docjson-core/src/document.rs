//! Core traits for documents and the external document-mapping collaborator.
//!
//! This module defines the minimal contract a type must satisfy to go through
//! the human-readable JSON codec, as well as the [`DocumentLoader`] trait
//! through which referenced documents are resolved. The codec never talks to
//! a database itself; everything it needs from the persistence side goes
//! through these two traits.

use bson::{Bson, Document as BsonDocument, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DocJsonError, DocJsonResult},
    schema::Schema,
};

/// Contract for document types handled by the JSON codec.
///
/// A `JsonDocument` couples a serde-serializable record with a declared
/// [`Schema`] describing its wire-visible fields. The default
/// [`to_storage`](JsonDocument::to_storage) and
/// [`from_storage`](JsonDocument::from_storage) implementations go through
/// BSON serde serialization; implement them manually when the storage
/// representation differs from the serde view of the struct.
///
/// # Identifier naming
///
/// Storage representations carry the identifier under the key `_id`
/// (annotate the struct field with `#[serde(rename = "_id")]`), while the
/// wire format always exposes it under the public key `id`; the codec renames
/// between the two.
///
/// # Example
///
/// ```ignore
/// use docjson::{JsonDocument, Schema, FieldSpec, FieldKind, ScalarKind};
/// use bson::oid::ObjectId;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(rename = "_id")]
///     pub id: ObjectId,
///     pub name: String,
/// }
///
/// impl JsonDocument for User {
///     fn schema() -> &'static Schema {
///         static SCHEMA: Schema = Schema {
///             collection: "users",
///             fields: &[
///                 FieldSpec::new("id", FieldKind::Scalar(ScalarKind::ObjectId)),
///                 FieldSpec::new("name", FieldKind::Scalar(ScalarKind::String)),
///             ],
///         };
///         &SCHEMA
///     }
/// }
/// ```
pub trait JsonDocument:
    Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static
{
    /// Returns the declared field layout of this document type.
    fn schema() -> &'static Schema;

    /// Returns the name of the collection this document type belongs to.
    fn collection_name() -> &'static str {
        Self::schema().collection
    }

    /// Converts this document into its storage representation.
    ///
    /// When `use_storage_field_names` is `false` the identifier is exposed
    /// under its public name `id` instead of the storage key `_id`; mapping
    /// layers with richer field-name aliasing can override this method.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the document does not
    /// serialize to a mapping.
    fn to_storage(&self, use_storage_field_names: bool) -> DocJsonResult<BsonDocument> {
        let bson = serialize_to_bson(self)?;
        let mut doc = match bson {
            Bson::Document(doc) => doc,
            other => {
                return Err(DocJsonError::Serialization(format!(
                    "document serialized to non-mapping BSON value: {other}"
                )));
            }
        };
        if !use_storage_field_names {
            if let Some(id) = doc.remove("_id") {
                doc.insert("id", id);
            }
        }
        Ok(doc)
    }

    /// Reconstructs a document instance from its storage representation.
    ///
    /// The `created` flag distinguishes freshly built instances from ones
    /// loaded from existing data; its semantics belong to the mapping layer,
    /// and the default serde-backed implementation ignores it.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the mapping is missing
    /// required fields.
    fn from_storage(doc: BsonDocument, _created: bool) -> DocJsonResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(doc))?)
    }
}

/// Blocking query collaborator used to resolve references and project field
/// slices.
///
/// Implementations sit in front of whatever actually holds the documents (an
/// in-memory map, a database driver, a cache). All calls are synchronous; the
/// codec performs no retries and propagates every failure to its caller.
pub trait DocumentLoader {
    /// Loads the storage representation of one document by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DocJsonError::DocumentNotFound`] when no document with the
    /// given identifier exists in the collection.
    fn load_by_id(&self, collection: &str, id: &Bson) -> DocJsonResult<BsonDocument>;

    /// Loads one document with a single array field projected down to the
    /// sub-range `[start, start + limit)`, without materializing the whole
    /// array (the `$slice` projection of MongoDB-style stores).
    ///
    /// The returned document carries the sliced array under `field` and, when
    /// the store maintains one, a companion `<field>_count` value holding the
    /// full array length.
    ///
    /// # Errors
    ///
    /// Returns [`DocJsonError::DocumentNotFound`] when the document does not
    /// exist.
    fn load_field_slice(
        &self,
        collection: &str,
        id: &Bson,
        field: &str,
        start: usize,
        limit: usize,
    ) -> DocJsonResult<BsonDocument>;
}

impl<L: DocumentLoader + ?Sized> DocumentLoader for &L {
    fn load_by_id(&self, collection: &str, id: &Bson) -> DocJsonResult<BsonDocument> {
        (*self).load_by_id(collection, id)
    }

    fn load_field_slice(
        &self,
        collection: &str,
        id: &Bson,
        field: &str,
        start: usize,
        limit: usize,
    ) -> DocJsonResult<BsonDocument> {
        (*self).load_field_slice(collection, id, field, start, limit)
    }
}
