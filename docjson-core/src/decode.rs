//! Human-readable JSON decoding of documents.
//!
//! Decoding parses JSON text into a plain nested structure, rebuilds the
//! storage representation through the schema-directed hook in
//! [`crate::convert`], drops fields flagged exclude-on-decode, normalizes
//! reference fields back into the identifier form the mapping layer expects,
//! and finally reconstructs the document instance.
//!
//! A reference field may arrive in three shapes: a bare identifier, an inline
//! mapping carrying an `id` key (extra keys are silently dropped), or a list
//! mixing both. Normalization treats list elements independently, preserving
//! order and length.

use bson::{Bson, Document as BsonDocument, Uuid as BsonUuid, oid::ObjectId};
use serde_json::Value;

use crate::{
    convert::storage_from_json,
    document::JsonDocument,
    error::{DocJsonError, DocJsonResult},
    schema::{FieldClass, ScalarKind, Schema, classify},
};

/// Decodes one document from JSON text.
///
/// The `created` flag is forwarded to
/// [`from_storage`](JsonDocument::from_storage); its semantics (freshly
/// inserted versus loaded existing) belong to the mapping layer.
///
/// # Errors
///
/// Returns [`DocJsonError::MalformedJson`] for unparseable text; conversion
/// and reconstruction failures propagate as-is.
pub fn decode<D: JsonDocument>(text: &str, created: bool) -> DocJsonResult<D> {
    let parsed: Value =
        serde_json::from_str(text).map_err(|e| DocJsonError::MalformedJson(e.to_string()))?;
    decode_value(&parsed, created)
}

/// Decodes one document from an already parsed JSON value.
pub fn decode_value<D: JsonDocument>(value: &Value, created: bool) -> DocJsonResult<D> {
    let schema = D::schema();
    let mut doc = storage_from_json(schema, value)?;
    for field in schema.fields {
        if field.exclude.on_decode() {
            doc.remove(field.name);
        }
    }
    normalize_references(schema, &mut doc)?;
    D::from_storage(doc, created)
}

/// Decodes a JSON array of documents, applying the same rules per element.
pub fn decode_many<D: JsonDocument>(text: &str, created: bool) -> DocJsonResult<Vec<D>> {
    let parsed: Value =
        serde_json::from_str(text).map_err(|e| DocJsonError::MalformedJson(e.to_string()))?;
    let items = parsed.as_array().ok_or_else(|| {
        DocJsonError::MalformedJson(format!("expected a JSON array, got {parsed}"))
    })?;
    items
        .iter()
        .map(|item| decode_value(item, created))
        .collect()
}

/// Rewrites every reference field of `doc` into bare-identifier form.
///
/// Follow-reference fields are left alone, mirroring their exemption on the
/// encode side.
fn normalize_references(schema: &'static Schema, doc: &mut BsonDocument) -> DocJsonResult<()> {
    for field in schema.fields {
        let target = match classify(&field.kind) {
            FieldClass::ReferenceSingle(target) | FieldClass::ReferenceList(target) => target,
            _ => continue,
        };
        let Some(raw) = doc.get(field.name).cloned() else {
            continue;
        };
        let id_kind = target().id_scalar_kind();
        let normalized = match raw {
            Bson::Array(items) => Bson::Array(
                items
                    .iter()
                    .map(|item| normalize_one(field.name, id_kind, item))
                    .collect::<DocJsonResult<Vec<_>>>()?,
            ),
            other => normalize_one(field.name, id_kind, &other)?,
        };
        doc.insert(field.name, normalized);
    }
    Ok(())
}

fn normalize_one(field: &str, id_kind: ScalarKind, raw: &Bson) -> DocJsonResult<Bson> {
    match raw {
        Bson::Null => Ok(Bson::Null),
        // Inline mapping: extract the identifier, dropping every other key.
        Bson::Document(inline) => {
            let id = inline
                .get("id")
                .or_else(|| inline.get("_id"))
                .cloned()
                .unwrap_or(Bson::Null);
            normalize_one(field, id_kind, &id)
        }
        other => id_to_storage(field, id_kind, other),
    }
}

/// Converts a bare identifier value with the target's identifier kind.
///
/// An empty string counts as absent and normalizes to null.
fn id_to_storage(field: &str, id_kind: ScalarKind, raw: &Bson) -> DocJsonResult<Bson> {
    let invalid = |reason: String| DocJsonError::InvalidField(field.to_string(), reason);
    match raw {
        Bson::String(s) if s.is_empty() => Ok(Bson::Null),
        Bson::String(s) => match id_kind {
            ScalarKind::ObjectId => Ok(Bson::ObjectId(
                ObjectId::parse_str(s).map_err(|e| invalid(e.to_string()))?,
            )),
            ScalarKind::Uuid => Ok(Bson::from(
                BsonUuid::parse_str(s).map_err(|e| invalid(e.to_string()))?,
            )),
            _ => Ok(raw.clone()),
        },
        _ => Ok(raw.clone()),
    }
}
