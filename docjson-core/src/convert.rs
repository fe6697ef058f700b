//! Human-readable transcoding between BSON storage values and JSON values.
//!
//! The encode direction ([`bson_to_value`]) flattens BSON-specific types into
//! plain JSON: ObjectIds become hex strings, datetimes become RFC 3339 text
//! (or epoch milliseconds in epoch mode), binary blobs become base64
//! mappings, and so on. The decode direction ([`storage_from_json`]) is
//! schema-directed: each declared field is parsed back into its storage form
//! according to its [`ScalarKind`], embedded sub-documents recurse with their
//! own schemas, and reference markers are deliberately left untouched for the
//! decoder's normalization step.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bson::{
    Binary, Bson, DateTime as BsonDateTime, Document as BsonDocument, Uuid as BsonUuid,
    oid::ObjectId, spec::BinarySubtype,
};
use chrono::{DateTime as ChronoDateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value, json};

use crate::{
    error::{DocJsonError, DocJsonResult},
    schema::{FieldKind, ScalarKind, Schema},
};

/// Converts one BSON value into a JSON-safe value.
///
/// When `epoch_mode` is `true`, datetimes serialize as epoch milliseconds
/// instead of RFC 3339 strings.
pub fn bson_to_value(value: &Bson, epoch_mode: bool) -> DocJsonResult<Value> {
    let converted = match value {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(d) => Value::from(*d),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| bson_to_value(item, epoch_mode))
                .collect::<DocJsonResult<Vec<_>>>()?,
        ),
        Bson::Document(doc) => Value::Object(document_to_value(doc, epoch_mode)?),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => {
            if epoch_mode {
                Value::from(dt.timestamp_millis())
            } else {
                Value::String(
                    dt.try_to_rfc3339_string()
                        .map_err(|e| DocJsonError::Serialization(e.to_string()))?,
                )
            }
        }
        Bson::Binary(bin) => json!({
            "data": BASE64.encode(&bin.bytes),
            "type": u8::from(bin.subtype),
        }),
        Bson::RegularExpression(re) => {
            let mut out = Map::new();
            out.insert("regex".into(), Value::String(re.pattern.to_string()));
            if !re.options.is_empty() {
                out.insert("flags".into(), Value::String(re.options.to_string()));
            }
            Value::Object(out)
        }
        Bson::Timestamp(ts) => json!({ "time": ts.time, "inc": ts.increment }),
        Bson::MinKey => json!({ "minKey": true }),
        Bson::MaxKey => json!({ "maxKey": true }),
        Bson::JavaScriptCode(code) => json!({ "code": code }),
        Bson::JavaScriptCodeWithScope(cws) => json!({
            "code": cws.code,
            "scope": document_to_value(&cws.scope, epoch_mode)?,
        }),
        Bson::Decimal128(dec) => Value::String(dec.to_string()),
        // Symbol, DbPointer, Undefined: rare legacy types, serde fallback.
        other => serde_json::to_value(other)?,
    };
    Ok(converted)
}

/// Converts a BSON document into a JSON object, preserving key order.
pub fn document_to_value(doc: &BsonDocument, epoch_mode: bool) -> DocJsonResult<Map<String, Value>> {
    let mut out = Map::new();
    for (key, value) in doc {
        out.insert(key.clone(), bson_to_value(value, epoch_mode)?);
    }
    Ok(out)
}

/// Structurally converts a JSON value into BSON without schema knowledge.
///
/// Integers become `Int64`, other numbers become `Double`; objects and arrays
/// recurse. This is the fallback used for undeclared fields and
/// [`ScalarKind::Any`] values.
pub fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Bson::Int64(i)
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(obj) => {
            let mut doc = BsonDocument::new();
            for (key, val) in obj {
                doc.insert(key.clone(), json_to_bson(val));
            }
            Bson::Document(doc)
        }
    }
}

/// Parses one JSON scalar back into its declared BSON storage form.
///
/// `field` is only used for error reporting. Null is accepted for every kind.
pub fn scalar_to_bson(field: &str, kind: ScalarKind, value: &Value) -> DocJsonResult<Bson> {
    if value.is_null() {
        return Ok(Bson::Null);
    }
    let invalid = |reason: String| DocJsonError::InvalidField(field.to_string(), reason);
    match kind {
        ScalarKind::Any | ScalarKind::String | ScalarKind::Bool => Ok(json_to_bson(value)),
        ScalarKind::Int => match value.as_i64() {
            Some(i) => Ok(Bson::Int64(i)),
            None => Ok(json_to_bson(value)),
        },
        ScalarKind::Float => match value.as_f64() {
            Some(f) => Ok(Bson::Double(f)),
            None => Ok(json_to_bson(value)),
        },
        ScalarKind::DateTime => match value {
            Value::Number(n) => {
                let millis = n
                    .as_i64()
                    .ok_or_else(|| invalid(format!("non-integral epoch value {n}")))?;
                Ok(Bson::DateTime(BsonDateTime::from_millis(millis)))
            }
            Value::String(s) => Ok(Bson::DateTime(BsonDateTime::from_chrono(
                parse_datetime(s).map_err(invalid)?,
            ))),
            other => Err(invalid(format!("unsupported datetime value {other}"))),
        },
        ScalarKind::Uuid => match value {
            Value::String(s) => {
                let uuid = BsonUuid::parse_str(s).map_err(|e| invalid(e.to_string()))?;
                Ok(Bson::from(uuid))
            }
            other => Err(invalid(format!("unsupported uuid value {other}"))),
        },
        ScalarKind::ObjectId => match value {
            Value::String(s) => {
                let oid = ObjectId::parse_str(s).map_err(|e| invalid(e.to_string()))?;
                Ok(Bson::ObjectId(oid))
            }
            other => Err(invalid(format!("unsupported object id value {other}"))),
        },
        ScalarKind::Binary => match value {
            Value::Object(obj) => {
                let data = obj
                    .get("data")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid("binary mapping without data".into()))?;
                let subtype = match obj.get("type").and_then(Value::as_u64) {
                    Some(raw) => u8::try_from(raw)
                        .map_err(|_| invalid(format!("binary subtype {raw} out of range")))?,
                    None => 0,
                };
                let bytes = BASE64
                    .decode(data)
                    .map_err(|e| invalid(e.to_string()))?;
                Ok(Bson::Binary(Binary {
                    subtype: BinarySubtype::from(subtype),
                    bytes,
                }))
            }
            other => Err(invalid(format!("unsupported binary value {other}"))),
        },
    }
}

/// Rebuilds a storage representation from a parsed JSON object, guided by the
/// document's schema.
///
/// The public identifier key `id` is renamed to the storage key `_id` and
/// converted with the schema's identifier kind. Declared scalar fields are
/// parsed per [`ScalarKind`], embedded sub-documents recurse with their own
/// schemas (element-wise for lists), and reference fields keep their raw
/// marker shape. Undeclared keys pass through structurally.
pub fn storage_from_json(schema: &'static Schema, value: &Value) -> DocJsonResult<BsonDocument> {
    let obj = value
        .as_object()
        .ok_or_else(|| DocJsonError::MalformedJson(format!("expected a JSON object, got {value}")))?;

    let mut doc = BsonDocument::new();
    for (key, val) in obj {
        if key == "id" && !obj.contains_key("_id") {
            doc.insert("_id", scalar_to_bson("id", schema.id_scalar_kind(), val)?);
            continue;
        }
        let converted = match schema.field(key) {
            Some(spec) => field_from_json(key, &spec.kind, val)?,
            None => json_to_bson(val),
        };
        doc.insert(key.clone(), converted);
    }
    Ok(doc)
}

fn field_from_json(field: &str, kind: &FieldKind, value: &Value) -> DocJsonResult<Bson> {
    match kind {
        FieldKind::Scalar(scalar) => scalar_to_bson(field, *scalar, value),
        FieldKind::List(inner) => match value {
            Value::Array(items) => Ok(Bson::Array(
                items
                    .iter()
                    .map(|item| field_from_json(field, inner, item))
                    .collect::<DocJsonResult<Vec<_>>>()?,
            )),
            other => field_from_json(field, inner, other),
        },
        FieldKind::Embedded(target) => match value {
            Value::Null => Ok(Bson::Null),
            other => Ok(Bson::Document(storage_from_json(target(), other)?)),
        },
        // Reference markers (bare ids or `{"id": ...}` mappings) are
        // normalized later by the decoder; keep their raw shape here.
        FieldKind::Reference(_) => Ok(json_to_bson(value)),
        // Follow-reference fields are exempt from the decoder's
        // normalization pass, so their identifiers convert here.
        FieldKind::FollowReference(target) => follow_ref_from_json(field, target(), value),
    }
}

fn follow_ref_from_json(
    field: &str,
    target: &'static Schema,
    value: &Value,
) -> DocJsonResult<Bson> {
    match value {
        Value::String(s) if s.is_empty() => Ok(Bson::Null),
        Value::String(_) => scalar_to_bson(field, target.id_scalar_kind(), value),
        Value::Object(obj) => match obj.get("id").or_else(|| obj.get("_id")) {
            Some(id) => follow_ref_from_json(field, target, id),
            None => Ok(Bson::Null),
        },
        Value::Array(items) => Ok(Bson::Array(
            items
                .iter()
                .map(|item| follow_ref_from_json(field, target, item))
                .collect::<DocJsonResult<Vec<_>>>()?,
        )),
        other => Ok(json_to_bson(other)),
    }
}

fn parse_datetime(text: &str) -> Result<ChronoDateTime<Utc>, String> {
    if let Ok(dt) = ChronoDateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    // ISO timestamps without an offset, as emitted by naive producers.
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("unparseable datetime {text:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, ScalarKind};

    #[test]
    fn object_id_becomes_hex_string() {
        let oid = ObjectId::new();
        let value = bson_to_value(&Bson::ObjectId(oid), false).unwrap();
        assert_eq!(value, Value::String(oid.to_hex()));
    }

    #[test]
    fn datetime_modes() {
        let dt = BsonDateTime::from_millis(1_700_000_000_123);
        let iso = bson_to_value(&Bson::DateTime(dt), false).unwrap();
        assert!(iso.as_str().unwrap().starts_with("2023-11-14T"));

        let epoch = bson_to_value(&Bson::DateTime(dt), true).unwrap();
        assert_eq!(epoch, Value::from(1_700_000_000_123i64));
    }

    #[test]
    fn datetime_parses_back_from_both_forms() {
        let from_epoch = scalar_to_bson("at", ScalarKind::DateTime, &json!(1_700_000_000_123i64)).unwrap();
        assert_eq!(from_epoch, Bson::DateTime(BsonDateTime::from_millis(1_700_000_000_123)));

        let from_string =
            scalar_to_bson("at", ScalarKind::DateTime, &json!("2023-11-14T22:13:20.123Z")).unwrap();
        assert_eq!(from_string, from_epoch);
    }

    #[test]
    fn binary_roundtrip() {
        let bin = Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: vec![1, 2, 3, 255],
        });
        let value = bson_to_value(&bin, false).unwrap();
        assert_eq!(value["type"], json!(0));

        let back = scalar_to_bson("blob", ScalarKind::Binary, &value).unwrap();
        assert_eq!(back, bin);
    }

    #[test]
    fn regex_flags_only_when_present() {
        let with_flags = Bson::RegularExpression(bson::Regex {
            pattern: "^a.*z$".try_into().unwrap(),
            options: "i".try_into().unwrap(),
        });
        assert_eq!(
            bson_to_value(&with_flags, false).unwrap(),
            json!({ "regex": "^a.*z$", "flags": "i" })
        );

        let bare = Bson::RegularExpression(bson::Regex {
            pattern: "x".try_into().unwrap(),
            options: "".try_into().unwrap(),
        });
        assert_eq!(bson_to_value(&bare, false).unwrap(), json!({ "regex": "x" }));
    }

    #[test]
    fn binary_subtype_out_of_range_is_rejected() {
        let value = json!({ "data": "AQID", "type": 256 });
        let err = scalar_to_bson("blob", ScalarKind::Binary, &value).unwrap_err();
        assert!(matches!(err, DocJsonError::InvalidField(field, _) if field == "blob"));
    }

    #[test]
    fn key_markers() {
        assert_eq!(bson_to_value(&Bson::MinKey, false).unwrap(), json!({ "minKey": true }));
        assert_eq!(bson_to_value(&Bson::MaxKey, false).unwrap(), json!({ "maxKey": true }));
    }

    #[test]
    fn storage_from_json_renames_and_converts_the_identifier() {
        static SCHEMA: Schema = Schema {
            collection: "things",
            fields: &[
                FieldSpec::new("id", FieldKind::Scalar(ScalarKind::ObjectId)),
                FieldSpec::new("count", FieldKind::Scalar(ScalarKind::Int)),
            ],
        };
        let oid = ObjectId::new();
        let doc =
            storage_from_json(&SCHEMA, &json!({ "id": oid.to_hex(), "count": 7 })).unwrap();
        assert_eq!(doc.get("_id"), Some(&Bson::ObjectId(oid)));
        assert_eq!(doc.get("count"), Some(&Bson::Int64(7)));
        assert!(!doc.contains_key("id"));
    }

    #[test]
    fn invalid_object_id_is_reported_with_the_field_name() {
        let err = scalar_to_bson("owner", ScalarKind::ObjectId, &json!("nope")).unwrap_err();
        assert!(matches!(err, DocJsonError::InvalidField(field, _) if field == "owner"));
    }

    #[test]
    fn reference_markers_keep_their_shape() {
        static TARGET: Schema = Schema { collection: "targets", fields: &[] };
        fn target() -> &'static Schema {
            &TARGET
        }
        static SCHEMA: Schema = Schema {
            collection: "sources",
            fields: &[FieldSpec::new("owner", FieldKind::Reference(target))],
        };

        let doc = storage_from_json(&SCHEMA, &json!({ "owner": { "id": "abc" } })).unwrap();
        let marker = doc.get_document("owner").unwrap();
        assert_eq!(marker.get_str("id").unwrap(), "abc");
    }
}
