//! Human-readable JSON encoding of documents.
//!
//! The [`Encoder`] turns a document's storage representation into a
//! JSON-safe mapping: the storage identifier key `_id` is renamed to the
//! public key `id`, fields flagged exclude-on-encode are dropped, BSON-only
//! types are flattened through [`crate::convert`], and — when
//! reference-following is enabled — referenced documents are inlined
//! recursively up to a maximum depth.
//!
//! Every document pass is bracketed by [`Annotations::begin`] /
//! [`Annotations::end`], including the recursive passes made while following
//! references, so no annotation state survives a call regardless of outcome.

use bson::{Bson, Document as BsonDocument};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    annotate::Annotations,
    convert::{bson_to_value, document_to_value},
    document::{DocumentLoader, JsonDocument},
    error::{DocJsonError, DocJsonResult},
    schema::{FieldClass, Schema, classify},
};

/// Call parameters for one encoding pass.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Ask the document for its storage field names (`_id` and friends)
    /// before the codec's own renaming. Defaults to `true`.
    pub use_storage_field_names: bool,
    /// Inline referenced documents instead of emitting bare identifiers.
    /// Defaults to `false`.
    pub follow_reference: bool,
    /// Maximum reference-following depth; `None` follows without bound
    /// (the caller is then responsible for an acyclic reference graph).
    /// `Some(0)` behaves exactly like `follow_reference: false`.
    /// Defaults to `Some(3)`.
    pub max_depth: Option<usize>,
    /// Serialize datetimes as epoch milliseconds instead of RFC 3339 strings.
    /// Defaults to `false`.
    pub epoch_mode: bool,
    /// Pretty-print with the given indent width. Defaults to `None` (compact).
    pub indent: Option<usize>,
    /// Emit object keys in sorted order instead of insertion order.
    /// Defaults to `false`.
    pub sort_keys: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            use_storage_field_names: true,
            follow_reference: false,
            max_depth: Some(3),
            epoch_mode: false,
            indent: None,
            sort_keys: false,
        }
    }
}

impl EncodeOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables reference-following with the default depth bound.
    pub fn following(mut self) -> Self {
        self.follow_reference = true;
        self
    }

    /// Sets the maximum reference-following depth.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Switches datetime serialization to epoch milliseconds.
    pub fn with_epoch_mode(mut self) -> Self {
        self.epoch_mode = true;
        self
    }

    /// Pretty-prints the output with the given indent width.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }

    /// Emits object keys in sorted order.
    pub fn with_sorted_keys(mut self) -> Self {
        self.sort_keys = true;
        self
    }
}

/// JSON encoder for documents, with optional recursive reference-following.
///
/// An encoder without a loader can serialize any document but fails with
/// [`DocJsonError::MissingLoader`] if asked to dereference a bare identifier;
/// construct one with [`Encoder::with_loader`] to enable following.
///
/// The annotation table is exposed through [`Encoder::annotations`]; after
/// any call it is clear again, also when the call failed.
pub struct Encoder<'a> {
    loader: Option<&'a dyn DocumentLoader>,
    opts: EncodeOptions,
    marks: Annotations,
}

impl<'a> Encoder<'a> {
    /// Creates an encoder without a document loader.
    pub fn new(opts: EncodeOptions) -> Self {
        Self {
            loader: None,
            opts,
            marks: Annotations::new(),
        }
    }

    /// Creates an encoder that resolves references through `loader`.
    pub fn with_loader(loader: &'a dyn DocumentLoader, opts: EncodeOptions) -> Self {
        Self {
            loader: Some(loader),
            opts,
            marks: Annotations::new(),
        }
    }

    /// Returns the options this encoder was built with.
    pub fn options(&self) -> &EncodeOptions {
        &self.opts
    }

    /// Returns the annotation table, for inspection.
    pub fn annotations(&self) -> &Annotations {
        &self.marks
    }

    /// Encodes one document to a JSON string.
    pub fn encode<D: JsonDocument>(&mut self, doc: &D) -> DocJsonResult<String> {
        let value = self.encode_value(doc)?;
        self.render(&value)
    }

    /// Encodes one document to a JSON value (an object).
    pub fn encode_value<D: JsonDocument>(&mut self, doc: &D) -> DocJsonResult<Value> {
        let stored = doc.to_storage(self.opts.use_storage_field_names)?;
        let mapping = self.encode_stored(D::schema(), stored, 0)?;
        Ok(Value::Object(mapping))
    }

    /// Encodes a result list to a JSON array string, applying the same
    /// renaming and exclusion rules to every element.
    pub fn encode_many<D: JsonDocument>(&mut self, docs: &[D]) -> DocJsonResult<String> {
        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            items.push(self.encode_value(doc)?);
        }
        self.render(&Value::Array(items))
    }

    /// Encodes a storage representation under the given schema.
    ///
    /// This is the recursion point for reference-following: inlined target
    /// documents come back from the loader already in storage form.
    fn encode_stored(
        &mut self,
        schema: &'static Schema,
        stored: BsonDocument,
        depth: usize,
    ) -> DocJsonResult<Map<String, Value>> {
        self.marks.begin(schema, depth);
        let result = self.encode_fields(schema, stored, depth);
        // The end half of the bracket runs regardless of the outcome so no
        // marks leak out of a failed pass.
        self.marks.end(schema, depth);
        result
    }

    fn encode_fields(
        &mut self,
        schema: &'static Schema,
        mut data: BsonDocument,
        depth: usize,
    ) -> DocJsonResult<Map<String, Value>> {
        if !data.contains_key("id") {
            if let Some(id) = data.remove("_id") {
                data.insert("id", id);
            }
        }
        for field in schema.fields {
            if field.exclude.on_encode() {
                data.remove(field.name);
            }
        }

        let mut out = document_to_value(&data, self.opts.epoch_mode)?;

        let depth_allows = self.opts.max_depth.is_none_or(|max| depth < max);
        if self.opts.follow_reference && depth_allows {
            for field in schema.fields {
                if field.exclude.on_encode() {
                    continue;
                }
                // The field's own mark carries the depth it was stamped with.
                let at_depth = self.marks.depth_of(schema, field.name).unwrap_or(depth);
                match classify(&field.kind) {
                    FieldClass::ReferenceSingle(target) => {
                        let Some(raw) = data.get(field.name).cloned() else {
                            continue;
                        };
                        if let Some(inlined) = self.follow(target(), &raw, at_depth)? {
                            out.insert(field.name.to_string(), Value::Object(inlined));
                        }
                    }
                    FieldClass::ReferenceList(target) => {
                        let Some(Bson::Array(raw_items)) = data.get(field.name).cloned() else {
                            continue;
                        };
                        let mut inlined_items = Vec::with_capacity(raw_items.len());
                        for raw in &raw_items {
                            match self.follow(target(), raw, at_depth)? {
                                Some(inlined) => inlined_items.push(Value::Object(inlined)),
                                None => inlined_items.push(bson_to_value(raw, self.opts.epoch_mode)?),
                            }
                        }
                        out.insert(field.name.to_string(), Value::Array(inlined_items));
                    }
                    // Follow-reference fields stay as identifiers by design;
                    // scalars and embedded documents are already in `out`.
                    _ => {}
                }
            }
        }

        Ok(out)
    }

    /// Resolves one reference value and encodes the target one level deeper.
    ///
    /// Bare identifiers go through the loader; an already inlined document is
    /// reused as-is, and a `$id`-carrying ref document is dereferenced by its
    /// inner identifier. Null contributes nothing.
    fn follow(
        &mut self,
        target: &'static Schema,
        raw: &Bson,
        depth: usize,
    ) -> DocJsonResult<Option<Map<String, Value>>> {
        let stored = match raw {
            Bson::Null => return Ok(None),
            Bson::Document(doc) => match doc.get("$id") {
                Some(id) => self.load(target, &id.clone())?,
                None => doc.clone(),
            },
            id => self.load(target, id)?,
        };
        let inlined = self.encode_stored(target, stored, depth + 1)?;
        Ok(Some(inlined))
    }

    fn load(&self, target: &'static Schema, id: &Bson) -> DocJsonResult<BsonDocument> {
        let loader = self
            .loader
            .ok_or_else(|| DocJsonError::MissingLoader(target.collection.to_string()))?;
        loader.load_by_id(target.collection, id)
    }

    fn render(&self, value: &Value) -> DocJsonResult<String> {
        let value = if self.opts.sort_keys {
            sorted(value)
        } else {
            value.clone()
        };
        match self.opts.indent {
            None => Ok(serde_json::to_string(&value)?),
            Some(width) => {
                let indent = " ".repeat(width);
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                value.serialize(&mut ser)?;
                String::from_utf8(buf).map_err(|e| DocJsonError::Serialization(e.to_string()))
            }
        }
    }
}

/// Encodes one document with the given options.
///
/// Convenience for an [`Encoder`] without a loader; reference-following
/// against bare identifiers requires [`encode_with_loader`].
pub fn encode<D: JsonDocument>(doc: &D, opts: EncodeOptions) -> DocJsonResult<String> {
    Encoder::new(opts).encode(doc)
}

/// Encodes one document, resolving references through `loader`.
pub fn encode_with_loader<D: JsonDocument>(
    doc: &D,
    loader: &dyn DocumentLoader,
    opts: EncodeOptions,
) -> DocJsonResult<String> {
    Encoder::with_loader(loader, opts).encode(doc)
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&obj[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
