//! Declared field layout for documents participating in the JSON codec.
//!
//! A [`Schema`] describes the wire-visible fields of one document type: the
//! kind of value each field holds, whether it points at another document, and
//! any per-field exclusion policy. Schemas are plain `'static` data so they
//! can be shared freely; all transient per-pass state lives elsewhere
//! (see [`crate::annotate`]).
//!
//! Document types reachable through references or embedding are linked with
//! [`SchemaRef`] function pointers, which allows cyclic schema graphs to be
//! expressed as ordinary statics.

/// Scalar payload types the codec converts with a dedicated human-readable form.
///
/// Fields declared with a kind other than [`ScalarKind::Any`] get
/// format-specific treatment on both the encode and decode paths (for example
/// `DateTime` is written as an RFC 3339 string and parsed back from either a
/// string or an epoch-millisecond integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// UTF-8 string.
    String,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point number.
    Float,
    /// Boolean value.
    Bool,
    /// UTC datetime.
    DateTime,
    /// UUID, serialized as its hyphenated string form.
    Uuid,
    /// BSON ObjectId, serialized as its hex string form.
    ObjectId,
    /// Binary blob, serialized as `{"data": <base64>, "type": <subtype>}`.
    Binary,
    /// Anything else; passed through with only structural conversion.
    Any,
}

/// A link to another document type's schema.
///
/// Function pointers rather than direct references so that mutually- and
/// self-referencing schemas can be built as statics.
pub type SchemaRef = fn() -> &'static Schema;

/// The declared type of one document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A plain scalar value.
    Scalar(ScalarKind),
    /// A homogeneous list wrapping another field kind.
    List(&'static FieldKind),
    /// A sub-document stored inline.
    Embedded(SchemaRef),
    /// An identifier pointing at a document in another collection.
    Reference(SchemaRef),
    /// A reference that is annotated like any other field but is never
    /// expanded by recursive reference-following. Declaring a field with this
    /// kind is the escape hatch that breaks reference cycles during encoding.
    FollowReference(SchemaRef),
}

/// Per-field exclusion policy for the JSON codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Exclude {
    /// The field participates in both directions.
    #[default]
    None,
    /// The field is dropped from encoded output.
    Encode,
    /// The field is ignored in decoded input.
    Decode,
    /// The field is excluded in both directions.
    Both,
}

impl Exclude {
    /// Returns `true` if the field must not appear in encoded output.
    pub const fn on_encode(self) -> bool {
        matches!(self, Exclude::Encode | Exclude::Both)
    }

    /// Returns `true` if the field must be dropped from decoded input.
    pub const fn on_decode(self) -> bool {
        matches!(self, Exclude::Decode | Exclude::Both)
    }
}

/// Describes one declared document attribute.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// The public (wire) name of the field. The identifier field is declared
    /// under the public name `id`; storage representations use `_id` and the
    /// codec renames between the two.
    pub name: &'static str,
    /// The declared type of the field.
    pub kind: FieldKind,
    /// Exclusion policy applied by the codec.
    pub exclude: Exclude,
}

impl FieldSpec {
    /// Creates a field spec with no exclusion policy.
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            exclude: Exclude::None,
        }
    }

    /// Creates a field spec with the given exclusion policy.
    pub const fn excluded(name: &'static str, kind: FieldKind, exclude: Exclude) -> Self {
        Self { name, kind, exclude }
    }
}

/// The declared field layout of one document type.
#[derive(Debug)]
pub struct Schema {
    /// Name of the collection instances of this document type live in.
    pub collection: &'static str,
    /// The declared fields, in wire order.
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Looks up a field spec by its public name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the scalar kind used to convert this document's identifier.
    ///
    /// Falls back to [`ScalarKind::ObjectId`] when the schema does not declare
    /// an `id` field explicitly.
    pub fn id_scalar_kind(&self) -> ScalarKind {
        match self.field("id").map(|f| f.kind) {
            Some(FieldKind::Scalar(kind)) => kind,
            _ => ScalarKind::ObjectId,
        }
    }
}

/// The classification of one declared field, as consumed by the annotator,
/// encoder, and decoder.
///
/// Produced by [`classify`]; a list classification is derived from the wrapped
/// element descriptor, so a list of references classifies as
/// [`FieldClass::ReferenceList`] while a list of scalars is treated as a plain
/// scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// Plain value (or list of plain values); no document semantics.
    Scalar(ScalarKind),
    /// A single inline sub-document.
    EmbeddedSingle(SchemaRef),
    /// A list of inline sub-documents.
    EmbeddedList(SchemaRef),
    /// A single followable reference.
    ReferenceSingle(SchemaRef),
    /// A list of followable references.
    ReferenceList(SchemaRef),
    /// A reference (single or list) exempt from automatic dereferencing.
    FollowReference(SchemaRef),
}

/// Classifies a declared field kind.
///
/// Pure function of the descriptor; no side effects.
pub fn classify(kind: &FieldKind) -> FieldClass {
    match kind {
        FieldKind::Scalar(s) => FieldClass::Scalar(*s),
        FieldKind::Embedded(target) => FieldClass::EmbeddedSingle(*target),
        FieldKind::Reference(target) => FieldClass::ReferenceSingle(*target),
        FieldKind::FollowReference(target) => FieldClass::FollowReference(*target),
        FieldKind::List(inner) => match inner {
            FieldKind::Scalar(s) => FieldClass::Scalar(*s),
            FieldKind::Embedded(target) => FieldClass::EmbeddedList(*target),
            FieldKind::Reference(target) => FieldClass::ReferenceList(*target),
            FieldKind::FollowReference(target) => FieldClass::FollowReference(*target),
            // Nested lists carry no document semantics; pass them through.
            FieldKind::List(_) => FieldClass::Scalar(ScalarKind::Any),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TARGET: Schema = Schema {
        collection: "targets",
        fields: &[FieldSpec::new("id", FieldKind::Scalar(ScalarKind::ObjectId))],
    };

    fn target() -> &'static Schema {
        &TARGET
    }

    #[test]
    fn scalar_classifies_scalar() {
        assert_eq!(
            classify(&FieldKind::Scalar(ScalarKind::String)),
            FieldClass::Scalar(ScalarKind::String)
        );
    }

    #[test]
    fn list_classification_derives_from_element() {
        assert!(matches!(
            classify(&FieldKind::List(&FieldKind::Reference(target))),
            FieldClass::ReferenceList(_)
        ));
        assert!(matches!(
            classify(&FieldKind::List(&FieldKind::Embedded(target))),
            FieldClass::EmbeddedList(_)
        ));
        assert_eq!(
            classify(&FieldKind::List(&FieldKind::Scalar(ScalarKind::Int))),
            FieldClass::Scalar(ScalarKind::Int)
        );
    }

    #[test]
    fn follow_reference_classifies_the_same_in_and_out_of_lists() {
        assert!(matches!(
            classify(&FieldKind::FollowReference(target)),
            FieldClass::FollowReference(_)
        ));
        assert!(matches!(
            classify(&FieldKind::List(&FieldKind::FollowReference(target))),
            FieldClass::FollowReference(_)
        ));
    }

    #[test]
    fn exclusion_bits() {
        assert!(Exclude::Encode.on_encode());
        assert!(!Exclude::Encode.on_decode());
        assert!(Exclude::Decode.on_decode());
        assert!(Exclude::Both.on_encode() && Exclude::Both.on_decode());
        assert!(!Exclude::None.on_encode() && !Exclude::None.on_decode());
    }

    #[test]
    fn id_scalar_kind_defaults_to_object_id() {
        static NO_ID: Schema = Schema {
            collection: "anon",
            fields: &[FieldSpec::new("name", FieldKind::Scalar(ScalarKind::String))],
        };
        assert_eq!(NO_ID.id_scalar_kind(), ScalarKind::ObjectId);
        assert_eq!(TARGET.id_scalar_kind(), ScalarKind::ObjectId);
    }
}
