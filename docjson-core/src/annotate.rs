//! Transient per-pass field annotations for the JSON codec.
//!
//! The encoder marks every declared field it is about to serialize as
//! "active at depth D" and removes the mark when the pass over that document
//! ends. Storing these flags on the schema objects themselves would share
//! them across every instance of a document type; instead they live in an
//! [`Annotations`] side table owned by the running pass, so concurrent
//! encodes of documents sharing a schema never observe each other's state.
//!
//! Marks are keyed by schema identity and field name, and each key holds a
//! stack of depths: a schema re-entered through reference-following pushes a
//! second mark and pops it on the way out.

use std::collections::{HashMap, HashSet};

use crate::schema::{FieldClass, Schema, classify};

type MarkKey = (usize, &'static str);

fn schema_id(schema: &'static Schema) -> usize {
    schema as *const Schema as usize
}

/// Side table of "currently serializing, at depth D" field marks.
///
/// [`begin`](Annotations::begin) followed by [`end`](Annotations::end)
/// restores the table to its prior state; calling `end` without marks present
/// is a no-op. The encoder brackets every document pass with the pair, also
/// on failure, so a table observed between passes is always clear.
#[derive(Debug, Default)]
pub struct Annotations {
    active: HashMap<MarkKey, Vec<usize>>,
}

impl Annotations {
    /// Creates an empty annotation table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every declared field of `schema` active at `depth`.
    ///
    /// Scalar, reference, follow-reference, and embedded-list fields are
    /// stamped directly; embedded single sub-documents recurse into their own
    /// `begin` without advancing the depth (depth only accounts for actual
    /// reference dereferences).
    pub fn begin(&mut self, schema: &'static Schema, depth: usize) {
        self.begin_inner(schema, depth, &mut HashSet::new());
    }

    /// Removes the marks set by the matching [`begin`](Annotations::begin).
    ///
    /// Fully removes each mark rather than leaving a cleared entry behind;
    /// marks that were never set are skipped silently.
    pub fn end(&mut self, schema: &'static Schema, depth: usize) {
        self.end_inner(schema, depth, &mut HashSet::new());
    }

    /// Returns `true` if the given field currently carries an active mark.
    pub fn is_active(&self, schema: &'static Schema, field: &str) -> bool {
        self.active
            .keys()
            .any(|(id, name)| *id == schema_id(schema) && *name == field)
    }

    /// Returns the innermost depth the given field was marked at, if any.
    pub fn depth_of(&self, schema: &'static Schema, field: &str) -> Option<usize> {
        self.active
            .iter()
            .find(|((id, name), _)| *id == schema_id(schema) && *name == field)
            .and_then(|(_, depths)| depths.last().copied())
    }

    /// Returns `true` if no field anywhere carries a mark.
    pub fn is_clear(&self) -> bool {
        self.active.is_empty()
    }

    fn begin_inner(&mut self, schema: &'static Schema, depth: usize, seen: &mut HashSet<usize>) {
        // A schema can embed itself; the guard keeps the walk finite.
        if !seen.insert(schema_id(schema)) {
            return;
        }
        for field in schema.fields {
            match classify(&field.kind) {
                FieldClass::EmbeddedSingle(target) => {
                    self.begin_inner(target(), depth, seen);
                }
                _ => {
                    self.active
                        .entry((schema_id(schema), field.name))
                        .or_default()
                        .push(depth);
                }
            }
        }
    }

    fn end_inner(&mut self, schema: &'static Schema, depth: usize, seen: &mut HashSet<usize>) {
        if !seen.insert(schema_id(schema)) {
            return;
        }
        for field in schema.fields {
            match classify(&field.kind) {
                FieldClass::EmbeddedSingle(target) => {
                    self.end_inner(target(), depth, seen);
                }
                _ => {
                    let key = (schema_id(schema), field.name);
                    if let Some(depths) = self.active.get_mut(&key) {
                        depths.pop();
                        if depths.is_empty() {
                            self.active.remove(&key);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, FieldSpec, ScalarKind};

    static INNER: Schema = Schema {
        collection: "",
        fields: &[FieldSpec::new("label", FieldKind::Scalar(ScalarKind::String))],
    };

    fn inner() -> &'static Schema {
        &INNER
    }

    static OUTER: Schema = Schema {
        collection: "outers",
        fields: &[
            FieldSpec::new("id", FieldKind::Scalar(ScalarKind::ObjectId)),
            FieldSpec::new("nested", FieldKind::Embedded(inner)),
            FieldSpec::new("tags", FieldKind::List(&FieldKind::Scalar(ScalarKind::String))),
        ],
    };

    #[test]
    fn begin_marks_fields_and_recurses_into_embedded_schemas() {
        let mut marks = Annotations::new();
        marks.begin(&OUTER, 0);

        assert!(marks.is_active(&OUTER, "id"));
        assert!(marks.is_active(&OUTER, "tags"));
        // Embedded single fields are not stamped themselves; their schema is
        // walked instead.
        assert!(!marks.is_active(&OUTER, "nested"));
        assert!(marks.is_active(&INNER, "label"));
        assert_eq!(marks.depth_of(&OUTER, "id"), Some(0));
    }

    #[test]
    fn end_restores_prior_state() {
        let mut marks = Annotations::new();
        marks.begin(&OUTER, 2);
        marks.end(&OUTER, 2);
        assert!(marks.is_clear());
    }

    #[test]
    fn end_without_begin_is_a_noop() {
        let mut marks = Annotations::new();
        marks.end(&OUTER, 0);
        assert!(marks.is_clear());
    }

    #[test]
    fn reentrant_marks_nest() {
        let mut marks = Annotations::new();
        marks.begin(&OUTER, 0);
        marks.begin(&OUTER, 1);
        assert_eq!(marks.depth_of(&OUTER, "id"), Some(1));

        marks.end(&OUTER, 1);
        assert_eq!(marks.depth_of(&OUTER, "id"), Some(0));

        marks.end(&OUTER, 0);
        assert!(marks.is_clear());
    }

    #[test]
    fn self_embedding_schema_terminates() {
        static SELF_EMBED: Schema = Schema {
            collection: "trees",
            fields: &[
                FieldSpec::new("id", FieldKind::Scalar(ScalarKind::ObjectId)),
                FieldSpec::new("child", FieldKind::Embedded(self_embed)),
            ],
        };
        fn self_embed() -> &'static Schema {
            &SELF_EMBED
        }

        let mut marks = Annotations::new();
        marks.begin(&SELF_EMBED, 0);
        assert!(marks.is_active(&SELF_EMBED, "id"));
        marks.end(&SELF_EMBED, 0);
        assert!(marks.is_clear());
    }
}
