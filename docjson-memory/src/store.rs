//! In-memory document source implementation.
//!
//! This module provides a simple loader that stores documents as BSON
//! mappings in HashMaps behind a read-write lock, implementing the
//! [`DocumentLoader`] contract including the `$slice`-style field projection.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use bson::{Bson, Document as BsonDocument};

use docjson_core::{
    document::{DocumentLoader, JsonDocument},
    error::{DocJsonError, DocJsonResult},
};

type CollectionMap = HashMap<String, BsonDocument>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory document source.
///
/// Documents are stored as BSON mappings indexed by the string form of their
/// `_id`. The loader is cloneable; clones share the same underlying data.
/// Lookups scan nothing and hold the lock only for the duration of one call,
/// matching the synchronous call-and-return model of the codec.
///
/// # Example
///
/// ```ignore
/// use docjson_memory::InMemoryLoader;
/// use docjson_core::document::DocumentLoader;
/// use bson::{doc, oid::ObjectId, Bson};
///
/// let loader = InMemoryLoader::new();
/// let id = ObjectId::new();
/// loader.insert("users", doc! { "_id": id, "name": "Alice" })?;
///
/// let user = loader.load_by_id("users", &Bson::ObjectId(id))?;
/// assert_eq!(user.get_str("name").unwrap(), "Alice");
/// # Ok::<(), docjson_core::error::DocJsonError>(())
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryLoader {
    store: Arc<RwLock<StoreMap>>,
}

fn id_key(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl InMemoryLoader {
    /// Creates a new empty in-memory loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a storage representation into a collection, keyed by its
    /// `_id`. An existing document with the same identifier is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error when the document carries no `_id`.
    pub fn insert(&self, collection: &str, doc: BsonDocument) -> DocJsonResult<()> {
        let id = doc
            .get("_id")
            .cloned()
            .ok_or_else(|| DocJsonError::Backend("document without _id".to_string()))?;
        let mut store = self.write()?;
        store
            .entry(collection.to_string())
            .or_default()
            .insert(id_key(&id), doc);
        Ok(())
    }

    /// Converts a document to its storage representation and inserts it into
    /// its schema's collection.
    pub fn insert_document<D: JsonDocument>(&self, doc: &D) -> DocJsonResult<()> {
        self.insert(D::collection_name(), doc.to_storage(true)?)
    }

    /// Removes a document by identifier. Missing documents are ignored.
    pub fn remove(&self, collection: &str, id: &Bson) -> DocJsonResult<()> {
        let mut store = self.write()?;
        if let Some(collection_map) = store.get_mut(collection) {
            collection_map.remove(&id_key(id));
        }
        Ok(())
    }

    /// Lists all collections currently holding documents.
    pub fn collections(&self) -> DocJsonResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn read(&self) -> DocJsonResult<std::sync::RwLockReadGuard<'_, StoreMap>> {
        self.store
            .read()
            .map_err(|e| DocJsonError::Backend(e.to_string()))
    }

    fn write(&self) -> DocJsonResult<std::sync::RwLockWriteGuard<'_, StoreMap>> {
        self.store
            .write()
            .map_err(|e| DocJsonError::Backend(e.to_string()))
    }
}

impl DocumentLoader for InMemoryLoader {
    fn load_by_id(&self, collection: &str, id: &Bson) -> DocJsonResult<BsonDocument> {
        let store = self.read()?;
        store
            .get(collection)
            .and_then(|collection_map| collection_map.get(&id_key(id)))
            .cloned()
            .ok_or_else(|| DocJsonError::DocumentNotFound(id_key(id), collection.to_string()))
    }

    fn load_field_slice(
        &self,
        collection: &str,
        id: &Bson,
        field: &str,
        start: usize,
        limit: usize,
    ) -> DocJsonResult<BsonDocument> {
        let mut doc = self.load_by_id(collection, id)?;
        if let Some(Bson::Array(items)) = doc.get(field) {
            let end = start.saturating_add(limit).min(items.len());
            let slice: Vec<Bson> = if start < items.len() {
                items[start..end].to_vec()
            } else {
                Vec::new()
            };
            let counter = format!("{field}_count");
            if !doc.contains_key(&counter) {
                doc.insert(counter, Bson::Int64(items.len() as i64));
            }
            doc.insert(field, Bson::Array(slice));
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};

    #[test]
    fn insert_and_load() {
        let loader = InMemoryLoader::new();
        let id = ObjectId::new();
        loader
            .insert("users", doc! { "_id": id, "name": "Alice" })
            .unwrap();

        let user = loader.load_by_id("users", &Bson::ObjectId(id)).unwrap();
        assert_eq!(user.get_str("name").unwrap(), "Alice");
        assert_eq!(loader.collections().unwrap(), vec!["users".to_string()]);
    }

    #[test]
    fn missing_documents_are_not_found() {
        let loader = InMemoryLoader::new();
        let err = loader
            .load_by_id("users", &Bson::ObjectId(ObjectId::new()))
            .unwrap_err();
        assert!(matches!(err, DocJsonError::DocumentNotFound(_, _)));
    }

    #[test]
    fn field_slice_projects_and_counts() {
        let loader = InMemoryLoader::new();
        let id = ObjectId::new();
        let comments: Vec<Bson> = (0..25).map(Bson::Int32).collect();
        loader
            .insert("posts", doc! { "_id": id, "comments": comments })
            .unwrap();

        let projected = loader
            .load_field_slice("posts", &Bson::ObjectId(id), "comments", 10, 10)
            .unwrap();
        let items = projected.get_array("comments").unwrap();
        assert_eq!(items.len(), 10);
        assert_eq!(items[0], Bson::Int32(10));
        assert_eq!(projected.get_i64("comments_count").unwrap(), 25);
    }

    #[test]
    fn field_slice_past_the_end_is_empty() {
        let loader = InMemoryLoader::new();
        let id = ObjectId::new();
        loader
            .insert("posts", doc! { "_id": id, "comments": [1, 2, 3] })
            .unwrap();

        let projected = loader
            .load_field_slice("posts", &Bson::ObjectId(id), "comments", 10, 10)
            .unwrap();
        assert!(projected.get_array("comments").unwrap().is_empty());
    }

    #[test]
    fn insert_requires_an_identifier() {
        let loader = InMemoryLoader::new();
        let err = loader.insert("users", doc! { "name": "nobody" }).unwrap_err();
        assert!(matches!(err, DocJsonError::Backend(_)));
    }
}
