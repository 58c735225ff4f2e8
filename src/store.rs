//! Item document store backing the `/api/items` resource.

use std::{path::Path, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use uuid::Uuid;

use crate::query::Filter;

use self::documents::DocumentStore;

mod documents;

/// A schemaless item document: an arbitrary JSON object carrying a
/// server-assigned `id` field once stored.
pub type Document = serde_json::Map<String, Value>;

/// A store for catalog item documents.
///
/// Documents live in the persistent [`DocumentStore`] keyed by their id.
/// Queries are linear scans filtered in memory; writes are serialized by the
/// underlying single-writer transactions.
#[derive(Debug, Clone)]
pub struct ItemStore {
    store: Arc<DocumentStore>,
}

impl ItemStore {
    /// Create a persistent store backed by a database file at `path`.
    pub fn persistent(path: impl AsRef<Path>) -> Result<Self> {
        let store = DocumentStore::persistent(path)?;
        Ok(Self::new(store))
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self> {
        let store = DocumentStore::in_memory()?;
        Ok(Self::new(store))
    }

    /// Create a new item store.
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// List the documents matching a filter.
    pub fn find(&self, filter: &Filter) -> Result<Vec<Document>> {
        let mut docs = self.store.all()?;
        docs.retain(|doc| filter.matches(doc));
        Ok(docs)
    }

    /// Insert a new document and return it as stored.
    ///
    /// A fresh unique id is assigned before storage; any caller-supplied `id`
    /// field is overwritten.
    pub fn insert(&self, mut doc: Document) -> Result<Document> {
        let id = Uuid::new_v4().to_string();
        doc.insert("id".to_string(), Value::String(id));
        self.store.put(&doc)?;
        Ok(doc)
    }

    /// Merge `fields` into every document matching the filter (a
    /// set-operation, not a replace) and return the updated documents.
    pub fn update(&self, filter: &Filter, fields: &Document) -> Result<Vec<Document>> {
        self.store.update_where(|doc| filter.matches(doc), fields)
    }

    /// Remove every document matching the filter, returning how many were
    /// removed.
    pub fn remove(&self, filter: &Filter) -> Result<usize> {
        self.store.remove_where(|doc| filter.matches(doc))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn insert_assigns_fresh_unique_ids() {
        let store = ItemStore::in_memory().unwrap();
        let a = store
            .insert(doc(json!({"name": "Pen", "price": 1.5})))
            .unwrap();
        let b = store
            .insert(doc(json!({"name": "Ink", "price": 10, "id": "client-picked"})))
            .unwrap();
        let id_a = a["id"].as_str().unwrap();
        let id_b = b["id"].as_str().unwrap();
        assert_ne!(id_a, id_b);
        // a caller-supplied id is not honored
        assert_ne!(id_b, "client-picked");
        assert_eq!(store.find(&Filter::default()).unwrap().len(), 2);
    }

    #[test]
    fn find_applies_filter() {
        let store = ItemStore::in_memory().unwrap();
        store
            .insert(doc(json!({"name": "Pen", "price": 1.5})))
            .unwrap();
        store
            .insert(doc(json!({"name": "Ink", "price": 10.0})))
            .unwrap();

        let matched = store.find(&Filter::exact("name", "Pen")).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["name"], "Pen");
    }

    #[test]
    fn update_merges_fields_without_replacing() {
        let store = ItemStore::in_memory().unwrap();
        let pen = store
            .insert(doc(json!({"name": "Pen", "price": 1.5})))
            .unwrap();
        let id = pen["id"].as_str().unwrap().to_string();

        let updated = store
            .update(&Filter::exact("id", id.clone()), &doc(json!({"price": 2.0})))
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["name"], "Pen");
        assert_eq!(updated[0]["price"], 2.0);

        let stored = store.find(&Filter::exact("id", id)).unwrap();
        assert_eq!(stored[0]["name"], "Pen");
        assert_eq!(stored[0]["price"], 2.0);
    }

    #[test]
    fn update_touches_every_match() {
        let store = ItemStore::in_memory().unwrap();
        store
            .insert(doc(json!({"name": "Pen", "price": 1.5})))
            .unwrap();
        store
            .insert(doc(json!({"name": "Pen", "price": 3.0})))
            .unwrap();
        store
            .insert(doc(json!({"name": "Ink", "price": 10.0})))
            .unwrap();

        let updated = store
            .update(&Filter::exact("name", "Pen"), &doc(json!({"price": 2.0})))
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|d| d["price"] == 2.0));

        let inks = store.find(&Filter::exact("name", "Ink")).unwrap();
        assert_eq!(inks[0]["price"], 10.0);
    }

    #[test]
    fn remove_reports_count_and_leaves_others() {
        let store = ItemStore::in_memory().unwrap();
        let pen = store
            .insert(doc(json!({"name": "Pen", "price": 1.5})))
            .unwrap();
        store
            .insert(doc(json!({"name": "Ink", "price": 10.0})))
            .unwrap();

        let id = pen["id"].as_str().unwrap();
        assert_eq!(store.remove(&Filter::exact("id", id)).unwrap(), 1);
        assert_eq!(store.remove(&Filter::exact("id", "missing")).unwrap(), 0);
        assert_eq!(store.find(&Filter::default()).unwrap().len(), 1);
    }

    #[test]
    fn persistent_store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("item-catalog-test-{}", Uuid::new_v4()));
        let path = dir.join("items.db");
        {
            let store = ItemStore::persistent(&path).unwrap();
            store
                .insert(doc(json!({"name": "Pen", "price": 1.5})))
                .unwrap();
        }
        let store = ItemStore::persistent(&path).unwrap();
        let docs = store.find(&Filter::default()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], "Pen");
        std::fs::remove_dir_all(dir).ok();
    }
}
