use std::path::Path;

use anyhow::{Context, Result};
use redb::{backends::InMemoryBackend, Database, ReadableTable, TableDefinition};
use serde_json::Value;
use tracing::info;

use crate::store::Document;

const ITEMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("items-1");

/// Persistent table of item documents, keyed by id and stored as JSON bytes.
///
/// redb allows a single write transaction at a time, which serializes
/// concurrent writers without corrupting the database file.
#[derive(Debug)]
pub struct DocumentStore {
    db: Database,
}

impl DocumentStore {
    pub fn persistent(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("loading item database from {}", path.to_string_lossy());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create database directory at {}",
                    path.to_string_lossy()
                )
            })?;
        }
        let db = Database::builder()
            .create(path)
            .context("failed to open item database")?;
        Self::open(db)
    }

    pub fn in_memory() -> Result<Self> {
        info!("using in-memory item database");
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::open(db)
    }

    pub fn open(db: Database) -> Result<Self> {
        let write_tx = db.begin_write()?;
        {
            let _table = write_tx.open_table(ITEMS_TABLE)?;
        }
        write_tx.commit()?;
        Ok(Self { db })
    }

    pub fn all(&self) -> Result<Vec<Document>> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(ITEMS_TABLE)?;
        let mut docs = Vec::new();
        for row in table.iter()? {
            let (_key, value) = row?;
            docs.push(serde_json::from_slice(value.value())?);
        }
        Ok(docs)
    }

    pub fn put(&self, doc: &Document) -> Result<()> {
        let id = doc_id(doc)?;
        let bytes = serde_json::to_vec(doc)?;
        let tx = self.db.begin_write()?;
        {
            let mut table = tx.open_table(ITEMS_TABLE)?;
            table.insert(id, bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Merge `fields` into every document matching `pred`, all within one
    /// write transaction. Returns the updated documents.
    pub fn update_where(
        &self,
        pred: impl Fn(&Document) -> bool,
        fields: &Document,
    ) -> Result<Vec<Document>> {
        let tx = self.db.begin_write()?;
        let updated = {
            let mut table = tx.open_table(ITEMS_TABLE)?;
            let mut matches = Vec::new();
            for row in table.iter()? {
                let (key, value) = row?;
                let doc: Document = serde_json::from_slice(value.value())?;
                if pred(&doc) {
                    matches.push((key.value().to_string(), doc));
                }
            }
            let mut updated = Vec::with_capacity(matches.len());
            for (id, mut doc) in matches {
                for (field, value) in fields {
                    doc.insert(field.clone(), value.clone());
                }
                let bytes = serde_json::to_vec(&doc)?;
                table.insert(id.as_str(), bytes.as_slice())?;
                updated.push(doc);
            }
            updated
        };
        tx.commit()?;
        Ok(updated)
    }

    /// Remove every document matching `pred` within one write transaction.
    /// Returns how many documents were removed.
    pub fn remove_where(&self, pred: impl Fn(&Document) -> bool) -> Result<usize> {
        let tx = self.db.begin_write()?;
        let removed = {
            let mut table = tx.open_table(ITEMS_TABLE)?;
            let mut matches = Vec::new();
            for row in table.iter()? {
                let (key, value) = row?;
                let doc: Document = serde_json::from_slice(value.value())?;
                if pred(&doc) {
                    matches.push(key.value().to_string());
                }
            }
            for id in &matches {
                table.remove(id.as_str())?;
            }
            matches.len()
        };
        tx.commit()?;
        Ok(removed)
    }
}

fn doc_id(doc: &Document) -> Result<&str> {
    doc.get("id")
        .and_then(Value::as_str)
        .context("document is missing its id field")
}
