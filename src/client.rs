//! Client data layer for the item catalog API.
//!
//! Mirrors the four server verbs and keeps one query-keyed cache of list
//! results as the single client-side source of truth. Cached entries stay
//! fresh for [`CACHE_FRESHNESS`]; every successful mutation invalidates the
//! whole cache, so reads only ever reflect server-confirmed state.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{bail, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::store::Document;

/// How long a cached list result is served without re-fetching.
pub const CACHE_FRESHNESS: Duration = Duration::from_secs(30);

/// The typed client-side view of a stored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Server-generated unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Item price.
    pub price: f64,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    data: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct ItemEnvelope {
    data: Item,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    items: Vec<Item>,
    fetched_at: Instant,
}

/// HTTP client for the `/api/items` resource.
#[derive(Debug, Clone)]
pub struct ItemsClient {
    http: reqwest::Client,
    endpoint: Url,
    cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl ItemsClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: Url) -> Result<Self> {
        let endpoint = base_url.join("/api/items")?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            cache: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// List items matching the given query parameters.
    ///
    /// Serves from the cache while the entry for this exact query is fresh.
    pub async fn list(&self, query: &[(&str, &str)]) -> Result<Vec<Item>> {
        let key = cache_key(query);
        if let Some(entry) = self.cache.lock().get(&key) {
            if entry.fetched_at.elapsed() < CACHE_FRESHNESS {
                debug!("serving {key:?} from cache");
                return Ok(entry.items.clone());
            }
        }
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(query)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to fetch items");
        }
        let envelope: ListEnvelope = response.json().await?;
        self.cache.lock().insert(
            key,
            CacheEntry {
                items: envelope.data.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(envelope.data)
    }

    /// Create a new item and return it as stored by the server.
    pub async fn create(&self, name: &str, price: f64) -> Result<Item> {
        let body = serde_json::json!({ "name": name, "price": price });
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to add item");
        }
        let envelope: ItemEnvelope = response.json().await?;
        self.invalidate();
        Ok(envelope.data)
    }

    /// Merge `fields` into every item matching `id`, returning the updated
    /// items.
    pub async fn update(&self, id: &str, fields: &Document) -> Result<Vec<Item>> {
        let response = self
            .http
            .put(self.endpoint.clone())
            .query(&[("id", id)])
            .json(fields)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to update item");
        }
        let envelope: ListEnvelope = response.json().await?;
        self.invalidate();
        Ok(envelope.data)
    }

    /// Delete the item with the given id.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.endpoint.clone())
            .query(&[("id", id)])
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to delete item");
        }
        self.invalidate();
        Ok(())
    }

    /// Drop all cached list results. Called after every successful mutation;
    /// also available for explicit refreshes.
    pub fn invalidate(&self) {
        self.cache.lock().clear();
    }
}

fn cache_key(query: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
