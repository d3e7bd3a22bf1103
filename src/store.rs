//! Documents and the in-process [`MemoryStore`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::traits::{BoxError, DocumentStore};
use crate::types::UserId;

/// A stored document with server-assigned id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
    pub data: JsonValue,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Document to insert. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner: UserId,
    pub data: JsonValue,
}

impl NewDocument {
    #[must_use]
    pub fn new(owner: UserId, data: JsonValue) -> Self {
        Self { owner, data }
    }
}

/// In-process document store.
///
/// Suitable for development servers and tests. Documents live in
/// per-collection ordered maps keyed by id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a document under a caller-chosen id, replacing any existing one.
    ///
    /// Used for records keyed by user id (plan records) that are written by
    /// processes outside the access layer.
    pub async fn put(&self, collection: &str, id: impl Into<String>, data: JsonValue) -> Document {
        let id = id.into();
        let now = OffsetDateTime::now_utc();
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_owned()).or_default();
        let created_at = docs.get(&id).map_or(now, |d| d.created_at);
        let document = Document {
            id: id.clone(),
            owner: None,
            data,
            created_at,
            updated_at: now,
        };
        docs.insert(id, document.clone());
        document
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BoxError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn count_owned(&self, collection: &str, owner: &UserId) -> Result<u64, BoxError> {
        let collections = self.collections.read().await;
        let count = collections.get(collection).map_or(0, |docs| {
            docs.values()
                .filter(|d| d.owner.as_ref() == Some(owner))
                .count()
        });
        Ok(count as u64)
    }

    async fn insert(&self, collection: &str, document: NewDocument) -> Result<Document, BoxError> {
        let now = OffsetDateTime::now_utc();
        let stored = Document {
            id: Ulid::new().to_string(),
            owner: Some(document.owner),
            data: document.data,
            created_at: now,
            updated_at: now,
        };
        self.collections
            .write()
            .await
            .entry(collection.to_owned())
            .or_default()
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }
}
