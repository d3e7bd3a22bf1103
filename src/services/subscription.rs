use std::sync::Arc;

use crate::error::AccessError;
use crate::plan::PlanStatus;
use crate::traits::{DocumentStore, DocumentStoreDyn};
use crate::types::UserId;

/// Collection holding plan records keyed by user id.
pub const DEFAULT_PLAN_COLLECTION: &str = "subscriptions";

/// Resolves a user's plan from the document store.
///
/// Every call re-reads the store; plan changes made by billing take effect on
/// the next request.
#[derive(Clone)]
pub struct SubscriptionResolver {
    store: Arc<dyn DocumentStoreDyn>,
    collection: String,
}

impl SubscriptionResolver {
    #[must_use]
    pub fn new<D: DocumentStore>(store: D) -> Self {
        Self {
            store: Arc::new(store),
            collection: DEFAULT_PLAN_COLLECTION.into(),
        }
    }

    /// Override the plan record collection.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Resolve the plan for `user_id`. A missing record is Free.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Upstream`] if the store lookup fails.
    pub async fn resolve(&self, user_id: &UserId) -> Result<PlanStatus, AccessError> {
        let record = self
            .store
            .get_dyn(&self.collection, user_id.as_str())
            .await
            .map_err(|e| AccessError::Upstream(format!("plan lookup for {user_id}: {e}")))?;

        let status = PlanStatus::from_document(record.as_ref().map(|doc| &doc.data));
        tracing::debug!(
            user_id = %user_id,
            plan = status.name(),
            has_record = record.is_some(),
            "Resolved plan"
        );
        Ok(status)
    }

    pub(crate) fn store(&self) -> &Arc<dyn DocumentStoreDyn> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::{Document, MemoryStore, NewDocument};
    use crate::traits::BoxError;

    fn user(id: &str) -> UserId {
        UserId(id.to_string())
    }

    async fn resolver_with(records: &[(&str, serde_json::Value)]) -> SubscriptionResolver {
        let store = MemoryStore::new();
        for (id, data) in records {
            store.put(DEFAULT_PLAN_COLLECTION, *id, data.clone()).await;
        }
        SubscriptionResolver::new(store)
    }

    #[tokio::test]
    async fn legacy_shapes_resolve_alike() {
        let resolver = resolver_with(&[
            ("string", json!({ "plan": "Pro" })),
            ("object", json!({ "plan": { "name": "pro" } })),
            ("free", json!({ "plan": "free" })),
        ])
        .await;

        assert!(resolver.resolve(&user("string")).await.unwrap().is_pro);
        assert!(resolver.resolve(&user("object")).await.unwrap().is_pro);
        assert!(!resolver.resolve(&user("free")).await.unwrap().is_pro);
    }

    #[tokio::test]
    async fn missing_record_is_free_not_an_error() {
        let resolver = resolver_with(&[]).await;
        assert_eq!(
            resolver.resolve(&user("nobody")).await.unwrap(),
            PlanStatus::FREE
        );
    }

    #[tokio::test]
    async fn custom_collection_is_used() {
        let store = MemoryStore::new();
        store.put("users", "u1", json!({ "plan": "pro" })).await;
        let resolver = SubscriptionResolver::new(store).with_collection("users");

        assert_eq!(resolver.collection(), "users");
        assert!(resolver.resolve(&user("u1")).await.unwrap().is_pro);
    }

    struct FailingStore;

    impl DocumentStore for FailingStore {
        async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, BoxError> {
            Err("deadline exceeded".into())
        }

        async fn count_owned(&self, _: &str, _: &UserId) -> Result<u64, BoxError> {
            Err("deadline exceeded".into())
        }

        async fn insert(&self, _: &str, _: NewDocument) -> Result<Document, BoxError> {
            Err("deadline exceeded".into())
        }
    }

    #[tokio::test]
    async fn store_failure_is_upstream() {
        let resolver = SubscriptionResolver::new(FailingStore);
        let err = resolver.resolve(&user("u1")).await.unwrap_err();
        assert!(matches!(err, AccessError::Upstream(_)));
    }
}
