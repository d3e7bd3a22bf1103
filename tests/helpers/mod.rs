//! Shared fakes for integration tests.
//!
//! Both fakes count calls so tests can assert that a request made no lookups.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::body::{Body, to_bytes};
use axum::http::Response;
use planguard::middleware::{GateConfig, GateState};
use planguard::{
    BoxError, Document, DocumentStore, IdentityProvider, MemoryStore, NewDocument, UserId,
};
use serde_json::{Value as JsonValue, json};

pub const PLAN_COLLECTION: &str = "subscriptions";

/// Identity provider backed by fixed token tables.
#[derive(Default)]
pub struct FakeIdentity {
    id_tokens: HashMap<String, String>,
    sessions: HashMap<String, String>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_token(mut self, token: &str, user: &str) -> Self {
        self.id_tokens.insert(token.into(), user.into());
        self
    }

    pub fn with_session(mut self, artifact: &str, user: &str) -> Self {
        self.sessions.insert(artifact.into(), user.into());
        self
    }

    /// Make every verification fail as if the provider were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, table: &HashMap<String, String>, secret: &str) -> Result<UserId, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err("identity provider unavailable".into());
        }
        table
            .get(secret)
            .map(|u| UserId(u.clone()))
            .ok_or_else(|| "invalid credential".into())
    }
}

impl IdentityProvider for FakeIdentity {
    async fn verify_id_token(&self, token: &str) -> Result<UserId, BoxError> {
        self.lookup(&self.id_tokens, token)
    }

    async fn verify_session_artifact(&self, artifact: &str) -> Result<UserId, BoxError> {
        self.lookup(&self.sessions, artifact)
    }
}

/// [`MemoryStore`] wrapper counting reads and writes.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    failing: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_plan(&self, user: &str, plan: JsonValue) {
        self.inner
            .put(PLAN_COLLECTION, user, json!({ "plan": plan }))
            .await;
    }

    /// Insert `n` resources owned by `user` directly, bypassing the counters.
    pub async fn seed(&self, collection: &str, user: &str, n: usize) {
        for i in 0..n {
            self.inner
                .insert(
                    collection,
                    NewDocument::new(UserId(user.into()), json!({ "title": format!("seed {i}") })),
                )
                .await
                .unwrap();
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), BoxError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("document store unavailable".into());
        }
        Ok(())
    }
}

impl DocumentStore for CountingStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BoxError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get(collection, id).await
    }

    async fn count_owned(&self, collection: &str, owner: &UserId) -> Result<u64, BoxError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.count_owned(collection, owner).await
    }

    async fn insert(&self, collection: &str, document: NewDocument) -> Result<Document, BoxError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.insert(collection, document).await
    }
}

pub struct Harness {
    pub identity: Arc<FakeIdentity>,
    pub store: Arc<CountingStore>,
    pub state: GateState,
}

impl Harness {
    pub fn new(identity: FakeIdentity) -> Self {
        Self::with_config(identity, GateConfig::new())
    }

    pub fn with_config(identity: FakeIdentity, config: GateConfig) -> Self {
        let identity = Arc::new(identity);
        let store = Arc::new(CountingStore::new());
        let state = GateState::new(config, identity.clone(), store.clone()).unwrap();
        Self {
            identity,
            store,
            state,
        }
    }
}

pub async fn json_body(response: Response<Body>) -> JsonValue {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
