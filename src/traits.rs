use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::store::{Document, NewDocument};
use crate::types::UserId;

/// Error type returned by consumer-provided collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Identity provider that verifies credentials.
///
/// Both methods are read-only and return the verified user identifier.
/// [`IdentityClient`](crate::identity::IdentityClient) is the bundled implementation.
///
/// # Example
///
/// ```rust,ignore
/// impl IdentityProvider for MyProvider {
///     async fn verify_id_token(&self, token: &str) -> Result<UserId, BoxError> {
///         let claims = self.admin.verify_id_token(token).await?;
///         Ok(UserId(claims.uid))
///     }
///
///     async fn verify_session_artifact(&self, artifact: &str) -> Result<UserId, BoxError> {
///         let claims = self.admin.verify_session_cookie(artifact).await?;
///         Ok(UserId(claims.uid))
///     }
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Verify a short-lived ID token (bearer transport).
    fn verify_id_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<UserId, BoxError>> + Send;

    /// Verify a long-lived session artifact (cookie transport).
    fn verify_session_artifact(
        &self,
        artifact: &str,
    ) -> impl Future<Output = Result<UserId, BoxError>> + Send;
}

/// Remote document store.
///
/// Plan records are read with [`get`](DocumentStore::get) keyed by user id;
/// resources are counted per owner and inserted with server-assigned ids and
/// timestamps.
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetch one document by id.
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>, BoxError>> + Send;

    /// Count documents in `collection` owned by `owner`.
    fn count_owned(
        &self,
        collection: &str,
        owner: &UserId,
    ) -> impl Future<Output = Result<u64, BoxError>> + Send;

    /// Insert a new document. The store assigns id and timestamps.
    fn insert(
        &self,
        collection: &str,
        document: NewDocument,
    ) -> impl Future<Output = Result<Document, BoxError>> + Send;
}

impl<T: IdentityProvider> IdentityProvider for Arc<T> {
    fn verify_id_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<UserId, BoxError>> + Send {
        (**self).verify_id_token(token)
    }

    fn verify_session_artifact(
        &self,
        artifact: &str,
    ) -> impl Future<Output = Result<UserId, BoxError>> + Send {
        (**self).verify_session_artifact(artifact)
    }
}

impl<T: DocumentStore> DocumentStore for Arc<T> {
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>, BoxError>> + Send {
        (**self).get(collection, id)
    }

    fn count_owned(
        &self,
        collection: &str,
        owner: &UserId,
    ) -> impl Future<Output = Result<u64, BoxError>> + Send {
        (**self).count_owned(collection, owner)
    }

    fn insert(
        &self,
        collection: &str,
        document: NewDocument,
    ) -> impl Future<Output = Result<Document, BoxError>> + Send {
        (**self).insert(collection, document)
    }
}

// ── Object-safe wrappers (needed for Arc<dyn>) ─────────────────────

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub(crate) trait IdentityProviderDyn: Send + Sync {
    fn verify_id_token_dyn<'a>(&'a self, token: &'a str)
    -> BoxFuture<'a, Result<UserId, BoxError>>;

    fn verify_session_artifact_dyn<'a>(
        &'a self,
        artifact: &'a str,
    ) -> BoxFuture<'a, Result<UserId, BoxError>>;
}

impl<T: IdentityProvider> IdentityProviderDyn for T {
    fn verify_id_token_dyn<'a>(
        &'a self,
        token: &'a str,
    ) -> BoxFuture<'a, Result<UserId, BoxError>> {
        Box::pin(self.verify_id_token(token))
    }

    fn verify_session_artifact_dyn<'a>(
        &'a self,
        artifact: &'a str,
    ) -> BoxFuture<'a, Result<UserId, BoxError>> {
        Box::pin(self.verify_session_artifact(artifact))
    }
}

pub(crate) trait DocumentStoreDyn: Send + Sync {
    fn get_dyn<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, BoxError>>;

    fn count_owned_dyn<'a>(
        &'a self,
        collection: &'a str,
        owner: &'a UserId,
    ) -> BoxFuture<'a, Result<u64, BoxError>>;

    fn insert_dyn<'a>(
        &'a self,
        collection: &'a str,
        document: NewDocument,
    ) -> BoxFuture<'a, Result<Document, BoxError>>;
}

impl<T: DocumentStore> DocumentStoreDyn for T {
    fn get_dyn<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, BoxError>> {
        Box::pin(self.get(collection, id))
    }

    fn count_owned_dyn<'a>(
        &'a self,
        collection: &'a str,
        owner: &'a UserId,
    ) -> BoxFuture<'a, Result<u64, BoxError>> {
        Box::pin(self.count_owned(collection, owner))
    }

    fn insert_dyn<'a>(
        &'a self,
        collection: &'a str,
        document: NewDocument,
    ) -> BoxFuture<'a, Result<Document, BoxError>> {
        Box::pin(self.insert(collection, document))
    }
}
