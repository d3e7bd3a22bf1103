use std::sync::Arc;

use crate::error::AccessError;
use crate::traits::{IdentityProvider, IdentityProviderDyn};
use crate::types::{Credential, UserId};

/// Verifies session credentials against the identity provider.
#[derive(Clone)]
pub struct SessionVerifier {
    provider: Arc<dyn IdentityProviderDyn>,
}

impl SessionVerifier {
    #[must_use]
    pub fn new<I: IdentityProvider>(provider: I) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Verify a credential and return the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthenticated`] for empty, malformed, expired or
    /// otherwise unverifiable credentials. Provider detail is logged, not returned.
    pub async fn verify(&self, credential: &Credential) -> Result<UserId, AccessError> {
        if credential.secret().is_empty() {
            return Err(AccessError::Unauthenticated);
        }

        let result = match credential {
            Credential::Bearer(token) => self.provider.verify_id_token_dyn(token).await,
            Credential::SessionCookie(artifact) => {
                self.provider.verify_session_artifact_dyn(artifact).await
            }
        };

        match result {
            Ok(user_id) if !user_id.as_str().is_empty() => Ok(user_id),
            Ok(_) => {
                tracing::warn!(
                    transport = %credential.transport(),
                    "Identity provider returned an empty user id"
                );
                Err(AccessError::Unauthenticated)
            }
            Err(e) => {
                tracing::debug!(
                    transport = %credential.transport(),
                    error = %e,
                    "Credential rejected"
                );
                Err(AccessError::Unauthenticated)
            }
        }
    }
}
