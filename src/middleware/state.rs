use std::sync::Arc;

use axum::http::HeaderValue;

use super::config::{GateConfig, GateSettings};
use crate::error::AccessError;
use crate::services::{SessionVerifier, SubscriptionResolver, UsageLimiter};
use crate::traits::{DocumentStore, IdentityProvider};

/// Shared state for the access gate and the resource API.
///
/// Cheap to clone: every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct GateState {
    verifier: SessionVerifier,
    resolver: SubscriptionResolver,
    limiter: UsageLimiter,
    pub(super) settings: Arc<GateSettings>,
}

impl GateState {
    /// Wire the verifier, resolver and limiter over one identity provider and
    /// one document store.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Config`] if a redirect target cannot be sent as a
    /// `Location` header.
    pub fn new<I, D>(config: GateConfig, identity: I, store: D) -> Result<Self, AccessError>
    where
        I: IdentityProvider,
        D: DocumentStore,
    {
        let settings = config.settings;

        for (name, location) in [
            ("login path", settings.login_path.clone()),
            ("upgrade path", settings.upgrade_location()),
        ] {
            check_location(name, &location)?;
        }

        for target in [&settings.login_path, &settings.upgrade_path] {
            if settings.protected.is_protected(target) {
                tracing::warn!(
                    path = %target,
                    "Redirect target is itself protected; users will loop"
                );
            }
        }

        let resolver =
            SubscriptionResolver::new(store).with_collection(settings.plan_collection.clone());
        let limiter = UsageLimiter::new(resolver.clone(), settings.quotas);

        Ok(Self {
            verifier: SessionVerifier::new(identity),
            resolver,
            limiter,
            settings: Arc::new(settings),
        })
    }

    #[must_use]
    pub fn verifier(&self) -> &SessionVerifier {
        &self.verifier
    }

    #[must_use]
    pub fn resolver(&self) -> &SubscriptionResolver {
        &self.resolver
    }

    #[must_use]
    pub fn limiter(&self) -> &UsageLimiter {
        &self.limiter
    }
}

// Redirect::to panics on values that are not valid header bytes.
fn check_location(name: &str, location: &str) -> Result<(), AccessError> {
    if location.is_empty() || HeaderValue::from_str(location).is_err() {
        return Err(AccessError::Config(format!(
            "{name} {location:?} is not a valid redirect location"
        )));
    }
    Ok(())
}
