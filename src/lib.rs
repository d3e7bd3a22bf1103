#![doc = include_str!("../README.md")]

pub mod error;
pub mod identity;
#[cfg(feature = "middleware")]
pub mod middleware;
pub mod plan;
pub mod services;
pub mod store;
pub mod traits;
pub mod types;
pub mod well_known;

// Re-exports for convenient access
pub use error::{AccessError, Error};
pub use identity::{
    IdentityClient, IdentityConfig, KeySet, PublicKey, VerifiedClaims, extract_kid_from_token,
    parse_public_key_hex, verify_v4_public_token,
};
pub use plan::{PlanField, PlanRecord, PlanStatus};
pub use services::{LimitCheck, Quotas, SessionVerifier, SubscriptionResolver, UsageLimiter};
pub use store::{Document, MemoryStore, NewDocument};
pub use traits::{BoxError, DocumentStore, IdentityProvider};
pub use types::{Credential, KeyId, ResourceKind, Transport, UserId};
pub use well_known::{WellKnownKey, WellKnownKeyDocument, WellKnownKeyStatus};
