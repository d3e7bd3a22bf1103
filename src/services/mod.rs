//! Shared authorization services.
//!
//! The page gate and every guarded API handler call these same services, so
//! there is one verification path, one plan rule and one quota rule.

mod limiter;
mod subscription;
mod verifier;

pub use limiter::{LimitCheck, Quotas, UsageLimiter};
pub use subscription::{DEFAULT_PLAN_COLLECTION, SubscriptionResolver};
pub use verifier::SessionVerifier;
