use serde::Serialize;

use super::subscription::SubscriptionResolver;
use crate::error::AccessError;
use crate::plan::PlanStatus;
use crate::traits::DocumentStoreDyn;
use crate::types::{ResourceKind, UserId};

/// Free-plan quotas per resource kind. Pro is unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quotas {
    pub notes: u64,
    pub tasks: u64,
}

impl Default for Quotas {
    fn default() -> Self {
        Self { notes: 5, tasks: 10 }
    }
}

impl Quotas {
    #[must_use]
    pub fn free_limit(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Notes => self.notes,
            ResourceKind::Tasks => self.tasks,
        }
    }
}

/// Outcome of a quota check.
///
/// `count` and `limit` are `None` for Pro users: nothing is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitCheck {
    pub kind: ResourceKind,
    pub is_pro: bool,
    pub count: Option<u64>,
    pub limit: Option<u64>,
    pub reached_limit: bool,
}

impl LimitCheck {
    /// Turn a reached limit into [`AccessError::LimitReached`].
    ///
    /// # Errors
    ///
    /// Returns `LimitReached` when `reached_limit` is set.
    pub fn ensure_within_limit(self) -> Result<Self, AccessError> {
        match (self.reached_limit, self.limit) {
            (true, Some(limit)) => Err(AccessError::LimitReached {
                kind: self.kind,
                limit,
            }),
            _ => Ok(self),
        }
    }
}

/// Compares a user's resource counts to the Free-plan quota.
///
/// The check runs before creation and is not atomic with it: two concurrent
/// creates may both pass and leave the user one over the limit.
#[derive(Clone)]
pub struct UsageLimiter {
    resolver: SubscriptionResolver,
    quotas: Quotas,
}

impl UsageLimiter {
    /// Create a limiter that counts in the resolver's store.
    #[must_use]
    pub fn new(resolver: SubscriptionResolver, quotas: Quotas) -> Self {
        Self { resolver, quotas }
    }

    #[must_use]
    pub fn quotas(&self) -> Quotas {
        self.quotas
    }

    /// Resolve the plan, then check the quota for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Upstream`] if the plan lookup or count fails.
    pub async fn check(&self, user_id: &UserId, kind: ResourceKind) -> Result<LimitCheck, AccessError> {
        let plan = self.resolver.resolve(user_id).await?;
        self.check_with_plan(user_id, kind, plan).await
    }

    /// Check the quota for an already-resolved plan.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Upstream`] if counting fails.
    pub async fn check_with_plan(
        &self,
        user_id: &UserId,
        kind: ResourceKind,
        plan: PlanStatus,
    ) -> Result<LimitCheck, AccessError> {
        if plan.is_pro {
            return Ok(LimitCheck {
                kind,
                is_pro: true,
                count: None,
                limit: None,
                reached_limit: false,
            });
        }

        let limit = self.quotas.free_limit(kind);
        let count = self
            .resolver
            .store()
            .count_owned_dyn(kind.collection(), user_id)
            .await
            .map_err(|e| AccessError::Upstream(format!("counting {kind} for {user_id}: {e}")))?;

        let reached_limit = count >= limit;
        tracing::debug!(user_id = %user_id, kind = %kind, count, limit, reached_limit, "Checked quota");

        Ok(LimitCheck {
            kind,
            is_pro: false,
            count: Some(count),
            limit: Some(limit),
            reached_limit,
        })
    }

    /// Boolean projection of [`check`](Self::check).
    ///
    /// # Errors
    ///
    /// Same as [`check`](Self::check).
    pub async fn has_reached_limit(
        &self,
        user_id: &UserId,
        kind: ResourceKind,
    ) -> Result<bool, AccessError> {
        Ok(self.check(user_id, kind).await?.reached_limit)
    }
}
