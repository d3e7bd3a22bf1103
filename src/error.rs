use crate::types::ResourceKind;

/// Failures raised by the identity client, key documents and stores.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Token verification error: {0}")]
    Token(String),
    /// For [`DocumentStore`](crate::traits::DocumentStore) implementations to box.
    #[error("Document store error: {0}")]
    Store(String),
    #[cfg(feature = "remote-keys")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Key document request failed with status {status}: {detail}")]
    KeyDocument { status: u16, detail: String },
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Request-level access failures.
///
/// Every guarded surface (page gate, API handlers, extractors) reports through
/// this one taxonomy so clients can branch on [`AccessError::code`].
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// No credential, or the credential failed verification.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Free-plan quota for a resource kind is exhausted.
    #[error("Free plan limit of {limit} {kind} reached")]
    LimitReached { kind: ResourceKind, limit: u64 },

    /// Free user on a Pro-only surface.
    #[error("Pro plan required")]
    PlanRequired,

    /// Required resource fields missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Identity provider or document store failure.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AccessError {
    /// Stable machine-readable code for API clients.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::LimitReached { .. } => "LIMIT_REACHED",
            Self::PlanRequired => "PLAN_REQUIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Upstream(_) | Self::Config(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the caller. Internal detail is never included.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthenticated => "Authentication required".into(),
            Self::LimitReached { kind, limit } => format!(
                "You have reached the Free plan limit of {limit} {kind}. \
                 Upgrade to Pro for unlimited {kind}."
            ),
            Self::PlanRequired => "This feature requires a Pro plan".into(),
            Self::Validation(msg) => msg.clone(),
            Self::Upstream(_) | Self::Config(_) => "Internal error".into(),
        }
    }
}

impl From<Error> for AccessError {
    fn from(e: Error) -> Self {
        match e {
            Error::Config(msg) => Self::Config(msg),
            other => Self::Upstream(other.to_string()),
        }
    }
}
