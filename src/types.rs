use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Verified user identifier (the `sub` claim of a verified credential).
///
/// Only produced by [`SessionVerifier::verify`](crate::services::SessionVerifier::verify)
/// or by an [`IdentityProvider`](crate::traits::IdentityProvider). Never built from
/// client-supplied request fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Signing key identifier carried in the token footer (`kid`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct KeyId(pub String);

/// How a credential reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Transport {
    /// `Authorization: Bearer <id token>`.
    #[display("bearer")]
    Bearer,
    /// Long-lived session artifact in the session cookie.
    #[display("session_cookie")]
    SessionCookie,
}

/// Opaque session credential.
///
/// Holding a `Credential` guarantees a non-empty secret; nothing else about its
/// structure is inspected before verification.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    SessionCookie(String),
}

impl Credential {
    /// Parse an `Authorization` header value. Only the `Bearer` scheme is accepted.
    #[must_use]
    pub fn from_authorization(header: &str) -> Option<Self> {
        let (scheme, token) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then(|| Self::Bearer(token.to_owned()))
    }

    /// Wrap a session cookie value.
    #[must_use]
    pub fn session_cookie(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        (!value.is_empty()).then_some(Self::SessionCookie(value))
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        match self {
            Self::Bearer(s) | Self::SessionCookie(s) => s,
        }
    }

    #[must_use]
    pub fn transport(&self) -> Transport {
        match self {
            Self::Bearer(_) => Transport::Bearer,
            Self::SessionCookie(_) => Transport::SessionCookie,
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential")
            .field(&self.transport())
            .field(&"<redacted>")
            .finish()
    }
}

/// Quota-limited resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[display("notes")]
    Notes,
    #[display("tasks")]
    Tasks,
}

impl ResourceKind {
    pub const ALL: [Self; 2] = [Self::Notes, Self::Tasks];

    /// Document collection holding resources of this kind.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Tasks => "tasks",
        }
    }
}
