use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use super::cookies;
use super::state::GateState;
use crate::error::AccessError;
use crate::types::{Credential, Transport, UserId};

/// Verified caller.
///
/// Use as an Axum extractor in route handlers. Returns `401 Unauthorized`
/// with code `UNAUTHENTICATED` if no valid credential is presented.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}", user.user_id)
/// }
///
/// // Optional: accessible to both authenticated and anonymous users
/// async fn landing(user: Option<AuthUser>) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Welcome back, {}", u.user_id),
///         None => "Welcome".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Identifier from the verified credential.
    pub user_id: UserId,
    /// Transport the credential arrived on.
    pub transport: Transport,
}

impl<S> FromRequestParts<S> for AuthUser
where
    GateState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already verified by the access gate or an earlier extractor
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let state = GateState::from_ref(state);
        let credential = request_credential(&parts.headers, &state.settings.session_cookie_name)?;
        let user_id = state.verifier().verify(&credential).await?;

        let user = AuthUser {
            user_id,
            transport: credential.transport(),
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    GateState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AccessError::Unauthenticated) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Verified caller on the Pro plan.
///
/// Rejects Free users with `403 Forbidden` and code `PLAN_REQUIRED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProUser(pub AuthUser);

impl<S> FromRequestParts<S> for ProUser
where
    GateState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        let plan = GateState::from_ref(state)
            .resolver()
            .resolve(&user.user_id)
            .await?;

        if !plan.is_pro {
            tracing::info!(user_id = %user.user_id, "Pro plan required");
            return Err(AccessError::PlanRequired);
        }
        Ok(Self(user))
    }
}

/// Pick the API credential: the `Authorization` header when present,
/// otherwise the session cookie.
///
/// A present but malformed header is rejected outright; the cookie is not
/// consulted in that case.
pub(super) fn request_credential(
    headers: &HeaderMap,
    cookie_name: &str,
) -> Result<Credential, AccessError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AccessError::Unauthenticated)?;
        return Credential::from_authorization(value).ok_or(AccessError::Unauthenticated);
    }

    let jar = CookieJar::from_headers(headers);
    cookies::session_credential(&jar, cookie_name).ok_or(AccessError::Unauthenticated)
}

/// Pick the page credential: the session cookie when present, otherwise a
/// well-formed bearer header.
///
/// A valid cookie is not overridden by a bad header.
pub(super) fn page_credential(headers: &HeaderMap, cookie_name: &str) -> Option<Credential> {
    let jar = CookieJar::from_headers(headers);
    cookies::session_credential(&jar, cookie_name).or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(Credential::from_authorization)
    })
}
