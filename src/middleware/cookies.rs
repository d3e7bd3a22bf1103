use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::types::Credential;

/// Read the session artifact from the cookie jar.
pub(super) fn session_credential(jar: &CookieJar, name: &str) -> Option<Credential> {
    jar.get(name)
        .and_then(|c| Credential::session_cookie(c.value()))
}

/// Create removal cookie for the session.
pub(super) fn clear_session_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
