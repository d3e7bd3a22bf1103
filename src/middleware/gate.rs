use axum::Router;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};

use super::extractor::{AuthUser, page_credential};
use super::state::GateState;

/// Static set of protected path prefixes.
///
/// A path is protected when it equals a prefix or is nested under it:
/// `/dashboard` covers `/dashboard` and `/dashboard/stats`, not `/dashboards`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedPaths {
    prefixes: Vec<String>,
}

impl ProtectedPaths {
    /// Build from prefixes. A missing leading `/` is added and trailing `/` dropped.
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut prefixes: Vec<String> = prefixes
            .into_iter()
            .map(|p| {
                let p = p.into();
                let trimmed = p.trim().trim_end_matches('/');
                if trimmed.starts_with('/') {
                    trimmed.to_string()
                } else {
                    format!("/{trimmed}")
                }
            })
            .collect();
        prefixes.sort();
        prefixes.dedup();
        Self { prefixes }
    }

    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            // "/" normalizes to "/" and covers everything
            if prefix == "/" {
                return true;
            }
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

/// Decision for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Path is not protected; no lookups were made.
    PassThrough,
    /// Verified Pro user.
    Forward(AuthUser),
    /// Missing or invalid session, or a lookup failed.
    RedirectLogin,
    /// Verified Free user.
    RedirectUpgrade,
}

/// Decide what happens to a request for `path`.
///
/// Pages authenticate with the session cookie, falling back to a bearer ID token.
pub async fn evaluate(state: &GateState, path: &str, headers: &HeaderMap) -> GateOutcome {
    let settings = &state.settings;
    if !settings.protected.is_protected(path) {
        return GateOutcome::PassThrough;
    }

    let Some(credential) = page_credential(headers, &settings.session_cookie_name) else {
        tracing::debug!(path = %path, "No credential, redirecting to login");
        return GateOutcome::RedirectLogin;
    };

    let user_id = match state.verifier().verify(&credential).await {
        Ok(user_id) => user_id,
        Err(_) => {
            tracing::debug!(path = %path, "Session rejected, redirecting to login");
            return GateOutcome::RedirectLogin;
        }
    };

    match state.resolver().resolve(&user_id).await {
        Ok(plan) if plan.is_pro => {
            tracing::debug!(user_id = %user_id, path = %path, "Pro access granted");
            GateOutcome::Forward(AuthUser {
                user_id,
                transport: credential.transport(),
            })
        }
        Ok(_) => {
            tracing::info!(user_id = %user_id, path = %path, "Free plan, redirecting to upgrade");
            GateOutcome::RedirectUpgrade
        }
        Err(e) => {
            tracing::error!(user_id = %user_id, path = %path, error = %e, "Plan lookup failed");
            GateOutcome::RedirectLogin
        }
    }
}

/// Axum middleware applying [`evaluate`] to every request.
///
/// Forwarded requests carry the [`AuthUser`] in their extensions, where the
/// extractor picks it up without verifying again.
pub async fn access_gate(
    State(state): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let outcome = evaluate(&state, &path, request.headers()).await;

    match outcome {
        GateOutcome::PassThrough => next.run(request).await,
        GateOutcome::Forward(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        GateOutcome::RedirectLogin => Redirect::to(&state.settings.login_path).into_response(),
        GateOutcome::RedirectUpgrade => {
            Redirect::to(&state.settings.upgrade_location()).into_response()
        }
    }
}

/// Wrap `router` with the access gate.
pub fn protect<S>(router: Router<S>, state: GateState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(state, access_gate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_are_protected() {
        let paths = ProtectedPaths::new(["/dashboard", "/flashcards"]);
        assert!(paths.is_protected("/dashboard"));
        assert!(paths.is_protected("/dashboard/"));
        assert!(paths.is_protected("/dashboard/stats"));
        assert!(paths.is_protected("/flashcards/deck/1"));
    }

    #[test]
    fn siblings_and_public_paths_are_not() {
        let paths = ProtectedPaths::new(["/dashboard"]);
        assert!(!paths.is_protected("/dashboards"));
        assert!(!paths.is_protected("/dashboard-old"));
        assert!(!paths.is_protected("/"));
        assert!(!paths.is_protected("/login"));
        assert!(!paths.is_protected("/plans"));
    }

    #[test]
    fn prefixes_are_normalized() {
        let paths = ProtectedPaths::new(["dashboard/", " /flashcards ", "/dashboard"]);
        assert_eq!(paths.prefixes(), ["/dashboard", "/flashcards"]);
    }

    #[test]
    fn root_prefix_covers_everything() {
        let paths = ProtectedPaths::new(["/"]);
        assert_eq!(paths.prefixes(), ["/"]);
        assert!(paths.is_protected("/"));
        assert!(paths.is_protected("/anything"));
    }

    #[test]
    fn empty_set_protects_nothing() {
        assert!(!ProtectedPaths::default().is_protected("/dashboard"));
    }
}
