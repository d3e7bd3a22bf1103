use super::gate::ProtectedPaths;
use crate::error::AccessError;
use crate::services::{DEFAULT_PLAN_COLLECTION, Quotas};

/// Shared gate settings used by both config and runtime state.
#[derive(Debug, Clone)]
pub(crate) struct GateSettings {
    pub(crate) protected: ProtectedPaths,
    pub(crate) login_path: String,
    pub(crate) upgrade_path: String,
    pub(crate) session_cookie_name: String,
    pub(crate) api_path: String,
    pub(crate) plan_collection: String,
    pub(crate) quotas: Quotas,
}

impl GateSettings {
    fn defaults() -> Self {
        Self {
            protected: ProtectedPaths::new(["/dashboard", "/flashcards"]),
            login_path: "/login".into(),
            upgrade_path: "/plans".into(),
            session_cookie_name: "session".into(),
            api_path: "/api".into(),
            plan_collection: DEFAULT_PLAN_COLLECTION.into(),
            quotas: Quotas::default(),
        }
    }

    /// Redirect target for authenticated Free users.
    pub(crate) fn upgrade_location(&self) -> String {
        format!("{}?upgrade=true", self.upgrade_path)
    }
}

/// Access gate configuration.
///
/// Use [`from_env()`](GateConfig::from_env) for convention-based setup,
/// or [`new()`](GateConfig::new) with `with_*` methods for full control.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub(super) settings: GateSettings,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GateConfig {
    /// Create config with defaults: `/dashboard` and `/flashcards` protected,
    /// `/login` and `/plans` as redirect targets, `session` cookie, `/api` routes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: GateSettings::defaults(),
        }
    }

    /// Create config from environment variables. Every variable is optional.
    ///
    /// - `GATE_PROTECTED_PATHS`: comma-separated path prefixes
    /// - `GATE_LOGIN_PATH`, `GATE_UPGRADE_PATH`: redirect targets
    /// - `GATE_SESSION_COOKIE`: session cookie name
    /// - `GATE_API_PATH`: prefix for the resource API routes
    /// - `GATE_PLAN_COLLECTION`: collection holding plan records
    /// - `GATE_FREE_NOTES_LIMIT`, `GATE_FREE_TASKS_LIMIT`: Free-plan quotas
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Config`] if a quota is not a non-negative integer,
    /// or if `GATE_PROTECTED_PATHS` is set but names no prefix.
    pub fn from_env() -> Result<Self, AccessError> {
        let mut config = Self::new();

        if let Ok(paths) = std::env::var("GATE_PROTECTED_PATHS") {
            config.settings.protected = parse_protected_paths(&paths)?;
        }
        if let Ok(path) = std::env::var("GATE_LOGIN_PATH") {
            config = config.with_login_path(path);
        }
        if let Ok(path) = std::env::var("GATE_UPGRADE_PATH") {
            config = config.with_upgrade_path(path);
        }
        if let Ok(name) = std::env::var("GATE_SESSION_COOKIE") {
            config = config.with_session_cookie_name(name);
        }
        if let Ok(path) = std::env::var("GATE_API_PATH") {
            config = config.with_api_path(path);
        }
        if let Ok(collection) = std::env::var("GATE_PLAN_COLLECTION") {
            config = config.with_plan_collection(collection);
        }

        let mut quotas = config.settings.quotas;
        if let Some(limit) = env_limit("GATE_FREE_NOTES_LIMIT")? {
            quotas.notes = limit;
        }
        if let Some(limit) = env_limit("GATE_FREE_TASKS_LIMIT")? {
            quotas.tasks = limit;
        }

        Ok(config.with_quotas(quotas))
    }

    /// Replace the protected path prefixes.
    #[must_use]
    pub fn with_protected_paths<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.protected = ProtectedPaths::new(prefixes);
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.settings.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_upgrade_path(mut self, path: impl Into<String>) -> Self {
        self.settings.upgrade_path = path.into();
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_api_path(mut self, path: impl Into<String>) -> Self {
        self.settings.api_path = path.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_plan_collection(mut self, collection: impl Into<String>) -> Self {
        self.settings.plan_collection = collection.into();
        self
    }

    #[must_use]
    pub fn with_quotas(mut self, quotas: Quotas) -> Self {
        self.settings.quotas = quotas;
        self
    }

    #[must_use]
    pub fn protected_paths(&self) -> &ProtectedPaths {
        &self.settings.protected
    }

    #[must_use]
    pub fn quotas(&self) -> Quotas {
        self.settings.quotas
    }
}

/// Parse a comma-separated prefix list. An empty list would open every page.
fn parse_protected_paths(value: &str) -> Result<ProtectedPaths, AccessError> {
    let prefixes: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if prefixes.is_empty() {
        return Err(AccessError::Config(
            "GATE_PROTECTED_PATHS: no path prefixes given".into(),
        ));
    }
    Ok(ProtectedPaths::new(prefixes))
}

fn env_limit(name: &str) -> Result<Option<u64>, AccessError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AccessError::Config(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}
