//! Identity client verifying PASETO v4.public credentials.
//!
//! ID tokens and session artifacts are both signed tokens; they differ only in
//! the expected issuer. The signing key is selected by the `kid` footer claim.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use pasetors::claims::ClaimsValidationRules;
use pasetors::keys::AsymmetricPublicKey;
use pasetors::token::UntrustedToken;
use pasetors::version4::V4;
use pasetors::{Public, public};
use serde_json::Value as JsonValue;
use tokio::sync::OnceCell;
use url::Url;

use crate::error::Error;
use crate::traits::{BoxError, IdentityProvider};
use crate::types::{KeyId, UserId};

const TOKEN_PREFIX: &str = "v4.public.";

/// Ed25519 public key (32 bytes) for token verification.
#[derive(Clone)]
pub struct PublicKey {
    bytes: [u8; 32],
}

impl PublicKey {
    /// Get the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey")
            .field(&hex::encode(self.bytes))
            .finish()
    }
}

/// Parses a hex-encoded Ed25519 public key (32 bytes) into a `PublicKey`.
///
/// # Errors
///
/// Returns `Error::Token` if the hex is invalid or the key length is not 32 bytes.
pub fn parse_public_key_hex(public_key_hex: &str) -> Result<PublicKey, Error> {
    let bytes =
        hex::decode(public_key_hex.trim()).map_err(|e| Error::Token(format!("invalid hex: {e}")))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
        Error::Token(format!("invalid key length: expected 32, got {}", b.len()))
    })?;
    Ok(PublicKey { bytes })
}

/// Verification keys indexed by key id.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<KeyId, PublicKey>,
}

impl KeySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kid: KeyId, key: PublicKey) {
        self.keys.insert(kid, key);
    }

    #[must_use]
    pub fn get(&self, kid: &KeyId) -> Option<&PublicKey> {
        self.keys.get(kid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn extend(&mut self, other: KeySet) {
        self.keys.extend(other.keys);
    }
}

/// Claims of a token whose signature and registered claims were verified.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    inner: JsonValue,
}

impl VerifiedClaims {
    /// Gets a claim value by key.
    #[must_use]
    pub fn get_claim(&self, key: &str) -> Option<&JsonValue> {
        self.inner.get(key)
    }

    /// The `sub` claim as a user identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::Token` if `sub` is missing, not a string, or empty.
    pub fn subject(&self) -> Result<UserId, Error> {
        self.get_claim("sub")
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| UserId(s.to_owned()))
            .ok_or_else(|| Error::Token("missing claim: sub".into()))
    }
}

/// Verifies a PASETO v4.public token against one key.
///
/// # Errors
///
/// Returns `Error::Token` if the token format is invalid, the signature
/// verification fails, `exp`/`nbf`/`iat` are out of range, or the
/// `iss`/`aud` claims do not match the expected values.
pub fn verify_v4_public_token(
    public_key: &PublicKey,
    token_str: &str,
    expected_issuer: &str,
    expected_audience: &str,
) -> Result<VerifiedClaims, Error> {
    if !token_str.starts_with(TOKEN_PREFIX) {
        return Err(Error::Token("invalid token format".into()));
    }

    let pk = AsymmetricPublicKey::<V4>::from(&public_key.bytes[..])
        .map_err(|e| Error::Token(e.to_string()))?;

    // exp, nbf and iat are validated by default
    let validation_rules = ClaimsValidationRules::new();

    let untrusted_token = UntrustedToken::<Public, V4>::try_from(token_str)
        .map_err(|e| Error::Token(e.to_string()))?;

    // footer is None: the signature still covers the footer bytes
    let trusted_token = public::verify(&pk, &untrusted_token, &validation_rules, None, None)
        .map_err(|e| Error::Token(e.to_string()))?;

    let payload = trusted_token
        .payload_claims()
        .ok_or_else(|| Error::Token("missing payload".into()))?;
    let payload_str = payload
        .to_string()
        .map_err(|e| Error::Token(e.to_string()))?;
    let claims: JsonValue =
        serde_json::from_str(&payload_str).map_err(|e| Error::Token(e.to_string()))?;

    expect_claim(&claims, "iss", expected_issuer)?;
    expect_claim(&claims, "aud", expected_audience)?;

    Ok(VerifiedClaims { inner: claims })
}

fn expect_claim(claims: &JsonValue, name: &str, expected: &str) -> Result<(), Error> {
    let actual = claims
        .get(name)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::Token(format!("missing claim: {name}")))?;
    if actual != expected {
        return Err(Error::Token(format!(
            "{name}: expected '{expected}', got '{actual}'"
        )));
    }
    Ok(())
}

/// Extract the key id from a token footer without verifying the signature.
///
/// # Errors
///
/// Returns `Error::Token` if the token format is invalid or the footer
/// does not contain a `kid` claim.
pub fn extract_kid_from_token(token_str: &str) -> Result<KeyId, Error> {
    let footer_bytes = extract_footer_from_token(token_str)?;
    let footer: JsonValue =
        serde_json::from_slice(&footer_bytes).map_err(|_| Error::Token("invalid footer".into()))?;

    footer
        .get("kid")
        .and_then(JsonValue::as_str)
        .map(|kid| KeyId(kid.to_owned()))
        .ok_or_else(|| Error::Token("missing footer claim: kid".into()))
}

fn extract_footer_from_token(token_str: &str) -> Result<Vec<u8>, Error> {
    if !token_str.starts_with(TOKEN_PREFIX) {
        return Err(Error::Token("invalid token format".into()));
    }

    let parts: Vec<&str> = token_str.split('.').collect();
    if parts.len() != 4 || parts[3].is_empty() {
        return Err(Error::Token("missing footer".into()));
    }

    URL_SAFE_NO_PAD
        .decode(parts[3])
        .map_err(|_| Error::Token("invalid footer".into()))
}

// ── Configuration ──────────────────────────────────────────────────

/// Identity provider configuration.
///
/// ```rust,ignore
/// let config = IdentityConfig::new(
///     "https://id.example.com",
///     "https://session.example.com",
///     "study-app",
/// )
/// .with_keys_url("https://id.example.com/.well-known/paseto-keys".parse()?);
/// ```
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    issuer: String,
    session_issuer: String,
    audience: String,
    keys_url: Option<Url>,
    static_keys: Vec<(KeyId, String)>,
}

impl IdentityConfig {
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        session_issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            session_issuer: session_issuer.into(),
            audience: audience.into(),
            keys_url: None,
            static_keys: Vec::new(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `IDP_ISSUER`: issuer of ID tokens
    /// - `IDP_SESSION_ISSUER`: issuer of session artifacts
    /// - `IDP_AUDIENCE`: expected `aud` claim (the application id)
    ///
    /// # Optional env vars
    /// - `IDP_KEYS_URL`: well-known key document URL
    /// - `IDP_KEY_ID` + `IDP_PUBLIC_KEY_HEX`: one statically configured key
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing, the URL is
    /// invalid, or only one of `IDP_KEY_ID`/`IDP_PUBLIC_KEY_HEX` is set.
    pub fn from_env() -> Result<Self, Error> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| Error::Config(format!("{name} is required")))
        };

        let mut config = Self::new(
            required("IDP_ISSUER")?,
            required("IDP_SESSION_ISSUER")?,
            required("IDP_AUDIENCE")?,
        );

        if let Ok(url_str) = std::env::var("IDP_KEYS_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("IDP_KEYS_URL: {e}")))?;
            config = config.with_keys_url(url);
        }

        match (std::env::var("IDP_KEY_ID"), std::env::var("IDP_PUBLIC_KEY_HEX")) {
            (Ok(kid), Ok(key_hex)) => config = config.with_key(KeyId(kid), key_hex),
            (Err(_), Err(_)) => {}
            _ => {
                return Err(Error::Config(
                    "IDP_KEY_ID and IDP_PUBLIC_KEY_HEX must be set together".into(),
                ));
            }
        }

        Ok(config)
    }

    /// Fetch signing keys from a well-known key document.
    #[must_use]
    pub fn with_keys_url(mut self, url: Url) -> Self {
        self.keys_url = Some(url);
        self
    }

    /// Add a statically configured signing key.
    #[must_use]
    pub fn with_key(mut self, kid: KeyId, public_key_hex: impl Into<String>) -> Self {
        self.static_keys.push((kid, public_key_hex.into()));
        self
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn session_issuer(&self) -> &str {
        &self.session_issuer
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[must_use]
    pub fn keys_url(&self) -> Option<&Url> {
        self.keys_url.as_ref()
    }

    fn static_key_set(&self) -> Result<KeySet, Error> {
        let mut keys = KeySet::new();
        for (kid, key_hex) in &self.static_keys {
            keys.insert(kid.clone(), parse_public_key_hex(key_hex)?);
        }
        Ok(keys)
    }
}

// ── Client ─────────────────────────────────────────────────────────

/// Identity-provider client holding the verification key set.
#[derive(Debug)]
pub struct IdentityClient {
    config: IdentityConfig,
    keys: KeySet,
}

impl IdentityClient {
    /// Build a client from statically configured keys only.
    ///
    /// # Errors
    ///
    /// Returns `Error::Token` if a configured key is malformed, or
    /// `Error::Config` if no key is configured.
    pub fn new(config: IdentityConfig) -> Result<Self, Error> {
        let keys = config.static_key_set()?;
        if keys.is_empty() {
            return Err(Error::Config("no signing keys configured".into()));
        }
        Ok(Self { config, keys })
    }

    /// Build a client from an already-loaded key set.
    #[must_use]
    pub fn with_key_set(config: IdentityConfig, keys: KeySet) -> Self {
        Self { config, keys }
    }

    /// Build a client, fetching the well-known key document if configured.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http`/`Error::KeyDocument` if the key document cannot be
    /// fetched, or `Error::Config` if no key ends up configured.
    pub async fn connect(config: IdentityConfig) -> Result<Self, Error> {
        let mut keys = config.static_key_set()?;

        if let Some(url) = config.keys_url() {
            keys.extend(fetch_key_set(url).await?);
        }

        if keys.is_empty() {
            return Err(Error::Config("no signing keys configured".into()));
        }
        tracing::info!(key_count = keys.len(), "Identity client initialized");
        Ok(Self { config, keys })
    }

    #[must_use]
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Verify a token issued by `expected_issuer` and return its subject.
    ///
    /// # Errors
    ///
    /// Returns `Error::Token` for unknown key ids and any verification failure.
    pub fn verify_token(&self, token: &str, expected_issuer: &str) -> Result<UserId, Error> {
        let kid = extract_kid_from_token(token)?;
        let key = self
            .keys
            .get(&kid)
            .ok_or_else(|| Error::Token(format!("unknown key id: {kid}")))?;
        verify_v4_public_token(key, token, expected_issuer, &self.config.audience)?.subject()
    }
}

impl IdentityProvider for IdentityClient {
    async fn verify_id_token(&self, token: &str) -> Result<UserId, BoxError> {
        Ok(self.verify_token(token, &self.config.issuer)?)
    }

    async fn verify_session_artifact(&self, artifact: &str) -> Result<UserId, BoxError> {
        Ok(self.verify_token(artifact, &self.config.session_issuer)?)
    }
}

#[cfg(feature = "remote-keys")]
async fn fetch_key_set(url: &Url) -> Result<KeySet, Error> {
    let response = reqwest::Client::new().get(url.clone()).send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        return Err(Error::KeyDocument { status, detail });
    }

    let document = response
        .json::<crate::well_known::WellKnownKeyDocument>()
        .await?;
    document.key_set()
}

#[cfg(not(feature = "remote-keys"))]
async fn fetch_key_set(url: &Url) -> Result<KeySet, Error> {
    Err(Error::Config(format!(
        "cannot fetch {url}: built without the `remote-keys` feature"
    )))
}

// ── Process-wide client ────────────────────────────────────────────

static SHARED: OnceCell<Arc<IdentityClient>> = OnceCell::const_new();

/// Initialize the process-wide identity client.
///
/// Idempotent: the first successful call wins and later calls return the same
/// handle, ignoring their `config`. A failed initialization may be retried.
///
/// # Errors
///
/// Propagates [`IdentityClient::connect`] failures.
pub async fn init_shared(config: IdentityConfig) -> Result<Arc<IdentityClient>, Error> {
    SHARED
        .get_or_try_init(|| async move { IdentityClient::connect(config).await.map(Arc::new) })
        .await
        .cloned()
}

/// The process-wide identity client, if initialized.
#[must_use]
pub fn shared() -> Option<Arc<IdentityClient>> {
    SHARED.get().cloned()
}
