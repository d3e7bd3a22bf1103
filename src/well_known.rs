use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::identity::{KeySet, parse_public_key_hex};
use crate::types::KeyId;

/// Signing-key document published by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct WellKnownKeyDocument {
    pub issuer: String,
    pub version: String,
    pub keys: Vec<WellKnownKey>,
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct WellKnownKey {
    pub kid: KeyId,
    pub public_key_hex: String,
    pub status: WellKnownKeyStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum WellKnownKeyStatus {
    Active,
    Retiring,
    Revoked,
}

impl WellKnownKeyStatus {
    /// Retiring keys still verify tokens issued before rotation.
    #[must_use]
    pub fn verifies_tokens(self) -> bool {
        matches!(self, Self::Active | Self::Retiring)
    }
}

impl WellKnownKeyDocument {
    /// Build the verification key set, skipping revoked keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Token`] if a usable key has malformed hex.
    pub fn key_set(&self) -> Result<KeySet, Error> {
        let mut keys = KeySet::new();
        for key in self.keys.iter().filter(|k| k.status.verifies_tokens()) {
            let public_key = parse_public_key_hex(&key.public_key_hex)
                .map_err(|e| Error::Token(format!("key {}: {e}", key.kid)))?;
            keys.insert(key.kid.clone(), public_key);
        }
        Ok(keys)
    }
}
