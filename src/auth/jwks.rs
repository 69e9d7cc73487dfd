// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! The cache holds one immutable [`KeySet`] snapshot behind an `Arc`. A
//! refresh builds a whole new snapshot and swaps the pointer, so readers
//! either see the old map or the new one, never a mix. Refreshes only
//! happen when a token names a `kid` the snapshot does not know; there is
//! no TTL.
//!
//! Concurrent misses may each trigger a fetch. Duplicate fetches are
//! accepted; the last one to finish wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use base64ct::{Base64Url, Encoding};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::error::AuthError;

/// One published key, as found in the `keys` array of a JWKS document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyRecord {
    /// Key identifier (`kid`)
    #[serde(default)]
    pub kid: String,
    /// Key type (`kty`), `RSA` for every key this service can use
    #[serde(default)]
    pub kty: Option<String>,
    /// Declared algorithm (`alg`), informational only
    #[serde(default)]
    pub alg: Option<String>,
    /// Intended usage (`use`)
    #[serde(default, rename = "use")]
    pub usage: Option<String>,
    /// RSA modulus, base64url
    #[serde(default)]
    pub n: Option<String>,
    /// RSA public exponent, base64url
    #[serde(default)]
    pub e: Option<String>,
}

impl KeyRecord {
    /// Turn the record into an RSA public key usable for RS256 verification.
    ///
    /// `n` and `e` are big-endian unsigned integers, base64url encoded. Most
    /// publishers strip the `=` padding, which is restored before decoding.
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        if let Some(kty) = self.kty.as_deref() {
            if kty != "RSA" {
                return Err(AuthError::InvalidSigningKey(format!(
                    "unsupported key type {kty}"
                )));
            }
        }

        let n = self
            .n
            .as_deref()
            .ok_or_else(|| AuthError::InvalidSigningKey("missing modulus".into()))?;
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| AuthError::InvalidSigningKey("missing exponent".into()))?;

        let modulus = decode_b64url(n)
            .map_err(|err| AuthError::InvalidSigningKey(format!("modulus: {err}")))?;
        let exponent = decode_b64url(e)
            .map_err(|err| AuthError::InvalidSigningKey(format!("exponent: {err}")))?;

        if exponent.iter().all(|b| *b == 0) {
            return Err(AuthError::InvalidSigningKey("zero or empty exponent".into()));
        }
        let bits = modulus_bits(&modulus);
        if bits < MIN_MODULUS_BITS {
            return Err(AuthError::InvalidSigningKey(format!(
                "modulus is {bits} bits, need at least {MIN_MODULUS_BITS}"
            )));
        }

        Ok(DecodingKey::from_rsa_raw_components(&modulus, &exponent))
    }
}

/// Smallest RSA modulus accepted for RS256.
const MIN_MODULUS_BITS: usize = 2048;

/// Bit length of a big-endian unsigned integer.
fn modulus_bits(bytes: &[u8]) -> usize {
    match bytes.iter().position(|b| *b != 0) {
        Some(i) => (bytes.len() - i) * 8 - bytes[i].leading_zeros() as usize,
        None => 0,
    }
}

/// Decode base64url, restoring the padding first.
fn decode_b64url(value: &str) -> Result<Vec<u8>, base64ct::Error> {
    let pad = (4 - value.len() % 4) % 4;
    let mut padded = String::with_capacity(value.len() + pad);
    padded.push_str(value);
    padded.extend(std::iter::repeat_n('=', pad));
    Base64Url::decode_vec(&padded)
}

/// Wire shape of a JWKS response.
#[derive(Debug, Deserialize)]
struct KeySetDocument {
    #[serde(default)]
    keys: Vec<KeyRecord>,
}

/// Snapshot of published keys indexed by `kid`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: HashMap<String, KeyRecord>,
}

impl KeySet {
    /// Parse a JWKS document. Records without a `kid` cannot be selected
    /// by any token and are dropped.
    pub fn from_json(body: &[u8]) -> Result<Self, AuthError> {
        let document: KeySetDocument = serde_json::from_slice(body)
            .map_err(|e| AuthError::KeySetFetch(format!("invalid JWKS document: {e}")))?;
        Ok(document.keys.into_iter().collect())
    }

    pub fn get(&self, kid: &str) -> Option<&KeyRecord> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Published key identifiers, sorted.
    pub fn kids(&self) -> Vec<&str> {
        let mut kids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        kids.sort_unstable();
        kids
    }
}

impl FromIterator<KeyRecord> for KeySet {
    fn from_iter<I: IntoIterator<Item = KeyRecord>>(iter: I) -> Self {
        let keys = iter
            .into_iter()
            .filter(|record| {
                if record.kid.is_empty() {
                    tracing::warn!("Skipping JWKS entry without kid");
                    false
                } else {
                    true
                }
            })
            .map(|record| (record.kid.clone(), record))
            .collect();
        Self { keys }
    }
}

/// Somewhere a fresh [`KeySet`] can be loaded from.
///
/// Production uses [`HttpKeySource`]; tests plug in scripted sources.
pub trait KeySource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<KeySet, AuthError>> + Send;
}

/// Default bound on a single JWKS download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches the key set over HTTP(S) with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    jwks_url: String,
    client: reqwest::Client,
}

impl HttpKeySource {
    /// Create a new HTTP key source.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint (e.g. `https://idp.example.com/.well-known/jwks.json`)
    /// - `timeout`: Upper bound for connect plus response
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::KeySetFetch(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            client,
        })
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }
}

impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<KeySet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeySetFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySetFetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::KeySetFetch(e.to_string()))?;

        KeySet::from_json(&body)
    }
}

/// Shared, refreshable view of the published keys.
pub struct KeyCache<S> {
    source: S,
    current: RwLock<Arc<KeySet>>,
}

impl<S: KeySource> KeyCache<S> {
    /// Fetch the initial snapshot. Fails if the source is unreachable.
    pub async fn load(source: S) -> Result<Self, AuthError> {
        let initial = source.fetch().await?;
        tracing::info!(keys = initial.len(), "Loaded JWKS");
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(initial)),
        })
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> Arc<KeySet> {
        self.current.read().await.clone()
    }

    /// Re-fetch and publish a new snapshot. On failure the previous
    /// snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<KeySet>, AuthError> {
        let fresh = Arc::new(self.source.fetch().await?);
        tracing::info!(keys = fresh.len(), "Refreshed JWKS");
        *self.current.write().await = fresh.clone();
        Ok(fresh)
    }

    /// Find the record for `kid`, refreshing at most once on a miss.
    pub async fn resolve(&self, kid: &str) -> Result<KeyRecord, AuthError> {
        if let Some(record) = self.snapshot().await.get(kid) {
            return Ok(record.clone());
        }

        tracing::debug!(kid, "kid not cached, refreshing JWKS");
        self.refresh()
            .await?
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
