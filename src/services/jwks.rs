// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON Web Key Set fetching and caching.
//!
//! The cache refreshes lazily: when its entry has expired, or when asked
//! for a kid it does not know. Refreshes are serialized, and an unknown kid
//! triggers a refetch at most once per [`DEFAULT_MIN_REFRESH_INTERVAL`], so
//! a flood of tokens with made-up kids costs one JWKS request.

use anyhow::Context;
use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum time between refetches caused by an unknown kid.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// A JWKS document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// A single JSON Web Key. Only the RSA members are modelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default)]
    pub kid: String,
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default)]
    pub n: String,
    #[serde(default)]
    pub e: String,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
}

/// Where a key set comes from.
#[async_trait]
pub trait JwksSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<Jwks>;
}

/// Fetches a key set over HTTPS.
pub struct HttpJwksSource {
    http_client: reqwest::Client,
    url: String,
}

impl HttpJwksSource {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl JwksSource for HttpJwksSource {
    async fn fetch(&self) -> anyhow::Result<Jwks> {
        tracing::debug!(url = %self.url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("JWKS request to {} failed", self.url))?;

        if !response.status().is_success() {
            anyhow::bail!("JWKS request returned status {}", response.status());
        }

        response.json().await.context("invalid JWKS JSON")
    }
}

/// Serves a fixed key set and counts fetches. Used in tests and local runs.
#[derive(Default)]
pub struct StaticJwksSource {
    jwks: std::sync::RwLock<Jwks>,
    fetches: AtomicUsize,
}

impl StaticJwksSource {
    pub fn new(jwks: Jwks) -> Self {
        Self {
            jwks: std::sync::RwLock::new(jwks),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace the served keys (simulates rotation).
    pub fn set_keys(&self, jwks: Jwks) {
        if let Ok(mut guard) = self.jwks.write() {
            *guard = jwks;
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JwksSource for StaticJwksSource {
    async fn fetch(&self) -> anyhow::Result<Jwks> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.jwks
            .read()
            .map(|jwks| jwks.clone())
            .map_err(|_| anyhow::anyhow!("static JWKS lock poisoned"))
    }
}

struct CacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
    expires_at: Instant,
}

/// Time-bounded cache of decoding keys, keyed by kid.
pub struct JwksCache {
    source: Arc<dyn JwksSource>,
    ttl: Duration,
    min_refresh_interval: Duration,
    entry: RwLock<Option<CacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl JwksCache {
    pub fn new(source: Arc<dyn JwksSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            entry: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Override how soon an unknown kid may trigger another fetch.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Decoding key for `kid`.
    ///
    /// Returns `Ok(None)` when the kid is still unknown after a refresh, or
    /// when the keys were fetched too recently to try again. Fetch failures
    /// are returned as errors.
    pub async fn key_for(&self, kid: &str) -> anyhow::Result<Option<Arc<DecodingKey>>> {
        match self.lookup(kid).await {
            Lookup::Found(key) => return Ok(Some(key)),
            Lookup::Missing | Lookup::Expired => {}
        }

        self.refresh_for(kid).await?;

        match self.lookup(kid).await {
            Lookup::Found(key) => Ok(Some(key)),
            Lookup::Missing | Lookup::Expired => Ok(None),
        }
    }

    async fn lookup(&self, kid: &str) -> Lookup {
        let entry = self.entry.read().await;
        match entry.as_ref() {
            Some(entry) if entry.expires_at > Instant::now() => entry
                .keys_by_kid
                .get(kid)
                .cloned()
                .map_or(Lookup::Missing, Lookup::Found),
            _ => Lookup::Expired,
        }
    }

    async fn refresh_for(&self, kid: &str) -> anyhow::Result<()> {
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        {
            let entry = self.entry.read().await;
            if let Some(entry) = entry.as_ref().filter(|e| e.expires_at > Instant::now()) {
                if entry.keys_by_kid.contains_key(kid) {
                    return Ok(());
                }
                if entry.fetched_at.elapsed() < self.min_refresh_interval {
                    tracing::debug!(kid, "Unknown kid, JWKS fetched too recently to refetch");
                    return Ok(());
                }
            }
        }

        self.fetch_and_store().await
    }

    /// Fetch the key set and replace the cache entry, ignoring the refresh
    /// interval.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_store().await
    }

    async fn fetch_and_store(&self) -> anyhow::Result<()> {
        let jwks = self.source.fetch().await?;
        let keys_by_kid = usable_keys(jwks);

        tracing::debug!(
            keys = keys_by_kid.len(),
            ttl_secs = self.ttl.as_secs(),
            "JWKS cache refreshed"
        );

        let fetched_at = Instant::now();
        *self.entry.write().await = Some(CacheEntry {
            keys_by_kid,
            fetched_at,
            expires_at: fetched_at + self.ttl,
        });
        Ok(())
    }
}

enum Lookup {
    Found(Arc<DecodingKey>),
    Missing,
    Expired,
}

/// Keep RSA keys that have a kid and parse into a decoding key.
fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
            continue;
        }

        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
            }
        }
    }

    keys_by_kid
}
