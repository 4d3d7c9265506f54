//! Supabase access-token verification against the project's JWKS.

use anyhow::{Context, Result};
use axum::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{AuthContext, Claims, IdentityProvider};
use crate::config::Settings;

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    cached_at: Instant,
}

struct KeySet {
    keys: HashMap<String, CachedKey>,
    last_fetch: Option<Instant>,
}

/// Verifies RS256 access tokens; signing keys are cached for `ttl`.
#[derive(Clone)]
pub struct JwksCache {
    inner: Arc<RwLock<KeySet>>,
    http: reqwest::Client,
    jwks_url: String,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwksCache {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            inner: Arc::new(RwLock::new(KeySet {
                keys: HashMap::new(),
                last_fetch: None,
            })),
            http,
            jwks_url: settings.supabase_jwt_jwks_url.clone(),
            issuer: settings.supabase_jwt_issuer.clone(),
            audience: settings.supabase_jwt_audience.clone(),
            ttl: Duration::from_secs(settings.jwks_cache_ttl_seconds),
        })
    }

    pub async fn verify_token(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token).context("Invalid JWT header")?;
        let kid = header.kid.context("JWT missing kid header")?;

        let decoding_key = self.get_or_fetch_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).context("JWT validation failed")?;

        Ok(token_data.claims)
    }

    fn cached_key(&self, kid: &str) -> Option<DecodingKey> {
        let set = self.inner.read();
        set.keys
            .get(kid)
            .filter(|cached| cached.cached_at.elapsed() < self.ttl)
            .map(|cached| cached.key.clone())
    }

    async fn get_or_fetch_key(&self, kid: &str) -> Result<DecodingKey> {
        if let Some(key) = self.cached_key(kid) {
            return Ok(key);
        }

        self.refresh_keys().await?;

        self.cached_key(kid).context("Key not found in JWKS")
    }

    async fn refresh_keys(&self) -> Result<()> {
        // At most one fetch per second, however many tokens miss
        let last_fetch = self.inner.read().last_fetch;
        if let Some(last) = last_fetch {
            if last.elapsed() < Duration::from_secs(1) {
                return Ok(());
            }
        }

        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let jwks: JwksResponse = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .context("Failed to fetch JWKS")?
            .error_for_status()
            .context("JWKS fetch failed")?
            .json()
            .await
            .context("Failed to parse JWKS")?;

        let mut set = self.inner.write();
        set.last_fetch = Some(Instant::now());

        for jwk in jwks.keys.into_iter().filter(|k| k.kty == "RSA") {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    set.keys.insert(
                        jwk.kid,
                        CachedKey {
                            key,
                            cached_at: Instant::now(),
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(kid = %jwk.kid, error = %e, "Failed to parse JWK");
                }
            }
        }

        tracing::info!(keys = set.keys.len(), "JWKS cache refreshed");
        Ok(())
    }

    /// Pre-warm the cache by fetching keys
    pub async fn warm_cache(&self) -> Result<()> {
        self.refresh_keys().await
    }
}

#[async_trait]
impl IdentityProvider for JwksCache {
    async fn authenticate(&self, token: &str) -> Result<AuthContext> {
        let claims = self.verify_token(token).await?;
        AuthContext::from_claims(&claims).map_err(|e| anyhow::anyhow!(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_tokens_fail_before_any_fetch() {
        let cache = JwksCache::new(&Settings::for_tests()).unwrap();

        assert!(cache.authenticate("not-a-jwt").await.is_err());
        assert!(cache.inner.read().last_fetch.is_none());
    }

    #[test]
    fn expired_keys_are_not_served() {
        let mut settings = Settings::for_tests();
        settings.jwks_cache_ttl_seconds = 0;
        let cache = JwksCache::new(&settings).unwrap();

        cache.inner.write().keys.insert(
            "kid-1".to_string(),
            CachedKey {
                key: DecodingKey::from_secret(b"secret"),
                cached_at: Instant::now(),
            },
        );

        assert!(cache.cached_key("kid-1").is_none());
        assert!(cache.cached_key("kid-2").is_none());
    }
}
