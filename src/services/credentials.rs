// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API key credential validation.
//!
//! Resolves a bearer API key to a username, either from the static
//! `API_KEY_MAP` or from hashed keys stored with each user.

use crate::config::{AuthMode, Config};
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::user::hash_api_key;
use crate::services::jwks::{HttpJwksSource, JwksCache};
use crate::services::jwt::CognitoVerifier;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Authenticated user, inserted into request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is case-insensitive and the value must be exactly two
/// space-separated parts.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str> {
    let value = match header {
        Some(v) if !v.is_empty() => v,
        _ => return Err(AppError::MissingHeader),
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(*token)
        }
        _ => Err(AppError::InvalidHeaderFormat),
    }
}

/// Validates keys against a fixed key -> username map.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyValidator {
    keys: Vec<(String, String)>,
}

impl StaticKeyValidator {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self {
            keys: map.into_iter().collect(),
        }
    }

    /// Look up the username for `token`.
    ///
    /// Every entry is compared in constant time so the lookup does not leak
    /// how much of a key matched.
    pub fn validate(&self, token: &str) -> Result<String> {
        let mut found: Option<&str> = None;
        for (key, username) in &self.keys {
            if bool::from(key.as_bytes().ct_eq(token.as_bytes())) {
                found = Some(username);
            }
        }
        found
            .map(str::to_string)
            .ok_or(AppError::InvalidCredential)
    }
}

/// Validates keys against the hashes stored in the users collection.
#[derive(Clone)]
pub struct StoredUserValidator {
    db: Arc<dyn Store>,
}

impl StoredUserValidator {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    pub async fn validate(&self, token: &str) -> Result<String> {
        let users = self
            .db
            .find_users_by_api_key_hash(&hash_api_key(token))
            .await?;

        match users.as_slice() {
            [] => Err(AppError::InvalidCredential),
            [user] if !user.is_active => {
                tracing::info!(username = %user.username, "Rejected inactive user");
                Err(AppError::InactiveAccount)
            }
            [user] => Ok(user.username.clone()),
            _ => {
                tracing::error!(
                    matches = users.len(),
                    "Data integrity violation: API key hash matches multiple users"
                );
                Err(AppError::AmbiguousCredential)
            }
        }
    }
}

/// The configured authentication strategy.
#[derive(Clone)]
pub enum Authenticator {
    StaticKeys(StaticKeyValidator),
    StoredUsers(StoredUserValidator),
    Cognito(Arc<CognitoVerifier>),
}

impl Authenticator {
    /// Build the authenticator selected by `config.auth_mode`.
    pub fn from_config(config: &Config, db: Arc<dyn Store>) -> anyhow::Result<Self> {
        Ok(match config.auth_mode {
            AuthMode::StaticKeys => {
                Authenticator::StaticKeys(StaticKeyValidator::new(config.api_key_map.clone()))
            }
            AuthMode::StoredUsers => Authenticator::StoredUsers(StoredUserValidator::new(db)),
            AuthMode::Cognito => {
                let (Some(region), Some(pool_id)) =
                    (&config.cognito_region, &config.cognito_user_pool_id)
                else {
                    anyhow::bail!("Cognito auth requires COGNITO_REGION and COGNITO_USER_POOL_ID");
                };
                let issuer = CognitoVerifier::issuer_for(region, pool_id);
                let source = HttpJwksSource::new(CognitoVerifier::jwks_url_for(&issuer))?;
                let cache = JwksCache::new(Arc::new(source), config.jwks_cache_ttl);
                Authenticator::Cognito(Arc::new(CognitoVerifier::new(issuer, Arc::new(cache))))
            }
        })
    }

    /// Resolve the caller from a raw `Authorization` header value.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<AuthUser> {
        let token = extract_bearer_token(header)?;

        let username = match self {
            Authenticator::StaticKeys(validator) => validator.validate(token)?,
            Authenticator::StoredUsers(validator) => validator.validate(token).await?,
            Authenticator::Cognito(verifier) => verifier.verify(token).await?,
        };

        Ok(AuthUser { username })
    }
}
