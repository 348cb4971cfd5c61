// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Cloud Tasks queue that carries analysis requests.
pub const ANALYSIS_QUEUE_NAME: &str = "analysis-requests";

const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

/// How callers are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Static API key to username map from `API_KEY_MAP`.
    StaticKeys,
    /// Hashed API keys stored in the users collection.
    StoredUsers,
    /// Cognito access tokens validated against the pool's JWKS.
    Cognito,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// GCP region (for Cloud Tasks)
    pub gcp_region: String,
    /// Server port
    pub port: u16,

    pub storage_backend: StorageBackend,
    pub auth_mode: AuthMode,
    /// API key -> username, used in `AuthMode::StaticKeys`
    pub api_key_map: HashMap<String, String>,
    pub cognito_region: Option<String>,
    pub cognito_user_pool_id: Option<String>,
    pub jwks_cache_ttl: Duration,
    /// Base URL of the analysis worker that Cloud Tasks calls
    pub analysis_worker_url: String,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            gcp_region: "us-central1".to_string(),
            port: 8080,
            storage_backend: StorageBackend::Memory,
            auth_mode: AuthMode::StaticKeys,
            api_key_map: HashMap::from([("abc123".to_string(), "alice".to_string())]),
            cognito_region: Some("us-west-2".to_string()),
            cognito_user_pool_id: Some("us-west-2_TestPool".to_string()),
            jwks_cache_ttl: Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECS),
            analysis_worker_url: "http://localhost:8081".to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .as_str()
        {
            "firestore" => StorageBackend::Firestore,
            "memory" => StorageBackend::Memory,
            other => return Err(ConfigError::Invalid("STORAGE_BACKEND", other.to_string())),
        };

        let auth_mode = match env::var("AUTH_MODE")
            .unwrap_or_else(|_| "api_key_map".to_string())
            .as_str()
        {
            "api_key_map" => AuthMode::StaticKeys,
            "users" => AuthMode::StoredUsers,
            "cognito" => AuthMode::Cognito,
            other => return Err(ConfigError::Invalid("AUTH_MODE", other.to_string())),
        };

        let cognito_region = env::var("COGNITO_REGION").ok().filter(|v| !v.is_empty());
        let cognito_user_pool_id = env::var("COGNITO_USER_POOL_ID")
            .ok()
            .filter(|v| !v.is_empty());

        if auth_mode == AuthMode::Cognito {
            if cognito_region.is_none() {
                return Err(ConfigError::Missing("COGNITO_REGION"));
            }
            if cognito_user_pool_id.is_none() {
                return Err(ConfigError::Missing("COGNITO_USER_POOL_ID"));
            }
        }

        let jwks_cache_ttl_secs = match env::var("JWKS_CACHE_TTL_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("JWKS_CACHE_TTL_SECS", v))?,
            Err(_) => DEFAULT_JWKS_CACHE_TTL_SECS,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            gcp_region: env::var("GCP_REGION").unwrap_or_else(|_| "us-central1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            storage_backend,
            auth_mode,
            api_key_map: parse_api_key_map(env::var("API_KEY_MAP").ok().as_deref()),
            cognito_region,
            cognito_user_pool_id,
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl_secs),
            analysis_worker_url: env::var("ANALYSIS_WORKER_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Parse the `API_KEY_MAP` JSON object.
///
/// A missing or malformed value yields an empty map (with a warning), so
/// every static key is rejected rather than the server failing to start.
pub fn parse_api_key_map(raw: Option<&str>) -> HashMap<String, String> {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        tracing::warn!("API_KEY_MAP not set, no API keys will be accepted");
        return HashMap::new();
    };

    match serde_json::from_str::<HashMap<String, String>>(raw) {
        Ok(map) => {
            tracing::info!(count = map.len(), "Loaded API keys");
            map
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse API_KEY_MAP, no API keys will be accepted");
            HashMap::new()
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_map_parses_json_object() {
        let map = parse_api_key_map(Some(r#"{"abc123":"alice","xyz":"bob"}"#));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("abc123").map(String::as_str), Some("alice"));
    }

    #[test]
    fn api_key_map_malformed_is_empty() {
        assert!(parse_api_key_map(Some("not json")).is_empty());
        assert!(parse_api_key_map(Some(r#"["a","b"]"#)).is_empty());
        assert!(parse_api_key_map(Some("   ")).is_empty());
        assert!(parse_api_key_map(None).is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::test_default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwks_cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.storage_backend, StorageBackend::Memory);
    }
}
