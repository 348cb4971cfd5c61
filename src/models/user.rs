// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// User record stored in Firestore.
///
/// API keys are never stored in the clear; lookups go through
/// [`hash_api_key`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Username (also used as document ID)
    pub username: String,
    /// Hex-encoded SHA-256 of the user's API key
    pub api_key_hash: String,
    /// Inactive users are refused even with a valid key
    pub is_active: bool,
    /// When the user was created (ISO 8601)
    pub created_at: String,
}

impl User {
    pub fn new(username: impl Into<String>, api_key: &str) -> Self {
        Self {
            username: username.into(),
            api_key_hash: hash_api_key(api_key),
            is_active: true,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Hex-encoded SHA-256 of an API key.
pub fn hash_api_key(api_key: &str) -> String {
    hex::encode(Sha256::digest(api_key.as_bytes()))
}
