// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cognito access token verification.

use crate::error::{AppError, Result};
use crate::services::jwks::JwksCache;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::sync::Arc;

const CLOCK_SKEW_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct CognitoClaims {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    token_use: Option<String>,
    #[serde(rename = "cognito:username", default)]
    cognito_username: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

/// Verifies Cognito-issued access tokens against the user pool's JWKS.
pub struct CognitoVerifier {
    issuer: String,
    cache: Arc<JwksCache>,
}

impl CognitoVerifier {
    pub fn new(issuer: impl Into<String>, cache: Arc<JwksCache>) -> Self {
        let issuer = issuer.into();
        tracing::info!(issuer = %issuer, "Initialized Cognito token verifier");
        Self { issuer, cache }
    }

    /// Issuer URL of a Cognito user pool.
    pub fn issuer_for(region: &str, user_pool_id: &str) -> String {
        format!("https://cognito-idp.{}.amazonaws.com/{}", region, user_pool_id)
    }

    pub fn jwks_url_for(issuer: &str) -> String {
        format!("{}/.well-known/jwks.json", issuer)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify `token` and return the username it identifies.
    pub async fn verify(&self, token: &str) -> Result<String> {
        let header = decode_header(token)
            .map_err(|e| AppError::InvalidToken(format!("invalid JWT header: {e}")))?;

        // Reject before any key lookup so a forged HMAC token never triggers a fetch.
        if !is_rsa_family(header.alg) {
            return Err(AppError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or_else(|| AppError::UnknownSigningKey("<missing kid>".to_string()))?;

        let decoding_key = self
            .cache
            .key_for(&kid)
            .await
            .map_err(|e| AppError::Internal(e.context("fetching signing keys")))?
            .ok_or_else(|| AppError::UnknownSigningKey(kid.clone()))?;

        let mut validation = Validation::new(header.alg);
        validation.set_required_spec_claims(&["exp"]);
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<CognitoClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| AppError::InvalidToken(e.to_string()))?
            .claims;

        if claims.token_use.as_deref() != Some("access") {
            return Err(AppError::WrongTokenUse);
        }

        let issuer = claims.iss.unwrap_or_default();
        if issuer != self.issuer {
            return Err(AppError::IssuerMismatch(issuer));
        }

        claims
            .cognito_username
            .filter(|u| !u.is_empty())
            .or(claims.username.filter(|u| !u.is_empty()))
            .ok_or(AppError::NoIdentityClaim)
    }
}

fn is_rsa_family(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_and_jwks_url() {
        let issuer = CognitoVerifier::issuer_for("us-west-2", "us-west-2_abc");
        assert_eq!(issuer, "https://cognito-idp.us-west-2.amazonaws.com/us-west-2_abc");
        assert_eq!(
            CognitoVerifier::jwks_url_for(&issuer),
            "https://cognito-idp.us-west-2.amazonaws.com/us-west-2_abc/.well-known/jwks.json"
        );
    }

    #[test]
    fn only_rsa_algorithms_are_accepted() {
        assert!(is_rsa_family(Algorithm::RS256));
        assert!(is_rsa_family(Algorithm::PS512));
        assert!(!is_rsa_family(Algorithm::HS256));
        assert!(!is_rsa_family(Algorithm::ES256));
        assert!(!is_rsa_family(Algorithm::EdDSA));
    }
}
