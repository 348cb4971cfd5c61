// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cognito access token verification tests.
//!
//! Tokens are signed with a locally generated RSA key whose public half is
//! served through a static key set, so no network is involved.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use gains_iq::error::AppError;
use gains_iq::services::jwks::{Jwk, Jwks, DEFAULT_MIN_REFRESH_INTERVAL};
use gains_iq::services::{CognitoVerifier, JwksCache, StaticJwksSource};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const KID: &str = "test-key-1";

fn issuer() -> String {
    CognitoVerifier::issuer_for("us-west-2", "us-west-2_TestPool")
}

struct TestKey {
    pem: String,
    jwk: Jwk,
}

fn test_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("generate RSA key");
        let public_key = private_key.to_public_key();
        let pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode PEM")
            .to_string();

        TestKey {
            pem,
            jwk: Jwk {
                kid: KID.to_string(),
                kty: "RSA".to_string(),
                alg: Some("RS256".to_string()),
                n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
                e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
                use_: Some("sig".to_string()),
            },
        }
    })
}

fn verifier() -> (CognitoVerifier, Arc<StaticJwksSource>) {
    verifier_with_refresh_interval(DEFAULT_MIN_REFRESH_INTERVAL)
}

fn verifier_with_refresh_interval(interval: Duration) -> (CognitoVerifier, Arc<StaticJwksSource>) {
    let source = Arc::new(StaticJwksSource::new(Jwks {
        keys: vec![test_key().jwk.clone()],
    }));
    let cache = JwksCache::new(source.clone(), Duration::from_secs(3600))
        .with_min_refresh_interval(interval);
    (CognitoVerifier::new(issuer(), Arc::new(cache)), source)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn access_claims() -> Value {
    json!({
        "iss": issuer(),
        "token_use": "access",
        "cognito:username": "alice",
        "exp": now() + 3600,
        "iat": now(),
    })
}

fn sign(claims: &Value, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(test_key().pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

#[tokio::test]
async fn valid_access_token_yields_username() {
    let (verifier, source) = verifier();
    let token = sign(&access_claims(), Some(KID));

    assert_eq!(verifier.verify(&token).await.unwrap(), "alice");
    assert_eq!(verifier.verify(&token).await.unwrap(), "alice");
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn username_claim_is_the_fallback() {
    let (verifier, _) = verifier();
    let mut claims = access_claims();
    claims.as_object_mut().unwrap().remove("cognito:username");
    claims["username"] = json!("bob");

    let token = sign(&claims, Some(KID));
    assert_eq!(verifier.verify(&token).await.unwrap(), "bob");
}

#[tokio::test]
async fn token_without_identity_is_rejected() {
    let (verifier, _) = verifier();
    let mut claims = access_claims();
    claims.as_object_mut().unwrap().remove("cognito:username");

    let token = sign(&claims, Some(KID));
    assert!(matches!(
        verifier.verify(&token).await,
        Err(AppError::NoIdentityClaim)
    ));
}

#[tokio::test]
async fn hmac_token_is_rejected_without_fetching_keys() {
    let (verifier, source) = verifier();
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KID.to_string());
    let token = encode(
        &header,
        &access_claims(),
        &EncodingKey::from_secret(test_key().jwk.n.as_bytes()),
    )
    .unwrap();

    let err = verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, AppError::UnsupportedAlgorithm(_)));
    assert_eq!(err.kind(), "unsupported_algorithm");
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn wrong_issuer_is_rejected() {
    let (verifier, _) = verifier();
    let mut claims = access_claims();
    claims["iss"] = json!("https://cognito-idp.us-east-1.amazonaws.com/us-east-1_Other");

    let token = sign(&claims, Some(KID));
    assert!(matches!(
        verifier.verify(&token).await,
        Err(AppError::IssuerMismatch(_))
    ));
}

#[tokio::test]
async fn id_token_is_rejected() {
    let (verifier, _) = verifier();
    let mut claims = access_claims();
    claims["token_use"] = json!("id");

    let token = sign(&claims, Some(KID));
    assert!(matches!(
        verifier.verify(&token).await,
        Err(AppError::WrongTokenUse)
    ));
}

#[tokio::test]
async fn unknown_kid_is_rejected_after_one_refresh() {
    let (verifier, source) = verifier();
    let token = sign(&access_claims(), Some("rotated-away"));

    let err = verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, AppError::UnknownSigningKey(ref kid) if kid == "rotated-away"));
    // Initial fill plus the forced refresh collapse into a single fetch.
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn missing_kid_is_rejected() {
    let (verifier, _) = verifier();
    let token = sign(&access_claims(), None);

    assert!(matches!(
        verifier.verify(&token).await,
        Err(AppError::UnknownSigningKey(_))
    ));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let (verifier, _) = verifier();
    let mut claims = access_claims();
    claims["exp"] = json!(now() - 3600);

    let token = sign(&claims, Some(KID));
    assert!(matches!(
        verifier.verify(&token).await,
        Err(AppError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn token_within_clock_skew_is_accepted() {
    let (verifier, _) = verifier();
    let mut claims = access_claims();
    claims["exp"] = json!(now() - 30);

    let token = sign(&claims, Some(KID));
    assert_eq!(verifier.verify(&token).await.unwrap(), "alice");
}

#[tokio::test]
async fn tampered_signature_is_rejected() {
    let (verifier, _) = verifier();
    let token = sign(&access_claims(), Some(KID));
    let (signed, signature) = token.rsplit_once('.').unwrap();
    let forged = format!("{}.{}", signed, signature.chars().rev().collect::<String>());

    assert!(matches!(
        verifier.verify(&forged).await,
        Err(AppError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn garbage_is_rejected() {
    let (verifier, source) = verifier();
    assert!(matches!(
        verifier.verify("not-a-jwt").await,
        Err(AppError::InvalidToken(_))
    ));
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn rotated_key_is_picked_up() {
    let (verifier, source) = verifier_with_refresh_interval(Duration::ZERO);
    let token = sign(&access_claims(), Some(KID));
    source.set_keys(Jwks { keys: vec![] });

    // The cache has never been filled, so the first fetch already sees the empty set.
    assert!(matches!(
        verifier.verify(&token).await,
        Err(AppError::UnknownSigningKey(_))
    ));

    source.set_keys(Jwks {
        keys: vec![test_key().jwk.clone()],
    });
    assert_eq!(verifier.verify(&token).await.unwrap(), "alice");
}

#[tokio::test]
async fn flood_of_unknown_kids_fetches_keys_once() {
    let (verifier, source) = verifier();
    let verifier = Arc::new(verifier);

    let attempts: Vec<_> = (0..25)
        .map(|i| {
            let verifier = verifier.clone();
            let token = sign(&access_claims(), Some(&format!("made-up-{}", i)));
            tokio::spawn(async move { verifier.verify(&token).await })
        })
        .collect();
    for attempt in attempts {
        assert!(matches!(
            attempt.await.unwrap(),
            Err(AppError::UnknownSigningKey(_))
        ));
    }
    assert_eq!(source.fetch_count(), 1);

    // The real key still verifies from the cached set.
    let token = sign(&access_claims(), Some(KID));
    assert_eq!(verifier.verify(&token).await.unwrap(), "alice");
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn rotation_waits_for_refresh_interval() {
    let (verifier, source) = verifier();
    source.set_keys(Jwks { keys: vec![] });
    let token = sign(&access_claims(), Some(KID));
    assert!(verifier.verify(&token).await.is_err());

    source.set_keys(Jwks {
        keys: vec![test_key().jwk.clone()],
    });
    assert!(matches!(
        verifier.verify(&token).await,
        Err(AppError::UnknownSigningKey(_))
    ));
    assert_eq!(source.fetch_count(), 1);
}
