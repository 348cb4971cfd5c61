// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use gains_iq::error::AppError;

async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_auth_errors_are_unauthorized() {
    for err in [
        AppError::MissingHeader,
        AppError::InvalidHeaderFormat,
        AppError::InvalidCredential,
        AppError::UnsupportedAlgorithm("HS256".to_string()),
        AppError::UnknownSigningKey("kid".to_string()),
        AppError::WrongTokenUse,
        AppError::IssuerMismatch("https://other".to_string()),
        AppError::NoIdentityClaim,
        AppError::InvalidToken("expired".to_string()),
    ] {
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{}", err.kind());
        assert!(!err.is_internal());
    }
    assert_eq!(AppError::InactiveAccount.status(), StatusCode::FORBIDDEN);
}

#[test]
fn test_validation_and_lookup_statuses() {
    assert_eq!(AppError::EmptyBatch.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::BatchTooLarge { count: 101, max: 100 }.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(AppError::InvalidIdentity.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::InsufficientData("one point".to_string()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::NotFound("set".to_string()).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::LocationNotFound("knee".to_string()).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::AlreadyExists("injury".to_string()).status(),
        StatusCode::CONFLICT
    );
}

#[test]
fn test_collaborator_failures_are_internal() {
    for err in [
        AppError::Database("unavailable".to_string()),
        AppError::Queue("unavailable".to_string()),
        AppError::Internal(anyhow::anyhow!("boom")),
    ] {
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_internal());
    }
    assert_eq!(
        AppError::AmbiguousCredential.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert!(!AppError::AmbiguousCredential.is_internal());
}

#[tokio::test]
async fn test_client_errors_include_details() {
    let (status, body) = body_of(AppError::BatchTooLarge {
        count: 150,
        max: 100,
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "batch_too_large");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("150"), "{details}");
}

#[tokio::test]
async fn test_auth_and_internal_errors_hide_details() {
    let (_, body) = body_of(AppError::IssuerMismatch("https://evil".to_string())).await;
    assert_eq!(body["error"], "issuer_mismatch");
    assert!(body.get("details").is_none());

    let (_, body) = body_of(AppError::Database("connection string leaked".to_string())).await;
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());

    let (_, body) = body_of(AppError::InactiveAccount).await;
    assert_eq!(body["error"], "inactive_account");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_conflict_includes_details() {
    let (status, body) = body_of(AppError::AlreadyExists("weight entry at 1000".to_string())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_exists");
    assert!(body["details"].as_str().unwrap().contains("1000"));
}
