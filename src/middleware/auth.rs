// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub use crate::services::credentials::AuthUser;

/// Middleware that requires a valid bearer credential.
///
/// On success the resolved [`AuthUser`] is added to the request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|h| h.to_str().map_err(|_| AppError::InvalidHeaderFormat))
        .transpose()?;

    let auth_user = match state.authenticator.authenticate(auth_header).await {
        Ok(user) => user,
        Err(e) => {
            if !e.is_internal() {
                tracing::info!(
                    path = %request.uri().path(),
                    reason = %e,
                    "Authentication failed"
                );
            }
            return Err(e);
        }
    };

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}
