// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analysis routes.
//!
//! Analyses are produced by an external worker; this API only reads the
//! latest one and queues requests for new ones.

use super::MessageResponse;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Analysis;
use crate::services::tasks::AnalysisRequestPayload;
use crate::time_utils::now_unix;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/analysis", get(latest_analysis).post(request_analysis))
}

async fn latest_analysis(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Analysis>> {
    state
        .db
        .latest_analysis(&user.username)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no analysis available".to_string()))
}

async fn request_analysis(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MessageResponse>> {
    let message_id = state
        .notifier
        .request_analysis(AnalysisRequestPayload {
            username: user.username,
            requested_at: now_unix(),
        })
        .await?;

    Ok(MessageResponse::new(format!(
        "Message sent! ID: {}",
        message_id
    )))
}
