// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Body-weight routes.

use super::MessageResponse;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::exercise::WeightRequest;
use crate::models::WeightEntry;
use crate::services::WeightTrend;
use crate::time_utils::now_unix;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/weight",
            get(list_weights).post(log_weight).delete(delete_latest_weight),
        )
        .route("/weight/trend", get(weight_trend))
}

async fn log_weight(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<WeightRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .weights
        .log(&user.username, req.weight, req.timestamp, now_unix())
        .await?;
    Ok(MessageResponse::new("Weight logged successfully"))
}

async fn list_weights(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<WeightEntry>>> {
    Ok(Json(state.weights.list(&user.username).await?))
}

async fn delete_latest_weight(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MessageResponse>> {
    state
        .weights
        .delete_latest(&user.username)
        .await?
        .ok_or_else(|| AppError::NotFound("no weight entries to delete".to_string()))?;
    Ok(MessageResponse::new("Most recent weight deleted successfully"))
}

async fn weight_trend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WeightTrend>> {
    Ok(Json(state.weights.trend(&user.username, now_unix()).await?))
}
