// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Injury and body-part routes.

use super::MessageResponse;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::injury::{BodypartRequest, InjuryRequest, UpdateInjuryActiveRequest};
use crate::models::{BodypartLocation, Injury};
use crate::time_utils::now_unix;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/injury", get(list_injuries).post(create_injury))
        .route(
            "/injury/active",
            get(list_active_injuries).put(set_injury_active),
        )
        .route(
            "/bodyparts",
            get(list_bodyparts).post(add_bodypart).delete(delete_bodypart),
        )
}

async fn list_injuries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Injury>>> {
    Ok(Json(state.injuries.list(&user.username, false).await?))
}

async fn list_active_injuries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Injury>>> {
    Ok(Json(state.injuries.list(&user.username, true).await?))
}

async fn create_injury(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<InjuryRequest>,
) -> Result<Json<Injury>> {
    Ok(Json(
        state
            .injuries
            .create(&user.username, req, now_unix())
            .await?,
    ))
}

async fn set_injury_active(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateInjuryActiveRequest>,
) -> Result<Json<Injury>> {
    Ok(Json(
        state
            .injuries
            .set_active(&user.username, req.timestamp, req.active, now_unix())
            .await?,
    ))
}

async fn list_bodyparts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<BodypartLocation>>> {
    Ok(Json(state.injuries.list_bodyparts(&user.username).await?))
}

async fn add_bodypart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BodypartRequest>,
) -> Result<Json<BodypartLocation>> {
    Ok(Json(state.injuries.add_bodypart(&user.username, req).await?))
}

async fn delete_bodypart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BodypartRequest>,
) -> Result<Json<MessageResponse>> {
    let location = req.location.clone();
    state.injuries.delete_bodypart(&user.username, req).await?;
    Ok(MessageResponse::new(format!(
        "Body part {} deleted successfully",
        location
    )))
}
