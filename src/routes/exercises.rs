// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise list routes.

use super::MessageResponse;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::exercise::ExerciseRequest;
use crate::models::Exercise;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/exercises",
        get(list_exercises).post(add_exercise).delete(delete_exercise),
    )
}

/// Exercise names, sorted.
async fn list_exercises(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<String>>> {
    let exercises = state.db.list_exercises(&user.username).await?;
    Ok(Json(
        exercises.into_iter().map(|e| e.exercise_name).collect(),
    ))
}

async fn add_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ExerciseRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let exercise = Exercise {
        exercise_name: req.exercise_name,
        username: user.username,
    };
    state.db.put_exercise(&exercise).await?;

    tracing::info!(username = %exercise.username, exercise = %exercise.exercise_name, "Added exercise");
    Ok(MessageResponse::new(format!(
        "Exercise {} added successfully",
        exercise.exercise_name
    )))
}

async fn delete_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ExerciseRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .db
        .delete_exercise(&user.username, &req.exercise_name)
        .await?;

    Ok(MessageResponse::new(format!(
        "Exercise {} deleted successfully",
        req.exercise_name
    )))
}
