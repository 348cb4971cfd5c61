// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout set routes.

use super::MessageResponse;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::workout_set::{
    BatchLogSetsRequest, DeleteSetRequest, EditSetRequest, LogSetRequest,
};
use crate::models::WorkoutSet;
use crate::services::DeleteOutcome;
use crate::time_utils::now_unix;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sets", get(get_sets).delete(delete_set))
        .route("/sets/log", post(log_set))
        .route("/sets/batch", post(log_batch))
        .route("/sets/last_month", get(last_month))
        .route("/sets/pop", post(pop_last_set))
        .route("/sets/by_exercise", get(sets_by_exercise))
        .route("/sets/edit", put(edit_set))
}

// ─── Logging ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogSetResponse {
    pub message: String,
    pub set: WorkoutSet,
}

async fn log_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<LogSetRequest>,
) -> Result<Json<LogSetResponse>> {
    let set = state.sets.log_set(&user.username, req, now_unix()).await?;
    Ok(Json(LogSetResponse {
        message: format!("Set for {} logged successfully", set.exercise),
        set,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BatchLogResponse {
    pub message: String,
    pub count: usize,
    pub sets: Vec<WorkoutSet>,
}

async fn log_batch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BatchLogSetsRequest>,
) -> Result<Json<BatchLogResponse>> {
    let sets = state
        .sets
        .log_batch(&user.username, req.sets, now_unix())
        .await?;
    Ok(Json(BatchLogResponse {
        message: format!("{} sets logged successfully", sets.len()),
        count: sets.len(),
        sets,
    }))
}

// ─── Queries ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct RangeQuery {
    start: Option<i64>,
    end: Option<i64>,
}

#[derive(Deserialize)]
struct ExerciseRangeQuery {
    #[serde(rename = "exerciseName", default)]
    exercise_name: String,
    start: Option<i64>,
    end: Option<i64>,
}

async fn last_month(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<WorkoutSet>>> {
    Ok(Json(state.sets.last_month(&user.username, now_unix()).await?))
}

async fn get_sets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<WorkoutSet>>> {
    Ok(Json(
        state
            .sets
            .in_range(&user.username, query.start, query.end)
            .await?,
    ))
}

async fn sets_by_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ExerciseRangeQuery>,
) -> Result<Json<Vec<WorkoutSet>>> {
    Ok(Json(
        state
            .sets
            .for_exercise(&user.username, &query.exercise_name, query.start, query.end)
            .await?,
    ))
}

// ─── Changes ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PopResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<WorkoutSet>,
}

async fn pop_last_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PopResponse>> {
    let popped = state.sets.pop_last(&user.username).await?;
    let message = if popped.is_some() {
        "Successfully deleted last set"
    } else {
        "No sets to delete"
    };
    Ok(Json(PopResponse {
        message: message.to_string(),
        set: popped,
    }))
}

async fn edit_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<EditSetRequest>,
) -> Result<Json<MessageResponse>> {
    let message = match state.sets.edit(&user.username, req).await? {
        Some(_) => "Set updated successfully",
        None => "No fields to update",
    };
    Ok(MessageResponse::new(message))
}

#[derive(Serialize)]
pub struct DeleteSetResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: DeleteOutcome,
}

async fn delete_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<DeleteSetRequest>,
) -> Result<Json<DeleteSetResponse>> {
    let key = req.key();
    let outcome = state.sets.delete(&user.username, &key).await?;
    Ok(Json(DeleteSetResponse {
        message: format!(
            "Set with workoutId {} and timestamp {} deleted successfully",
            key.workout_id, key.timestamp
        ),
        outcome,
    }))
}
