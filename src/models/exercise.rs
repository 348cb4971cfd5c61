// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise, weight and analysis records.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A user-defined exercise name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub exercise_name: String,
    pub username: String,
}

impl Exercise {
    pub fn doc_id(&self) -> String {
        exercise_doc_id(&self.username, &self.exercise_name)
    }
}

pub fn exercise_doc_id(username: &str, exercise_name: &str) -> String {
    format!("{}_{}", username, urlencoding::encode(exercise_name))
}

/// Body of `POST /exercises` and `DELETE /exercises`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExerciseRequest {
    #[validate(length(min = 1, message = "exercise_name is required"))]
    pub exercise_name: String,
}

/// A body-weight measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeightEntry {
    pub timestamp: i64,
    pub weight: f32,
    pub username: String,
}

impl WeightEntry {
    pub fn doc_id(&self) -> String {
        weight_doc_id(&self.username, self.timestamp)
    }
}

pub fn weight_doc_id(username: &str, timestamp: i64) -> String {
    format!("{}_{}", username, timestamp)
}

/// Body of `POST /weight`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightRequest {
    pub weight: f32,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// An analysis written by the external worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Analysis {
    pub timestamp: i64,
    pub analysis: String,
    pub username: String,
}
