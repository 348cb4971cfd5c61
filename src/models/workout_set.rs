// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout set model and the request bodies that create or change sets.
//!
//! Field names on the wire (`workoutId`, `sets`, `isCutting`) are the ones
//! the web client already sends.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Whether a set was logged during a cutting or bulking phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum WeightModulation {
    Cutting,
    Bulking,
}

impl WeightModulation {
    /// `Cutting` only when the client said so explicitly.
    pub fn from_is_cutting(is_cutting: Option<bool>) -> Self {
        if is_cutting == Some(true) {
            WeightModulation::Cutting
        } else {
            WeightModulation::Bulking
        }
    }
}

/// A single logged set, stored in the `sets` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutSet {
    #[serde(rename = "workoutId")]
    pub workout_id: String,
    /// Unix seconds
    pub timestamp: i64,
    pub exercise: String,
    /// Free text ("8", "8-10", "AMRAP")
    pub reps: String,
    /// Ordinal of this set within its exercise and day, starting at 1
    #[serde(rename = "sets")]
    pub set_number: u32,
    pub weight: f32,
    pub weight_modulation: WeightModulation,
    pub username: String,
}

impl WorkoutSet {
    pub fn key(&self) -> SetKey {
        SetKey {
            workout_id: self.workout_id.clone(),
            timestamp: self.timestamp,
        }
    }

    pub fn doc_id(&self) -> String {
        set_doc_id(&self.workout_id, self.timestamp)
    }

    /// Chronological order with the workout ID as tie-breaker.
    pub fn chronological(a: &WorkoutSet, b: &WorkoutSet) -> Ordering {
        (a.timestamp, a.workout_id.as_str()).cmp(&(b.timestamp, b.workout_id.as_str()))
    }
}

/// Identity of a set: `(workoutId, timestamp)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetKey {
    pub workout_id: String,
    pub timestamp: i64,
}

impl SetKey {
    pub fn doc_id(&self) -> String {
        set_doc_id(&self.workout_id, self.timestamp)
    }

    /// Both parts must be present.
    pub fn is_valid(&self) -> bool {
        !self.workout_id.trim().is_empty() && self.timestamp != 0
    }
}

fn set_doc_id(workout_id: &str, timestamp: i64) -> String {
    format!("{}_{}", workout_id, timestamp)
}

/// Body of `POST /sets/log`, and each item of `POST /sets/batch`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogSetRequest {
    #[validate(length(min = 1, message = "exercise is required"))]
    pub exercise: String,
    #[validate(length(min = 1, message = "reps is required"))]
    pub reps: String,
    #[validate(range(min = 0.0, message = "weight must not be negative"))]
    pub weight: f32,
    #[serde(rename = "isCutting", default)]
    pub is_cutting: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Explicit set number supplied by the client
    #[serde(default)]
    #[validate(range(min = 1, message = "sets must be at least 1"))]
    pub sets: Option<u32>,
}

/// Body of `POST /sets/batch`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchLogSetsRequest {
    #[serde(default)]
    pub sets: Vec<LogSetRequest>,
}

/// Body of `PUT /sets/edit`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EditSetRequest {
    #[serde(rename = "workoutId", default)]
    pub workout_id: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub reps: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "sets must be at least 1"))]
    pub sets: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "weight must not be negative"))]
    pub weight: Option<f32>,
}

impl EditSetRequest {
    pub fn key(&self) -> SetKey {
        SetKey {
            workout_id: self.workout_id.clone(),
            timestamp: self.timestamp,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.reps.is_some() || self.sets.is_some() || self.weight.is_some()
    }
}

/// Body of `DELETE /sets`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSetRequest {
    #[serde(rename = "workoutId", default)]
    pub workout_id: String,
    #[serde(default)]
    pub timestamp: i64,
}

impl DeleteSetRequest {
    pub fn key(&self) -> SetKey {
        SetKey {
            workout_id: self.workout_id.clone(),
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(id: &str, ts: i64) -> WorkoutSet {
        WorkoutSet {
            workout_id: id.to_string(),
            timestamp: ts,
            exercise: "Squat".to_string(),
            reps: "5".to_string(),
            set_number: 1,
            weight: 100.0,
            weight_modulation: WeightModulation::Bulking,
            username: "alice".to_string(),
        }
    }

    #[test]
    fn serializes_client_field_names() {
        let json = serde_json::to_value(set("w1", 1000)).unwrap();
        assert_eq!(json["workoutId"], "w1");
        assert_eq!(json["sets"], 1);
        assert_eq!(json["weight_modulation"], "Bulking");
        assert!(json.get("set_number").is_none());
    }

    #[test]
    fn chronological_breaks_ties_by_workout_id() {
        let mut sets = vec![set("b", 10), set("a", 10), set("c", 5)];
        sets.sort_by(WorkoutSet::chronological);
        let ids: Vec<_> = sets.iter().map(|s| s.workout_id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn modulation_defaults_to_bulking() {
        assert_eq!(WeightModulation::from_is_cutting(Some(true)), WeightModulation::Cutting);
        assert_eq!(WeightModulation::from_is_cutting(Some(false)), WeightModulation::Bulking);
        assert_eq!(WeightModulation::from_is_cutting(None), WeightModulation::Bulking);
    }

    #[test]
    fn set_key_requires_both_parts() {
        let key = |id: &str, ts| SetKey {
            workout_id: id.to_string(),
            timestamp: ts,
        };
        assert!(key("w1", 100).is_valid());
        assert!(!key("", 100).is_valid());
        assert!(!key("w1", 0).is_valid());
        assert_eq!(key("w1", 100).doc_id(), "w1_100");
    }

    #[test]
    fn log_request_validation() {
        let req: LogSetRequest =
            serde_json::from_str(r#"{"exercise":"Squat","reps":"5","weight":100}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.is_cutting, None);

        let req: LogSetRequest =
            serde_json::from_str(r#"{"exercise":"","reps":"5","weight":100}"#).unwrap();
        assert!(req.validate().is_err());

        let req: LogSetRequest =
            serde_json::from_str(r#"{"exercise":"Squat","reps":"5","weight":100,"sets":0}"#)
                .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn edit_without_fields_has_no_changes() {
        let req: EditSetRequest =
            serde_json::from_str(r#"{"workoutId":"w1","timestamp":100}"#).unwrap();
        assert!(!req.has_changes());
        assert!(req.key().is_valid());
    }
}
