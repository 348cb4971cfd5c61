// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Services talk to storage through the [`Store`] trait. Production uses
//! [`FirestoreDb`]; local runs and tests use [`MemoryStore`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{
    Analysis, BodypartLocation, Exercise, Injury, SetKey, User, WeightEntry, WorkoutSet,
};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const EXERCISES: &str = "exercises";
    pub const SETS: &str = "sets";
    pub const WEIGHTS: &str = "weights";
    pub const ANALYSES: &str = "analyses";
    pub const BODYPARTS: &str = "bodyparts";
    pub const INJURIES: &str = "injuries";
}

/// Filter for set queries. Both timestamp bounds are inclusive.
#[derive(Debug, Clone)]
pub struct SetQuery {
    pub username: String,
    pub exercise: Option<String>,
    pub start: i64,
    pub end: i64,
}

impl SetQuery {
    pub fn matches(&self, set: &WorkoutSet) -> bool {
        set.username == self.username
            && self
                .exercise
                .as_deref()
                .map_or(true, |exercise| set.exercise == exercise)
            && set.timestamp >= self.start
            && set.timestamp <= self.end
    }
}

/// Persistence operations used by the services.
///
/// Query results are returned in ascending timestamp order unless noted.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    /// All users whose stored key hash equals `api_key_hash`.
    async fn find_users_by_api_key_hash(&self, api_key_hash: &str)
        -> Result<Vec<User>, AppError>;

    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    // ─── Exercises ───────────────────────────────────────────────

    async fn list_exercises(&self, username: &str) -> Result<Vec<Exercise>, AppError>;
    async fn put_exercise(&self, exercise: &Exercise) -> Result<(), AppError>;
    async fn delete_exercise(&self, username: &str, exercise_name: &str) -> Result<(), AppError>;

    // ─── Sets ────────────────────────────────────────────────────

    async fn get_set(&self, key: &SetKey) -> Result<Option<WorkoutSet>, AppError>;
    async fn query_sets(&self, query: &SetQuery) -> Result<Vec<WorkoutSet>, AppError>;
    /// The user's set with the greatest timestamp.
    async fn latest_set(&self, username: &str) -> Result<Option<WorkoutSet>, AppError>;
    /// Create or fully replace a set.
    async fn put_set(&self, set: &WorkoutSet) -> Result<(), AppError>;
    async fn delete_set(&self, key: &SetKey) -> Result<(), AppError>;
    /// Write all sets in one atomic transaction: all land or none do.
    async fn commit_sets(&self, sets: &[WorkoutSet]) -> Result<(), AppError>;

    // ─── Weights ─────────────────────────────────────────────────

    /// Create a weight entry. Fails with `AlreadyExists` if one is already
    /// stored for the same user and timestamp.
    async fn insert_weight(&self, entry: &WeightEntry) -> Result<(), AppError>;
    /// Entries with `timestamp >= since` (all entries when `None`).
    async fn query_weights(
        &self,
        username: &str,
        since: Option<i64>,
    ) -> Result<Vec<WeightEntry>, AppError>;
    async fn latest_weight(&self, username: &str) -> Result<Option<WeightEntry>, AppError>;
    async fn delete_weight(&self, entry: &WeightEntry) -> Result<(), AppError>;

    // ─── Analyses ────────────────────────────────────────────────

    async fn latest_analysis(&self, username: &str) -> Result<Option<Analysis>, AppError>;

    // ─── Body parts ──────────────────────────────────────────────

    async fn list_bodyparts(&self, username: &str) -> Result<Vec<BodypartLocation>, AppError>;
    async fn get_bodypart(
        &self,
        username: &str,
        location: &str,
    ) -> Result<Option<BodypartLocation>, AppError>;
    async fn put_bodypart(&self, bodypart: &BodypartLocation) -> Result<(), AppError>;
    async fn delete_bodypart(&self, username: &str, location: &str) -> Result<(), AppError>;

    // ─── Injuries ────────────────────────────────────────────────

    async fn list_injuries(
        &self,
        username: &str,
        active_only: bool,
    ) -> Result<Vec<Injury>, AppError>;
    async fn get_injury(&self, username: &str, timestamp: i64)
        -> Result<Option<Injury>, AppError>;
    /// Create an injury. Fails with `AlreadyExists` rather than overwriting
    /// a record with the same id.
    async fn insert_injury(&self, injury: &Injury) -> Result<(), AppError>;
    /// Replace an existing injury, re-checking inside a transaction that the
    /// stored record still belongs to `injury.username`.
    ///
    /// Returns `false` (and writes nothing) when the record is missing or
    /// owned by someone else.
    async fn replace_injury_if_owned(&self, injury: &Injury) -> Result<bool, AppError>;
}
