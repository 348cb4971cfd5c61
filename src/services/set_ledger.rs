// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Set ledger: logging, numbering and renumbering of workout sets.
//!
//! Sets are numbered within a partition of (user, exercise, UTC day). A
//! single insert takes the running maximum plus one. Deletes renumber the
//! partition to chronological rank, and batch inserts rank the merged
//! partition up front, so after either the numbers are exactly `1..=n` in
//! `(timestamp, workoutId)` order.
//!
//! Read-then-write operations here take no locks. Two concurrent single
//! inserts into the same partition can pick the same number; the next
//! delete or batch in that partition repairs it.

use crate::db::{SetQuery, Store};
use crate::error::{AppError, Result};
use crate::models::workout_set::{EditSetRequest, LogSetRequest};
use crate::models::{SetKey, WeightModulation, WorkoutSet};
use crate::time_utils::{day_bounds, day_start, SECONDS_PER_DAY};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Largest accepted batch.
pub const MAX_BATCH_SIZE: usize = 100;

/// Default upper bound for range queries.
pub const DEFAULT_RANGE_END: i64 = 9_999_999_999_999;

const LAST_MONTH_SECS: i64 = 30 * SECONDS_PER_DAY;

/// Partition reads in flight at once during a batch.
const MAX_CONCURRENT_READS: usize = 8;

/// Result of deleting a set.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteOutcome {
    pub deleted: bool,
    /// Sets whose number changed during renumbering
    pub renumbered: usize,
    /// Set when the delete succeeded but renumbering did not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// ─── Pure numbering helpers ──────────────────────────────────────

/// Next number for a single insert: running maximum plus one.
pub fn next_set_number(partition: &[WorkoutSet]) -> u32 {
    partition.iter().map(|s| s.set_number).max().unwrap_or(0) + 1
}

/// Sets whose number differs from their chronological rank, with the rank applied.
///
/// Running this on its own output's partition yields nothing.
pub fn renumber_plan(mut partition: Vec<WorkoutSet>) -> Vec<WorkoutSet> {
    partition.sort_by(WorkoutSet::chronological);
    partition
        .into_iter()
        .zip(1u32..)
        .filter_map(|(mut set, rank)| {
            if set.set_number == rank {
                None
            } else {
                set.set_number = rank;
                Some(set)
            }
        })
        .collect()
}

/// Partition key of a set: exercise and start of its UTC day.
pub fn partition_of(set: &WorkoutSet) -> (String, i64) {
    (set.exercise.clone(), day_start(set.timestamp))
}

/// Number a batch of new sets against the existing sets of the partitions
/// they touch.
///
/// Each partition is merged, ordered chronologically and ranked from 1.
/// Returns every write needed: all new sets (in input order) followed by
/// existing sets whose rank changed.
pub fn plan_batch(new_sets: Vec<WorkoutSet>, existing: Vec<WorkoutSet>) -> Vec<WorkoutSet> {
    // (input index for new sets, set)
    let mut groups: BTreeMap<(String, i64), Vec<(Option<usize>, WorkoutSet)>> = BTreeMap::new();
    let new_count = new_sets.len();

    for (index, set) in new_sets.into_iter().enumerate() {
        groups
            .entry(partition_of(&set))
            .or_default()
            .push((Some(index), set));
    }
    for set in existing {
        if let Some(group) = groups.get_mut(&partition_of(&set)) {
            group.push((None, set));
        }
    }

    let mut ranked_new: Vec<Option<WorkoutSet>> = vec![None; new_count];
    let mut displaced = Vec::new();

    for mut group in groups.into_values() {
        group.sort_by(|(_, a), (_, b)| WorkoutSet::chronological(a, b));
        for ((index, mut set), rank) in group.into_iter().zip(1u32..) {
            match index {
                Some(index) => {
                    set.set_number = rank;
                    ranked_new[index] = Some(set);
                }
                None if set.set_number != rank => {
                    set.set_number = rank;
                    displaced.push(set);
                }
                None => {}
            }
        }
    }

    ranked_new.into_iter().flatten().chain(displaced).collect()
}

fn validation_error(e: validator::ValidationErrors) -> AppError {
    AppError::BadRequest(e.to_string())
}

fn new_set(username: &str, req: LogSetRequest, now: i64) -> WorkoutSet {
    WorkoutSet {
        workout_id: uuid::Uuid::new_v4().to_string(),
        timestamp: req.timestamp.unwrap_or(now),
        exercise: req.exercise,
        reps: req.reps,
        set_number: req.sets.unwrap_or(0),
        weight: req.weight,
        weight_modulation: WeightModulation::from_is_cutting(req.is_cutting),
        username: username.to_string(),
    }
}

// ─── Ledger service ──────────────────────────────────────────────

/// Set operations on top of a [`Store`].
#[derive(Clone)]
pub struct SetLedger {
    db: Arc<dyn Store>,
}

impl SetLedger {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// All sets in the partition containing `timestamp`.
    pub async fn partition(
        &self,
        username: &str,
        exercise: &str,
        timestamp: i64,
    ) -> Result<Vec<WorkoutSet>> {
        let (start, end) = day_bounds(timestamp);
        self.db
            .query_sets(&SetQuery {
                username: username.to_string(),
                exercise: Some(exercise.to_string()),
                start,
                end,
            })
            .await
    }

    /// Log one set.
    ///
    /// An explicit `sets` number from the client is stored as given;
    /// otherwise the partition's running maximum plus one is used. Either
    /// way the partition can end up with a gap or a duplicate number, which
    /// stays until the next delete or batch in that partition renumbers it.
    pub async fn log_set(
        &self,
        username: &str,
        req: LogSetRequest,
        now: i64,
    ) -> Result<WorkoutSet> {
        req.validate().map_err(validation_error)?;

        let explicit = req.sets.is_some();
        let mut set = new_set(username, req, now);

        if !explicit {
            let partition = self
                .partition(username, &set.exercise, set.timestamp)
                .await?;
            set.set_number = next_set_number(&partition);
        }

        self.db.put_set(&set).await?;

        tracing::info!(
            username,
            workout_id = %set.workout_id,
            exercise = %set.exercise,
            set_number = set.set_number,
            "Logged set"
        );
        Ok(set)
    }

    /// Log up to [`MAX_BATCH_SIZE`] sets in one atomic write.
    ///
    /// Every item is validated and every partition read before anything is
    /// written. Returns the new sets with their assigned numbers.
    pub async fn log_batch(
        &self,
        username: &str,
        reqs: Vec<LogSetRequest>,
        now: i64,
    ) -> Result<Vec<WorkoutSet>> {
        if reqs.is_empty() {
            return Err(AppError::EmptyBatch);
        }
        if reqs.len() > MAX_BATCH_SIZE {
            return Err(AppError::BatchTooLarge {
                count: reqs.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        for (i, req) in reqs.iter().enumerate() {
            req.validate()
                .map_err(|e| AppError::BadRequest(format!("set {}: {}", i, e)))?;
        }

        let new_sets: Vec<WorkoutSet> = reqs
            .into_iter()
            .map(|req| new_set(username, req, now))
            .collect();

        let partitions: HashSet<(String, i64)> = new_sets.iter().map(partition_of).collect();
        let existing: Vec<WorkoutSet> = stream::iter(partitions.iter().cloned())
            .map(move |(exercise, day)| async move {
                self.partition(username, &exercise, day).await
            })
            .buffer_unordered(MAX_CONCURRENT_READS)
            .collect::<Vec<Result<Vec<WorkoutSet>>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        let new_count = new_sets.len();
        let writes = plan_batch(new_sets, existing);
        self.db.commit_sets(&writes).await?;

        tracing::info!(
            username,
            count = new_count,
            renumbered = writes.len() - new_count,
            partitions = partitions.len(),
            "Logged batch of sets"
        );

        Ok(writes.into_iter().take(new_count).collect())
    }

    /// Delete the user's most recent set. `None` when there is nothing to delete.
    pub async fn pop_last(&self, username: &str) -> Result<Option<WorkoutSet>> {
        let Some(set) = self.db.latest_set(username).await? else {
            return Ok(None);
        };

        self.db.delete_set(&set.key()).await?;
        tracing::info!(username, workout_id = %set.workout_id, "Popped last set");
        Ok(Some(set))
    }

    /// Update reps, set number or weight of an existing set.
    ///
    /// A request with no fields is a successful no-op and returns `None`
    /// without touching storage.
    pub async fn edit(&self, username: &str, req: EditSetRequest) -> Result<Option<WorkoutSet>> {
        let key = req.key();
        if !key.is_valid() {
            return Err(AppError::InvalidIdentity);
        }
        if !req.has_changes() {
            return Ok(None);
        }
        req.validate().map_err(validation_error)?;

        let mut set = self.owned_set(username, &key).await?;

        if let Some(reps) = req.reps {
            set.reps = reps;
        }
        if let Some(number) = req.sets {
            set.set_number = number;
        }
        if let Some(weight) = req.weight {
            set.weight = weight;
        }

        self.db.put_set(&set).await?;
        tracing::info!(username, workout_id = %set.workout_id, "Edited set");
        Ok(Some(set))
    }

    /// Delete a set by identity, then renumber its partition.
    ///
    /// The delete is what the caller asked for, so a renumbering failure
    /// after it is reported in the outcome instead of as an error.
    pub async fn delete(&self, username: &str, key: &SetKey) -> Result<DeleteOutcome> {
        if !key.is_valid() {
            return Err(AppError::InvalidIdentity);
        }

        let set = self.owned_set(username, key).await?;
        self.db.delete_set(key).await?;

        match self
            .renumber_partition(username, &set.exercise, set.timestamp)
            .await
        {
            Ok(renumbered) => Ok(DeleteOutcome {
                deleted: true,
                renumbered,
                warning: None,
            }),
            Err(e) => {
                tracing::warn!(
                    username,
                    workout_id = %key.workout_id,
                    error = %e,
                    "Set deleted but renumbering failed"
                );
                Ok(DeleteOutcome {
                    deleted: true,
                    renumbered: 0,
                    warning: Some(format!("set deleted but renumbering failed: {}", e)),
                })
            }
        }
    }

    /// Rewrite set numbers in a partition to their chronological rank.
    ///
    /// Only sets whose number changes are written; returns how many were.
    pub async fn renumber_partition(
        &self,
        username: &str,
        exercise: &str,
        timestamp: i64,
    ) -> Result<usize> {
        let partition = self.partition(username, exercise, timestamp).await?;
        let changes = renumber_plan(partition);

        for set in &changes {
            self.db.put_set(set).await?;
        }

        if !changes.is_empty() {
            tracing::debug!(username, exercise, count = changes.len(), "Renumbered sets");
        }
        Ok(changes.len())
    }

    /// Sets from the last 30 days.
    pub async fn last_month(&self, username: &str, now: i64) -> Result<Vec<WorkoutSet>> {
        let sets = self
            .db
            .query_sets(&SetQuery {
                username: username.to_string(),
                exercise: None,
                start: now - LAST_MONTH_SECS,
                end: DEFAULT_RANGE_END,
            })
            .await?;

        let cutoff = now - LAST_MONTH_SECS;
        Ok(sets.into_iter().filter(|s| s.timestamp > cutoff).collect())
    }

    /// Sets with `start <= timestamp <= end`.
    pub async fn in_range(
        &self,
        username: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<WorkoutSet>> {
        self.db
            .query_sets(&SetQuery {
                username: username.to_string(),
                exercise: None,
                start: start.unwrap_or(0),
                end: end.unwrap_or(DEFAULT_RANGE_END),
            })
            .await
    }

    /// Sets of one exercise with `start <= timestamp <= end`.
    pub async fn for_exercise(
        &self,
        username: &str,
        exercise: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<WorkoutSet>> {
        if exercise.trim().is_empty() {
            return Err(AppError::BadRequest("exerciseName is required".to_string()));
        }

        self.db
            .query_sets(&SetQuery {
                username: username.to_string(),
                exercise: Some(exercise.to_string()),
                start: start.unwrap_or(0),
                end: end.unwrap_or(DEFAULT_RANGE_END),
            })
            .await
    }

    async fn owned_set(&self, username: &str, key: &SetKey) -> Result<WorkoutSet> {
        self.db
            .get_set(key)
            .await?
            .filter(|set| set.username == username)
            .ok_or_else(|| AppError::NotFound(format!("set {}", key.doc_id())))
    }
}
