// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local development and tests.
//!
//! Documents are keyed by the same IDs the Firestore backend uses, so
//! overwrite semantics match. Test hooks allow injecting commit and write
//! failures and counting set writes.

use super::{SetQuery, Store};
use crate::error::AppError;
use crate::models::exercise::exercise_doc_id;
use crate::models::injury::{bodypart_doc_id, injury_doc_id};
use crate::models::{
    Analysis, BodypartLocation, Exercise, Injury, SetKey, User, WeightEntry, WorkoutSet,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    users: BTreeMap<String, User>,
    exercises: BTreeMap<String, Exercise>,
    sets: BTreeMap<String, WorkoutSet>,
    weights: BTreeMap<String, WeightEntry>,
    analyses: Vec<Analysis>,
    bodyparts: BTreeMap<String, BodypartLocation>,
    injuries: BTreeMap<String, Injury>,
}

/// Store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_next_commit: AtomicBool,
    fail_set_writes: AtomicBool,
    set_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit_sets` call fail without writing anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Make every `put_set` call fail until cleared.
    pub fn set_fail_set_writes(&self, fail: bool) {
        self.fail_set_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of individual set documents written so far.
    pub fn set_write_count(&self) -> usize {
        self.set_writes.load(Ordering::SeqCst)
    }

    /// Store an analysis the way the external worker would.
    pub fn record_analysis(&self, analysis: Analysis) -> Result<(), AppError> {
        self.write()?.analyses.push(analysis);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::Database("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::Database("memory store lock poisoned".to_string()))
    }
}

fn sorted_sets(mut sets: Vec<WorkoutSet>) -> Vec<WorkoutSet> {
    sets.sort_by(WorkoutSet::chronological);
    sets
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_users_by_api_key_hash(
        &self,
        api_key_hash: &str,
    ) -> Result<Vec<User>, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .filter(|u| u.api_key_hash == api_key_hash)
            .cloned()
            .collect())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.write()?
            .users
            .insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn list_exercises(&self, username: &str) -> Result<Vec<Exercise>, AppError> {
        let mut exercises: Vec<Exercise> = self
            .read()?
            .exercises
            .values()
            .filter(|e| e.username == username)
            .cloned()
            .collect();
        exercises.sort_by(|a, b| a.exercise_name.cmp(&b.exercise_name));
        Ok(exercises)
    }

    async fn put_exercise(&self, exercise: &Exercise) -> Result<(), AppError> {
        self.write()?
            .exercises
            .insert(exercise.doc_id(), exercise.clone());
        Ok(())
    }

    async fn delete_exercise(&self, username: &str, exercise_name: &str) -> Result<(), AppError> {
        self.write()?
            .exercises
            .remove(&exercise_doc_id(username, exercise_name));
        Ok(())
    }

    async fn get_set(&self, key: &SetKey) -> Result<Option<WorkoutSet>, AppError> {
        Ok(self.read()?.sets.get(&key.doc_id()).cloned())
    }

    async fn query_sets(&self, query: &SetQuery) -> Result<Vec<WorkoutSet>, AppError> {
        let sets = self
            .read()?
            .sets
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        Ok(sorted_sets(sets))
    }

    async fn latest_set(&self, username: &str) -> Result<Option<WorkoutSet>, AppError> {
        Ok(self
            .read()?
            .sets
            .values()
            .filter(|s| s.username == username)
            .max_by(|a, b| WorkoutSet::chronological(a, b))
            .cloned())
    }

    async fn put_set(&self, set: &WorkoutSet) -> Result<(), AppError> {
        if self.fail_set_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(format!(
                "put set {}: injected failure",
                set.doc_id()
            )));
        }
        self.write()?.sets.insert(set.doc_id(), set.clone());
        self.set_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_set(&self, key: &SetKey) -> Result<(), AppError> {
        self.write()?.sets.remove(&key.doc_id());
        Ok(())
    }

    async fn commit_sets(&self, sets: &[WorkoutSet]) -> Result<(), AppError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(AppError::Database(
                "Transaction commit failed: injected failure".to_string(),
            ));
        }

        let mut tables = self.write()?;
        for set in sets {
            tables.sets.insert(set.doc_id(), set.clone());
        }
        self.set_writes.fetch_add(sets.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn insert_weight(&self, entry: &WeightEntry) -> Result<(), AppError> {
        let mut tables = self.write()?;
        let doc_id = entry.doc_id();
        if tables.weights.contains_key(&doc_id) {
            return Err(AppError::AlreadyExists(format!("weights/{}", doc_id)));
        }
        tables.weights.insert(doc_id, entry.clone());
        Ok(())
    }

    async fn query_weights(
        &self,
        username: &str,
        since: Option<i64>,
    ) -> Result<Vec<WeightEntry>, AppError> {
        let mut entries: Vec<WeightEntry> = self
            .read()?
            .weights
            .values()
            .filter(|w| w.username == username && since.map_or(true, |s| w.timestamp >= s))
            .cloned()
            .collect();
        entries.sort_by_key(|w| w.timestamp);
        Ok(entries)
    }

    async fn latest_weight(&self, username: &str) -> Result<Option<WeightEntry>, AppError> {
        Ok(self
            .read()?
            .weights
            .values()
            .filter(|w| w.username == username)
            .max_by_key(|w| w.timestamp)
            .cloned())
    }

    async fn delete_weight(&self, entry: &WeightEntry) -> Result<(), AppError> {
        self.write()?.weights.remove(&entry.doc_id());
        Ok(())
    }

    async fn latest_analysis(&self, username: &str) -> Result<Option<Analysis>, AppError> {
        Ok(self
            .read()?
            .analyses
            .iter()
            .filter(|a| a.username == username)
            .max_by_key(|a| a.timestamp)
            .cloned())
    }

    async fn list_bodyparts(&self, username: &str) -> Result<Vec<BodypartLocation>, AppError> {
        Ok(self
            .read()?
            .bodyparts
            .values()
            .filter(|b| b.username == username)
            .cloned()
            .collect())
    }

    async fn get_bodypart(
        &self,
        username: &str,
        location: &str,
    ) -> Result<Option<BodypartLocation>, AppError> {
        Ok(self
            .read()?
            .bodyparts
            .get(&bodypart_doc_id(username, location))
            .cloned())
    }

    async fn put_bodypart(&self, bodypart: &BodypartLocation) -> Result<(), AppError> {
        self.write()?
            .bodyparts
            .insert(bodypart.doc_id(), bodypart.clone());
        Ok(())
    }

    async fn delete_bodypart(&self, username: &str, location: &str) -> Result<(), AppError> {
        self.write()?
            .bodyparts
            .remove(&bodypart_doc_id(username, location));
        Ok(())
    }

    async fn list_injuries(
        &self,
        username: &str,
        active_only: bool,
    ) -> Result<Vec<Injury>, AppError> {
        let mut injuries: Vec<Injury> = self
            .read()?
            .injuries
            .values()
            .filter(|i| i.username == username && (!active_only || i.active))
            .cloned()
            .collect();
        injuries.sort_by_key(|i| i.timestamp);
        Ok(injuries)
    }

    async fn get_injury(
        &self,
        username: &str,
        timestamp: i64,
    ) -> Result<Option<Injury>, AppError> {
        Ok(self
            .read()?
            .injuries
            .get(&injury_doc_id(username, timestamp))
            .cloned())
    }

    async fn insert_injury(&self, injury: &Injury) -> Result<(), AppError> {
        let mut tables = self.write()?;
        let doc_id = injury.doc_id();
        if tables.injuries.contains_key(&doc_id) {
            return Err(AppError::AlreadyExists(format!("injuries/{}", doc_id)));
        }
        tables.injuries.insert(doc_id, injury.clone());
        Ok(())
    }

    async fn replace_injury_if_owned(&self, injury: &Injury) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        match tables.injuries.get_mut(&injury.doc_id()) {
            Some(stored) if stored.username == injury.username => {
                *stored = injury.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
