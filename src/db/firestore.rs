// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`Store`].
//!
//! Document IDs:
//! - `users/{username}`
//! - `exercises/{username}_{urlencoded name}`
//! - `sets/{workoutId}_{timestamp}`
//! - `weights/{username}_{timestamp}`
//! - `bodyparts/{username}_{urlencoded location}`
//! - `injuries/{username}_{timestamp}`

use super::{collections, SetQuery, Store};
use crate::error::AppError;
use crate::models::exercise::exercise_doc_id;
use crate::models::injury::{bodypart_doc_id, injury_doc_id};
use crate::models::{
    Analysis, BodypartLocation, Exercise, Injury, SetKey, User, WeightEntry, WorkoutSet,
};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::FirestoreQueryDirection;

// Firestore limits a transaction to 500 writes.
const MAX_TRANSACTION_WRITES: usize = 500;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Helper Methods ──────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, doc_id: &str) -> Result<Option<T>, AppError>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(format!("get {}/{}: {}", collection, doc_id, e)))
    }

    async fn put_doc<T>(&self, collection: &str, doc_id: &str, object: &T) -> Result<(), AppError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(format!("put {}/{}: {}", collection, doc_id, e)))?;
        Ok(())
    }

    /// Create a document, failing if one already exists under `doc_id`.
    async fn insert_doc<T>(
        &self,
        collection: &str,
        doc_id: &str,
        object: &T,
    ) -> Result<(), AppError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
    {
        let _: T = self
            .client
            .fluent()
            .insert()
            .into(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => {
                    AppError::AlreadyExists(format!("{}/{}", collection, doc_id))
                }
                e => AppError::Database(format!("insert {}/{}: {}", collection, doc_id, e)),
            })?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, doc_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(doc_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(format!("delete {}/{}: {}", collection, doc_id, e)))?;
        Ok(())
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn find_users_by_api_key_hash(
        &self,
        api_key_hash: &str,
    ) -> Result<Vec<User>, AppError> {
        // Limit 2 is enough to tell unique from ambiguous.
        self.client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("api_key_hash").eq(api_key_hash)]))
            .limit(2)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(format!("find user by key hash: {}", e)))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.put_doc(collections::USERS, &user.username, user).await
    }

    // ─── Exercise Operations ─────────────────────────────────────

    async fn list_exercises(&self, username: &str) -> Result<Vec<Exercise>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::EXERCISES)
            .filter(|q| q.for_all([q.field("username").eq(username)]))
            .order_by([("exercise_name", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(format!("list exercises for {}: {}", username, e)))
    }

    async fn put_exercise(&self, exercise: &Exercise) -> Result<(), AppError> {
        self.put_doc(collections::EXERCISES, &exercise.doc_id(), exercise)
            .await
    }

    async fn delete_exercise(&self, username: &str, exercise_name: &str) -> Result<(), AppError> {
        self.delete_doc(
            collections::EXERCISES,
            &exercise_doc_id(username, exercise_name),
        )
        .await
    }

    // ─── Set Operations ──────────────────────────────────────────

    async fn get_set(&self, key: &SetKey) -> Result<Option<WorkoutSet>, AppError> {
        self.get_doc(collections::SETS, &key.doc_id()).await
    }

    async fn query_sets(&self, query: &SetQuery) -> Result<Vec<WorkoutSet>, AppError> {
        let username = query.username.clone();
        let exercise = query.exercise.clone();
        let (start, end) = (query.start, query.end);

        let mut sets: Vec<WorkoutSet> = self
            .client
            .fluent()
            .select()
            .from(collections::SETS)
            .filter(move |q| {
                q.for_all([
                    q.field("username").eq(username.clone()),
                    exercise
                        .as_ref()
                        .and_then(|exercise| q.field("exercise").eq(exercise.clone())),
                    q.field("timestamp").greater_than_or_equal(start),
                    q.field("timestamp").less_than_or_equal(end),
                ])
            })
            .order_by([("timestamp", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| {
                AppError::Database(format!("query sets for {}: {}", query.username, e))
            })?;

        // Firestore orders by timestamp only; apply the workout ID tie-break here.
        sets.sort_by(WorkoutSet::chronological);
        Ok(sets)
    }

    async fn latest_set(&self, username: &str) -> Result<Option<WorkoutSet>, AppError> {
        let sets: Vec<WorkoutSet> = self
            .client
            .fluent()
            .select()
            .from(collections::SETS)
            .filter(|q| q.for_all([q.field("username").eq(username)]))
            .order_by([("timestamp", FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(format!("latest set for {}: {}", username, e)))?;
        Ok(sets.into_iter().next())
    }

    async fn put_set(&self, set: &WorkoutSet) -> Result<(), AppError> {
        self.put_doc(collections::SETS, &set.doc_id(), set).await
    }

    async fn delete_set(&self, key: &SetKey) -> Result<(), AppError> {
        self.delete_doc(collections::SETS, &key.doc_id()).await
    }

    async fn commit_sets(&self, sets: &[WorkoutSet]) -> Result<(), AppError> {
        if sets.len() > MAX_TRANSACTION_WRITES {
            return Err(AppError::Database(format!(
                "commit of {} sets exceeds the transaction limit of {}",
                sets.len(),
                MAX_TRANSACTION_WRITES
            )));
        }

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for set in sets {
            self.client
                .fluent()
                .update()
                .in_col(collections::SETS)
                .document_id(set.doc_id())
                .object(set)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add set {} to transaction: {}",
                        set.doc_id(),
                        e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(count = sets.len(), "Committed sets atomically");
        Ok(())
    }

    // ─── Weight Operations ───────────────────────────────────────

    async fn insert_weight(&self, entry: &WeightEntry) -> Result<(), AppError> {
        self.insert_doc(collections::WEIGHTS, &entry.doc_id(), entry)
            .await
    }

    async fn query_weights(
        &self,
        username: &str,
        since: Option<i64>,
    ) -> Result<Vec<WeightEntry>, AppError> {
        let username_owned = username.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::WEIGHTS)
            .filter(move |q| {
                q.for_all([
                    q.field("username").eq(username_owned.clone()),
                    since.and_then(|since| q.field("timestamp").greater_than_or_equal(since)),
                ])
            })
            .order_by([("timestamp", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(format!("query weights for {}: {}", username, e)))
    }

    async fn latest_weight(&self, username: &str) -> Result<Option<WeightEntry>, AppError> {
        let entries: Vec<WeightEntry> = self
            .client
            .fluent()
            .select()
            .from(collections::WEIGHTS)
            .filter(|q| q.for_all([q.field("username").eq(username)]))
            .order_by([("timestamp", FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(format!("latest weight for {}: {}", username, e)))?;
        Ok(entries.into_iter().next())
    }

    async fn delete_weight(&self, entry: &WeightEntry) -> Result<(), AppError> {
        self.delete_doc(collections::WEIGHTS, &entry.doc_id()).await
    }

    // ─── Analysis Operations ─────────────────────────────────────

    async fn latest_analysis(&self, username: &str) -> Result<Option<Analysis>, AppError> {
        let analyses: Vec<Analysis> = self
            .client
            .fluent()
            .select()
            .from(collections::ANALYSES)
            .filter(|q| q.for_all([q.field("username").eq(username)]))
            .order_by([("timestamp", FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| {
                AppError::Database(format!("latest analysis for {}: {}", username, e))
            })?;
        Ok(analyses.into_iter().next())
    }

    // ─── Body Part Operations ────────────────────────────────────

    async fn list_bodyparts(&self, username: &str) -> Result<Vec<BodypartLocation>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::BODYPARTS)
            .filter(|q| q.for_all([q.field("username").eq(username)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(format!("list bodyparts for {}: {}", username, e)))
    }

    async fn get_bodypart(
        &self,
        username: &str,
        location: &str,
    ) -> Result<Option<BodypartLocation>, AppError> {
        self.get_doc(collections::BODYPARTS, &bodypart_doc_id(username, location))
            .await
    }

    async fn put_bodypart(&self, bodypart: &BodypartLocation) -> Result<(), AppError> {
        self.put_doc(collections::BODYPARTS, &bodypart.doc_id(), bodypart)
            .await
    }

    async fn delete_bodypart(&self, username: &str, location: &str) -> Result<(), AppError> {
        self.delete_doc(collections::BODYPARTS, &bodypart_doc_id(username, location))
            .await
    }

    // ─── Injury Operations ───────────────────────────────────────

    async fn list_injuries(
        &self,
        username: &str,
        active_only: bool,
    ) -> Result<Vec<Injury>, AppError> {
        let username_owned = username.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::INJURIES)
            .filter(move |q| {
                q.for_all([
                    q.field("username").eq(username_owned.clone()),
                    if active_only {
                        q.field("active").eq(true)
                    } else {
                        None
                    },
                ])
            })
            .order_by([("timestamp", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(format!("list injuries for {}: {}", username, e)))
    }

    async fn get_injury(
        &self,
        username: &str,
        timestamp: i64,
    ) -> Result<Option<Injury>, AppError> {
        self.get_doc(collections::INJURIES, &injury_doc_id(username, timestamp))
            .await
    }

    async fn insert_injury(&self, injury: &Injury) -> Result<(), AppError> {
        self.insert_doc(collections::INJURIES, &injury.doc_id(), injury)
            .await
    }

    async fn replace_injury_if_owned(&self, injury: &Injury) -> Result<bool, AppError> {
        let doc_id = injury.doc_id();

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<Injury> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::INJURIES)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to read injury {} in transaction: {}",
                    doc_id, e
                ))
            })?;

        let owned = current.is_some_and(|stored| stored.username == injury.username);
        if !owned {
            let _ = transaction.rollback().await;
            return Ok(false);
        }

        self.client
            .fluent()
            .update()
            .in_col(collections::INJURIES)
            .document_id(&doc_id)
            .object(injury)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add injury to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(true)
    }
}
