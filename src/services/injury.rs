// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Injury tracking and body-part locations.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::injury::{BodypartRequest, InjuryRequest};
use crate::models::{BodypartLocation, Injury, Transition};
use std::sync::Arc;
use validator::Validate;

/// Injury operations on top of a [`Store`].
#[derive(Clone)]
pub struct InjuryTracker {
    db: Arc<dyn Store>,
}

impl InjuryTracker {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Record a new injury at a known body-part location.
    pub async fn create(&self, username: &str, req: InjuryRequest, now: i64) -> Result<Injury> {
        req.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if self.db.get_bodypart(username, &req.location).await?.is_none() {
            return Err(AppError::LocationNotFound(req.location));
        }

        let injury = Injury::new(
            username,
            req.timestamp.unwrap_or(now),
            req.location,
            req.details.filter(|d| !d.is_empty()),
            req.active.unwrap_or(true),
        );
        self.db.insert_injury(&injury).await?;

        tracing::info!(
            username,
            timestamp = injury.timestamp,
            location = %injury.location,
            active = injury.active,
            "Recorded injury"
        );
        Ok(injury)
    }

    /// Mark an injury active or inactive at `now`.
    pub async fn set_active(
        &self,
        username: &str,
        timestamp: i64,
        active: bool,
        now: i64,
    ) -> Result<Injury> {
        let not_found = || AppError::NotFound(format!("injury {}", timestamp));

        let mut injury = self
            .db
            .get_injury(username, timestamp)
            .await?
            .filter(|injury| injury.username == username)
            .ok_or_else(not_found)?;

        let transition = injury.set_active(active, now);
        if transition == Transition::Unchanged {
            return Ok(injury);
        }

        if !self.db.replace_injury_if_owned(&injury).await? {
            return Err(not_found());
        }

        tracing::info!(username, timestamp, ?transition, "Updated injury status");
        Ok(injury)
    }

    pub async fn list(&self, username: &str, active_only: bool) -> Result<Vec<Injury>> {
        self.db.list_injuries(username, active_only).await
    }

    // ─── Body parts ──────────────────────────────────────────────

    pub async fn list_bodyparts(&self, username: &str) -> Result<Vec<BodypartLocation>> {
        self.db.list_bodyparts(username).await
    }

    pub async fn add_bodypart(
        &self,
        username: &str,
        req: BodypartRequest,
    ) -> Result<BodypartLocation> {
        req.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let bodypart = BodypartLocation {
            location: req.location,
            username: username.to_string(),
        };
        self.db.put_bodypart(&bodypart).await?;
        Ok(bodypart)
    }

    pub async fn delete_bodypart(&self, username: &str, req: BodypartRequest) -> Result<()> {
        req.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        self.db.delete_bodypart(username, &req.location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    async fn tracker_with_knee() -> InjuryTracker {
        let tracker = InjuryTracker::new(Arc::new(MemoryStore::new()));
        tracker
            .add_bodypart(
                "alice",
                BodypartRequest {
                    location: "knee".to_string(),
                },
            )
            .await
            .unwrap();
        tracker
    }

    fn knee_injury(timestamp: i64) -> InjuryRequest {
        InjuryRequest {
            timestamp: Some(timestamp),
            location: "knee".to_string(),
            details: Some("tweaked on squats".to_string()),
            active: None,
        }
    }

    #[tokio::test]
    async fn create_requires_known_location() {
        let tracker = tracker_with_knee().await;
        let mut req = knee_injury(100);
        req.location = "elbow".to_string();

        assert!(matches!(
            tracker.create("alice", req, 100).await,
            Err(AppError::LocationNotFound(_))
        ));
        // Locations are per user.
        assert!(matches!(
            tracker.create("bob", knee_injury(100), 100).await,
            Err(AppError::LocationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn toggling_grows_periods() {
        let tracker = tracker_with_knee().await;
        let injury = tracker.create("alice", knee_injury(100), 100).await.unwrap();
        assert!(injury.active);

        let injury = tracker.set_active("alice", 100, false, 200).await.unwrap();
        assert!(!injury.active);
        let injury = tracker.set_active("alice", 100, true, 300).await.unwrap();
        assert!(injury.active);
        assert_eq!(injury.active_periods.len(), 2);

        let stored = tracker.list("alice", true).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].active_periods[0].end, Some(200));
    }

    #[tokio::test]
    async fn other_users_injuries_are_not_found() {
        let tracker = tracker_with_knee().await;
        tracker.create("alice", knee_injury(100), 100).await.unwrap();

        assert!(matches!(
            tracker.set_active("bob", 100, false, 200).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            tracker.set_active("alice", 999, false, 200).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn create_does_not_overwrite_same_timestamp() {
        let tracker = tracker_with_knee().await;
        tracker
            .add_bodypart(
                "alice",
                BodypartRequest {
                    location: "elbow".to_string(),
                },
            )
            .await
            .unwrap();
        tracker.create("alice", knee_injury(100), 100).await.unwrap();
        tracker.set_active("alice", 100, false, 200).await.unwrap();

        let mut elbow = knee_injury(100);
        elbow.location = "elbow".to_string();
        assert!(matches!(
            tracker.create("alice", elbow, 300).await,
            Err(AppError::AlreadyExists(_))
        ));

        let stored = tracker.list("alice", false).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].location, "knee");
        assert_eq!(stored[0].active_periods[0].end, Some(200));
    }

    #[tokio::test]
    async fn active_filter() {
        let tracker = tracker_with_knee().await;
        tracker.create("alice", knee_injury(100), 100).await.unwrap();
        let mut healed = knee_injury(50);
        healed.active = Some(false);
        tracker.create("alice", healed, 100).await.unwrap();

        assert_eq!(tracker.list("alice", false).await.unwrap().len(), 2);
        assert_eq!(tracker.list("alice", true).await.unwrap().len(), 1);
    }
}
