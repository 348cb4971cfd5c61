// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Body-weight log and trend estimation.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::WeightEntry;
use crate::time_utils::{format_utc_date, SECONDS_PER_DAY};
use chrono::DateTime;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Trend window.
pub const TREND_WINDOW_SECS: i64 = 14 * SECONDS_PER_DAY;

/// Weight change per day over the trend window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeightTrend {
    /// UTC date the trend was computed (YYYY-MM-DD)
    pub date: String,
    /// Weight units per day
    pub slope: f64,
}

/// Least-squares slope of weight against time, in weight units per second.
///
/// Timestamps are shifted so the earliest is zero; the slope is unchanged
/// by the shift and the sums stay small.
pub fn linear_trend(points: &[(i64, f64)]) -> Result<f64> {
    if points.len() < 2 {
        return Err(AppError::InsufficientData(
            "at least two weight entries are needed".to_string(),
        ));
    }

    let origin = points.iter().map(|(t, _)| *t).min().unwrap_or(0);
    let n = points.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);

    for (t, y) in points {
        let x = (t - origin) as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return Err(AppError::InsufficientData(
            "all weight entries share the same timestamp".to_string(),
        ));
    }

    Ok((n * sum_xy - sum_x * sum_y) / denominator)
}

/// Weight operations on top of a [`Store`].
#[derive(Clone)]
pub struct WeightService {
    db: Arc<dyn Store>,
}

impl WeightService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    pub async fn log(
        &self,
        username: &str,
        weight: f32,
        timestamp: Option<i64>,
        now: i64,
    ) -> Result<WeightEntry> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(AppError::BadRequest(
                "weight must be a positive number".to_string(),
            ));
        }

        let entry = WeightEntry {
            timestamp: timestamp.unwrap_or(now),
            weight,
            username: username.to_string(),
        };
        self.db.insert_weight(&entry).await?;

        tracing::info!(username, timestamp = entry.timestamp, "Logged weight");
        Ok(entry)
    }

    /// All entries, oldest first.
    pub async fn list(&self, username: &str) -> Result<Vec<WeightEntry>> {
        self.db.query_weights(username, None).await
    }

    /// Delete the most recent entry. `None` when there is nothing to delete.
    pub async fn delete_latest(&self, username: &str) -> Result<Option<WeightEntry>> {
        let Some(entry) = self.db.latest_weight(username).await? else {
            return Ok(None);
        };
        self.db.delete_weight(&entry).await?;
        tracing::info!(username, timestamp = entry.timestamp, "Deleted latest weight");
        Ok(Some(entry))
    }

    /// Trend over the entries of the last 14 days.
    pub async fn trend(&self, username: &str, now: i64) -> Result<WeightTrend> {
        let entries = self
            .db
            .query_weights(username, Some(now - TREND_WINDOW_SECS))
            .await?;

        let points: Vec<(i64, f64)> = entries
            .iter()
            .map(|e| (e.timestamp, f64::from(e.weight)))
            .collect();
        let slope = linear_trend(&points)? * SECONDS_PER_DAY as f64;

        let date = DateTime::from_timestamp(now, 0)
            .map(format_utc_date)
            .ok_or_else(|| AppError::BadRequest(format!("timestamp {} out of range", now)))?;

        Ok(WeightTrend { date, slope })
    }
}
