// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Injury records and body-part locations.
//!
//! An injury keeps a history of the intervals during which it was active.
//! At most one interval is open (has no `end`), and if present it is the
//! last one; `active` mirrors whether that open interval exists.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One interval during which an injury was active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivePeriod {
    pub start: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

/// Stored injury record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Injury {
    /// Creation time, Unix seconds (part of the document ID)
    pub timestamp: i64,
    pub username: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub active_periods: Vec<ActivePeriod>,
}

/// What a call to [`Injury::set_active`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Opened,
    Closed,
    Unchanged,
}

impl Injury {
    /// New injury; an active one starts with a period open at `timestamp`.
    pub fn new(
        username: impl Into<String>,
        timestamp: i64,
        location: impl Into<String>,
        details: Option<String>,
        active: bool,
    ) -> Self {
        let active_periods = if active {
            vec![ActivePeriod {
                start: timestamp,
                end: None,
            }]
        } else {
            Vec::new()
        };

        Self {
            timestamp,
            username: username.into(),
            location: location.into(),
            details,
            active,
            active_periods,
        }
    }

    pub fn doc_id(&self) -> String {
        injury_doc_id(&self.username, self.timestamp)
    }

    /// True when the last period exists and has no end.
    pub fn is_open(&self) -> bool {
        self.active_periods
            .last()
            .is_some_and(|period| period.end.is_none())
    }

    /// Open or close the current period. Repeating the current state is a no-op.
    pub fn set_active(&mut self, active: bool, now: i64) -> Transition {
        let transition = match (self.is_open(), active) {
            (false, true) => {
                self.active_periods.push(ActivePeriod {
                    start: now,
                    end: None,
                });
                Transition::Opened
            }
            (true, false) => {
                if let Some(last) = self.active_periods.last_mut() {
                    last.end = Some(now);
                }
                Transition::Closed
            }
            _ => Transition::Unchanged,
        };

        self.active = self.is_open();
        transition
    }
}

pub fn injury_doc_id(username: &str, timestamp: i64) -> String {
    format!("{}_{}", username, timestamp)
}

/// A body-part location a user can attach injuries to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BodypartLocation {
    pub location: String,
    pub username: String,
}

impl BodypartLocation {
    pub fn doc_id(&self) -> String {
        bodypart_doc_id(&self.username, &self.location)
    }
}

pub fn bodypart_doc_id(username: &str, location: &str) -> String {
    format!("{}_{}", username, urlencoding::encode(location))
}

/// Body of `POST /injury`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InjuryRequest {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Body of `PUT /injury/active`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInjuryActiveRequest {
    pub timestamp: i64,
    pub active: bool,
}

/// Body of `POST /bodyparts` and `DELETE /bodyparts`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BodypartRequest {
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
}
