// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GainsIQ: workout, body-weight and injury tracking API
//!
//! This crate provides the backend API that authenticates callers, keeps
//! workout set numbering consistent, estimates body-weight trends and
//! tracks injury activity periods.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{AnalysisNotifier, Authenticator, InjuryTracker, SetLedger, WeightService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub authenticator: Authenticator,
    pub notifier: Arc<dyn AnalysisNotifier>,
    pub sets: SetLedger,
    pub weights: WeightService,
    pub injuries: InjuryTracker,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn Store>,
        authenticator: Authenticator,
        notifier: Arc<dyn AnalysisNotifier>,
    ) -> Self {
        Self {
            sets: SetLedger::new(db.clone()),
            weights: WeightService::new(db.clone()),
            injuries: InjuryTracker::new(db.clone()),
            config,
            db,
            authenticator,
            notifier,
        }
    }
}
