// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credentials;
pub mod injury;
pub mod jwks;
pub mod jwt;
pub mod set_ledger;
pub mod tasks;
pub mod weight_trend;

pub use credentials::{AuthUser, Authenticator, StaticKeyValidator, StoredUserValidator};
pub use injury::InjuryTracker;
pub use jwks::{HttpJwksSource, JwksCache, JwksSource, StaticJwksSource};
pub use jwt::CognitoVerifier;
pub use set_ledger::{DeleteOutcome, SetLedger};
pub use tasks::{AnalysisNotifier, RecordingNotifier, TasksService};
pub use weight_trend::{WeightService, WeightTrend};
