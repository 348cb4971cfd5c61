// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod exercise;
pub mod injury;
pub mod user;
pub mod workout_set;

pub use exercise::{Analysis, Exercise, WeightEntry};
pub use injury::{ActivePeriod, BodypartLocation, Injury, Transition};
pub use user::User;
pub use workout_set::{SetKey, WeightModulation, WorkoutSet};
