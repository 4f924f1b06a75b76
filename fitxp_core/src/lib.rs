#![forbid(unsafe_code)]

//! Core scoring engine and domain model for fitxp.
//!
//! This crate provides:
//! - Domain types (exercises, foods, log entries, user profile)
//! - Leveling, exercise and food scoring, personal bests, streaks
//! - Time-windowed muscle load and XP reconciliation
//! - Persistence adapters (JSONL logs, profile store, CSV export)
//!
//! The scoring modules are pure: they take an explicit reference date and
//! never touch the filesystem or the clock.

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod calendar;
pub mod leveling;
pub mod personal_bests;
pub mod muscle_load;
pub mod exercise_score;
pub mod nutrition;
pub mod food_score;
pub mod streak;
pub mod reconcile;
pub mod progress;
pub mod log_store;
pub mod profile_store;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use leveling::{level_from_xp, title_for_level, xp_required_for_level, LevelCurve, LevelProgress};
pub use log_store::{JsonlSink, LogRecord, LogSink};
pub use history::{load_food_history, load_workout_history};
pub use progress::{record_food, record_workout, FoodOutcome, WorkoutOutcome};
pub use reconcile::{recalculate_total_xp_from_logs, validate_user_xp, XpValidation};
