//! XP drift detection.
//!
//! The stored `totalXP` should equal the sum of the frozen per-log scores.
//! Scores are never re-derived from sets or nutrition here.

use crate::{FoodLogEntry, UserProfile, WorkoutLogEntry};
use serde::Serialize;

/// Sum of persisted exercise scores and food XP; missing or non-finite
/// values count as zero
pub fn recalculate_total_xp_from_logs(
    exercise_logs: &[WorkoutLogEntry],
    food_logs: &[FoodLogEntry],
) -> f64 {
    let exercise: f64 = exercise_logs.iter().map(WorkoutLogEntry::frozen_score).sum();
    let food: f64 = food_logs.iter().map(FoodLogEntry::frozen_xp).sum();
    exercise + food
}

/// Outcome of comparing stored against recalculated XP
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XpValidation {
    pub is_valid: bool,
    #[serde(rename = "calculatedXP")]
    pub calculated_xp: f64,
    #[serde(rename = "storedXP")]
    pub stored_xp: f64,
    /// stored minus calculated
    pub discrepancy: f64,
}

/// Compare the profile's stored total (0 when there is no profile) with the
/// total recalculated from the logs
pub fn validate_user_xp(
    profile: Option<&UserProfile>,
    exercise_logs: &[WorkoutLogEntry],
    food_logs: &[FoodLogEntry],
    tolerance: f64,
) -> XpValidation {
    let stored_xp = profile
        .map(|p| p.total_xp)
        .filter(|xp| xp.is_finite())
        .unwrap_or(0.0);
    let calculated_xp = recalculate_total_xp_from_logs(exercise_logs, food_logs);
    let discrepancy = stored_xp - calculated_xp;
    let is_valid = discrepancy.abs() <= tolerance;

    if is_valid {
        tracing::info!(
            "XP valid: stored {} matches {} logs",
            stored_xp,
            exercise_logs.len() + food_logs.len()
        );
    } else {
        tracing::warn!(
            "XP drift: stored {}, calculated {}, discrepancy {}",
            stored_xp,
            calculated_xp,
            discrepancy
        );
    }

    XpValidation {
        is_valid,
        calculated_xp,
        stored_xp,
        discrepancy,
    }
}

/// Remediation chosen by the caller: a profile whose total is the
/// recalculated value. The input profile is not touched.
pub fn correct_user_xp(profile: &UserProfile, validation: &XpValidation) -> UserProfile {
    tracing::info!(
        "Correcting total XP {} -> {}",
        profile.total_xp,
        validation.calculated_xp
    );
    UserProfile {
        total_xp: validation.calculated_xp,
        ..profile.clone()
    }
}
