//! Profile reducers for new log events and maintenance passes.
//!
//! Each function takes the current profile by reference and returns a new
//! one, so the caller can run it inside whatever read-modify-write guard the
//! profile store offers. Nothing here persists anything.

use crate::config::{CalendarConfig, Config};
use crate::exercise_score::{score_exercise, ExerciseScore, MuscleSession, ScoringContext};
use crate::food_score::{score_food, FoodScore};
use crate::leveling::LevelCurve;
use crate::muscle_load::{
    apply_workout_to_muscle_scores, calculate_time_based_muscle_scores, classify_lagging_muscles,
    cleanup_expired_scores,
};
use crate::personal_bests::update_personal_bests;
use crate::{
    Catalog, ExerciseMetadata, FoodLogEntry, FoodMetadata, UserProfile, WorkoutLogEntry,
};
use chrono::{DateTime, Utc};

/// Result of logging one workout
#[derive(Clone, Debug)]
pub struct WorkoutOutcome {
    /// The entry with its frozen score filled in
    pub entry: WorkoutLogEntry,
    pub profile: UserProfile,
    pub score: ExerciseScore,
    pub level_before: u32,
    pub level_after: u32,
}

impl WorkoutOutcome {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Result of logging one food
#[derive(Clone, Debug)]
pub struct FoodOutcome {
    pub entry: FoodLogEntry,
    pub profile: UserProfile,
    pub score: FoodScore,
    pub level_before: u32,
    pub level_after: u32,
}

impl FoodOutcome {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Score a new workout and fold it into the profile: total XP, personal
/// bests for the exercise, and the muscle-load counters.
///
/// `prior_sessions` is the muscle view of earlier workouts, used for the
/// novelty bonus.
pub fn record_workout(
    profile: &UserProfile,
    entry: &WorkoutLogEntry,
    exercise: &ExerciseMetadata,
    prior_sessions: &[MuscleSession],
    config: &Config,
) -> WorkoutOutcome {
    let curve = LevelCurve::from(&config.leveling);
    let muscles = exercise.all_muscles();
    let lagging = classify_lagging_muscles(&profile.muscle_scores, muscles.iter(), &config.exercise);
    let existing_bests = profile.personal_bests.get(&entry.exercise_id);

    let ctx = ScoringContext {
        prior_sessions,
        lagging: &lagging,
        personal_bests: existing_bests,
        calendar: &config.calendar,
    };
    let score = score_exercise(entry, exercise, &ctx, &config.exercise);
    let points = score.total as f64;

    let mut scored = entry.clone();
    scored.score = Some(points);

    let mut updated = profile.clone();
    updated.total_xp += points;
    // Roll `today` over first so the new load lands on the right day
    let current = cleanup_expired_scores(&profile.muscle_scores, entry.timestamp, &config.calendar);
    updated.muscle_scores =
        apply_workout_to_muscle_scores(&current, &muscles, points, entry.timestamp);
    if let Some(candidate) = &score.candidate {
        let bests = update_personal_bests(
            &existing_bests.cloned().unwrap_or_default(),
            candidate,
            entry.timestamp,
        );
        updated.personal_bests.insert(entry.exercise_id.clone(), bests);
    }

    let level_before = curve.level_from_xp(profile.total_xp).level;
    let level_after = curve.level_from_xp(updated.total_xp).level;
    if level_after > level_before {
        tracing::info!("Level up: {} -> {}", level_before, level_after);
    }

    WorkoutOutcome {
        entry: scored,
        profile: updated,
        score,
        level_before,
        level_after,
    }
}

/// Score a new food entry and add its XP to the profile
pub fn record_food(
    profile: &UserProfile,
    entry: &FoodLogEntry,
    food: &FoodMetadata,
    config: &Config,
) -> FoodOutcome {
    let curve = LevelCurve::from(&config.leveling);
    let score = score_food(entry, food);
    let points = score.total as f64;

    let mut scored = entry.clone();
    scored.xp = Some(points);

    let mut updated = profile.clone();
    updated.total_xp += points;

    let level_before = curve.level_from_xp(profile.total_xp).level;
    let level_after = curve.level_from_xp(updated.total_xp).level;

    FoodOutcome {
        entry: scored,
        profile: updated,
        score,
        level_before,
        level_after,
    }
}

/// Replace the profile's muscle load with a full recompute from history
pub fn recompute_muscle_load(
    profile: &UserProfile,
    history: &[WorkoutLogEntry],
    catalog: &Catalog,
    reference: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> UserProfile {
    UserProfile {
        muscle_scores: calculate_time_based_muscle_scores(history, catalog, reference, calendar),
        ..profile.clone()
    }
}

/// Run the lightweight daily cleanup over the profile's muscle load
pub fn cleanup_muscle_load(
    profile: &UserProfile,
    reference: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> UserProfile {
    UserProfile {
        muscle_scores: cleanup_expired_scores(&profile.muscle_scores, reference, calendar),
        ..profile.clone()
    }
}
