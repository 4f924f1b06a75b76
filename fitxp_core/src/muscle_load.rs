//! Per-muscle training load over rolling windows.
//!
//! Two modes feed the same [`MuscleScoreRecord`]s:
//! - [`calculate_time_based_muscle_scores`] rebuilds every window from the
//!   full workout history relative to a reference date.
//! - [`apply_workout_to_muscle_scores`] adds one new log to all six counters.
//!
//! Incremental contributions never age out of the short windows, so between
//! full recomputes `today`..`30day` are upper bounds; they are exact only
//! right after a recompute. [`cleanup_expired_scores`] is the cheap daily
//! pass that at least resets `today`.
//!
//! Every muscle a log touches receives the full log score (no splitting).

use crate::calendar::{days_between, local_date};
use crate::config::{CalendarConfig, ExerciseScoringConfig};
use crate::{
    Catalog, LaggingMuscles, LaggingState, MuscleScoreRecord, MuscleSet, WorkoutLogEntry,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Muscle name → windowed load
pub type MuscleScores = BTreeMap<String, MuscleScoreRecord>;

/// One of the six muscle-load windows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleWindow {
    Today,
    ThreeDay,
    SevenDay,
    FourteenDay,
    ThirtyDay,
    Lifetime,
}

impl MuscleWindow {
    pub const ALL: [MuscleWindow; 6] = [
        MuscleWindow::Today,
        MuscleWindow::ThreeDay,
        MuscleWindow::SevenDay,
        MuscleWindow::FourteenDay,
        MuscleWindow::ThirtyDay,
        MuscleWindow::Lifetime,
    ];

    /// Largest day distance counted by this window, `None` for lifetime
    pub fn max_days(self) -> Option<i64> {
        match self {
            MuscleWindow::Today => Some(0),
            MuscleWindow::ThreeDay => Some(3),
            MuscleWindow::SevenDay => Some(7),
            MuscleWindow::FourteenDay => Some(14),
            MuscleWindow::ThirtyDay => Some(30),
            MuscleWindow::Lifetime => None,
        }
    }

    pub fn value(self, record: &MuscleScoreRecord) -> f64 {
        match self {
            MuscleWindow::Today => record.today,
            MuscleWindow::ThreeDay => record.three_day,
            MuscleWindow::SevenDay => record.seven_day,
            MuscleWindow::FourteenDay => record.fourteen_day,
            MuscleWindow::ThirtyDay => record.thirty_day,
            MuscleWindow::Lifetime => record.lifetime,
        }
    }

    fn value_mut(self, record: &mut MuscleScoreRecord) -> &mut f64 {
        match self {
            MuscleWindow::Today => &mut record.today,
            MuscleWindow::ThreeDay => &mut record.three_day,
            MuscleWindow::SevenDay => &mut record.seven_day,
            MuscleWindow::FourteenDay => &mut record.fourteen_day,
            MuscleWindow::ThirtyDay => &mut record.thirty_day,
            MuscleWindow::Lifetime => &mut record.lifetime,
        }
    }

    fn contains(self, days_ago: i64) -> bool {
        self.max_days().map_or(true, |max| days_ago <= max)
    }
}

fn usable_score(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

/// Rebuild every muscle's windows from the whole workout history.
///
/// Entries whose exercise is missing from the catalog, or which touch no
/// muscles, contribute nothing. Entries dated after `reference` count as
/// today.
pub fn calculate_time_based_muscle_scores(
    history: &[WorkoutLogEntry],
    catalog: &Catalog,
    reference: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> MuscleScores {
    let mut scores = MuscleScores::new();
    let mut skipped = 0usize;

    for entry in history {
        let Some(exercise) = catalog.exercises.get(&entry.exercise_id) else {
            tracing::debug!(
                "Skipping log {}: unknown exercise {}",
                entry.id,
                entry.exercise_id
            );
            skipped += 1;
            continue;
        };

        let muscles = exercise.all_muscles();
        if muscles.is_empty() {
            tracing::debug!("Skipping log {}: exercise {} has no muscles", entry.id, exercise.id);
            skipped += 1;
            continue;
        }

        let score = usable_score(entry.frozen_score());
        let days_ago = days_between(entry.timestamp, reference, calendar).max(0);

        for muscle in muscles.iter() {
            let record = scores.entry(muscle.to_string()).or_default();
            for window in MuscleWindow::ALL {
                if window.contains(days_ago) {
                    *window.value_mut(record) += score;
                }
            }
            if MuscleWindow::ThirtyDay.contains(days_ago) {
                record.oldest_relevant_log = Some(match record.oldest_relevant_log {
                    Some(oldest) => oldest.min(entry.timestamp),
                    None => entry.timestamp,
                });
            }
        }
    }

    for record in scores.values_mut() {
        record.last_calculated = Some(reference);
    }

    tracing::info!(
        "Recomputed muscle load for {} muscles from {} logs ({} skipped)",
        scores.len(),
        history.len(),
        skipped
    );

    scores
}

/// Add one freshly logged workout to every window of every muscle it touches.
///
/// A record created here holds exactly this one log, so it is stamped as
/// calculated at `at`. Existing records keep their stamp.
pub fn apply_workout_to_muscle_scores(
    scores: &MuscleScores,
    muscles: &MuscleSet,
    score: f64,
    at: DateTime<Utc>,
) -> MuscleScores {
    let mut updated = scores.clone();
    let score = usable_score(score);

    for muscle in muscles.iter() {
        let record = updated.entry(muscle.to_string()).or_default();
        for window in MuscleWindow::ALL {
            *window.value_mut(record) += score;
        }
        if record.oldest_relevant_log.is_none() {
            record.oldest_relevant_log = Some(at);
        }
        if record.last_calculated.is_none() {
            record.last_calculated = Some(at);
        }
    }

    updated
}

/// Daily maintenance without the log history: zero `today` on every record
/// last calculated on an earlier local day, and stamp `lastCalculated`.
/// `lastCalculated` never moves backwards, so a back-dated reference cannot
/// make a later cleanup drop load from the current day.
///
/// Multi-day windows are left as they are until the next full recompute.
pub fn cleanup_expired_scores(
    scores: &MuscleScores,
    reference: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> MuscleScores {
    let today = local_date(reference, calendar);
    let mut reset = 0usize;

    let cleaned = scores
        .iter()
        .map(|(muscle, record)| {
            let mut record = record.clone();
            let stale = record
                .last_calculated
                .map_or(true, |at| local_date(at, calendar) < today);
            if stale && record.today != 0.0 {
                record.today = 0.0;
                reset += 1;
            }
            record.last_calculated = Some(
                record
                    .last_calculated
                    .map_or(reference, |at| at.max(reference)),
            );
            (muscle.clone(), record)
        })
        .collect();

    tracing::info!("Cleanup reset today's load for {} muscles", reset);
    cleaned
}

/// Convert the legacy single-number-per-muscle format: the old value becomes
/// `lifetime`, every other window starts at zero.
pub fn migrate_legacy_muscle_scores(legacy: &BTreeMap<String, f64>) -> MuscleScores {
    legacy
        .iter()
        .map(|(muscle, value)| {
            (
                muscle.clone(),
                MuscleScoreRecord {
                    lifetime: usable_score(*value),
                    ..Default::default()
                },
            )
        })
        .collect()
}

/// Profile deserializer accepting both the windowed and legacy formats,
/// including a mix of the two.
pub(crate) fn deserialize_muscle_scores<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<MuscleScores, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Legacy(f64),
        Windowed(MuscleScoreRecord),
    }

    let raw = Option::<BTreeMap<String, Stored>>::deserialize(deserializer)?.unwrap_or_default();

    let mut legacy = BTreeMap::new();
    let mut scores = MuscleScores::new();
    for (muscle, stored) in raw {
        match stored {
            Stored::Legacy(value) => {
                legacy.insert(muscle, value);
            }
            Stored::Windowed(record) => {
                scores.insert(muscle, record);
            }
        }
    }

    if !legacy.is_empty() {
        tracing::info!("Migrating {} legacy muscle scores", legacy.len());
        scores.extend(migrate_legacy_muscle_scores(&legacy));
    }
    Ok(scores)
}

/// Classify muscles that deserve a lagging bonus.
///
/// - never trained: no record, or zero lifetime load
/// - neglected: nothing in the last 14 days
/// - under-trained: 30-day load below `under_trained_fraction` of the mean
///   30-day load across trained muscles
pub fn classify_lagging_muscles<'a>(
    scores: &MuscleScores,
    known_muscles: impl IntoIterator<Item = &'a str>,
    config: &ExerciseScoringConfig,
) -> LaggingMuscles {
    let trained: Vec<&MuscleScoreRecord> =
        scores.values().filter(|r| r.lifetime > 0.0).collect();
    let mean_thirty_day = if trained.is_empty() {
        0.0
    } else {
        trained.iter().map(|r| r.thirty_day).sum::<f64>() / trained.len() as f64
    };
    let under_trained_cutoff = mean_thirty_day * config.under_trained_fraction;

    let mut names: Vec<&str> = known_muscles.into_iter().collect();
    names.extend(scores.keys().map(String::as_str));

    let mut lagging = LaggingMuscles::new();
    for name in names {
        let state = match scores.get(name) {
            None => Some(LaggingState::NeverTrained),
            Some(r) if r.lifetime <= 0.0 => Some(LaggingState::NeverTrained),
            Some(r) if r.fourteen_day <= 0.0 => Some(LaggingState::Neglected),
            Some(r) if r.thirty_day < under_trained_cutoff => Some(LaggingState::UnderTrained),
            Some(_) => None,
        };
        if let Some(state) = state {
            lagging.insert(name.to_string(), state);
        }
    }
    lagging
}
