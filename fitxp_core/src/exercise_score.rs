//! XP for one logged workout entry.
//!
//! total = base * effort multiplier + novelty bonus + personal-best bonus
//!         + lagging-muscle bonus, rounded once at the very end.

use crate::calendar::{local_date, week_start_date};
use crate::config::{CalendarConfig, ExerciseScoringConfig};
use crate::personal_bests::{
    personal_best_bonus, representative_value, PersonalBestBonus, PersonalBestCandidate,
};
use crate::{
    Catalog, ExerciseCategory, ExerciseMetadata, LaggingMuscles, LaggingState, MuscleSet,
    PersonalBestWindows, WorkoutLogEntry,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which muscles were trained at a given moment
#[derive(Clone, Debug, PartialEq)]
pub struct MuscleSession {
    pub at: DateTime<Utc>,
    pub muscles: MuscleSet,
}

/// Build the muscle-session view of a workout history, skipping entries
/// whose exercise is not in the catalog.
pub fn muscle_sessions(history: &[WorkoutLogEntry], catalog: &Catalog) -> Vec<MuscleSession> {
    history
        .iter()
        .filter_map(|entry| {
            let exercise = catalog.exercises.get(&entry.exercise_id)?;
            Some(MuscleSession {
                at: entry.timestamp,
                muscles: exercise.all_muscles(),
            })
        })
        .collect()
}

/// Novelty awarded for the first training of a target muscle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Novelty {
    None,
    FirstOfDay,
    FirstOfWeek,
}

/// Everything besides the entry and exercise that scoring reads
#[derive(Clone, Copy, Debug)]
pub struct ScoringContext<'a> {
    /// Earlier workouts; anything at or after the entry's timestamp is ignored
    pub prior_sessions: &'a [MuscleSession],
    pub lagging: &'a LaggingMuscles,
    /// Stored records for this exercise, before this entry
    pub personal_bests: Option<&'a PersonalBestWindows>,
    pub calendar: &'a CalendarConfig,
}

/// Score with its breakdown
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExerciseScore {
    pub base: f64,
    pub effort_multiplier: f64,
    pub novelty: Novelty,
    pub novelty_bonus: f64,
    pub personal_best: PersonalBestBonus,
    pub lagging_bonus: f64,
    /// Representative measurement, used to update personal bests
    pub candidate: Option<PersonalBestCandidate>,
    pub total: i64,
}

/// Effort multiplier by category
pub fn effort_multiplier(category: &ExerciseCategory) -> f64 {
    match category {
        ExerciseCategory::Compound => 1.5,
        ExerciseCategory::Cardio => 1.2,
        ExerciseCategory::Isolation
        | ExerciseCategory::Core
        | ExerciseCategory::Strength
        | ExerciseCategory::Other(_) => 1.0,
    }
}

/// Unrounded base score.
///
/// Sets are used when at least one has reps; otherwise duration. Sets
/// without reps contribute nothing.
pub fn base_score(entry: &WorkoutLogEntry, config: &ExerciseScoringConfig) -> f64 {
    let has_rep_sets = entry.sets.iter().any(|set| set.effective_reps().is_some());

    if has_rep_sets {
        entry
            .sets
            .iter()
            .map(|set| match (set.effective_reps(), set.effective_weight()) {
                (Some(reps), Some(weight)) => reps * weight * config.weight_coeff,
                (Some(reps), None) => reps * config.bodyweight_coeff,
                (None, _) => 0.0,
            })
            .sum()
    } else {
        entry
            .effective_duration()
            .map_or(0.0, |minutes| minutes * config.duration_coeff)
    }
}

fn novelty_for(
    entry: &WorkoutLogEntry,
    target: &MuscleSet,
    ctx: &ScoringContext<'_>,
) -> Novelty {
    if target.is_empty() {
        return Novelty::None;
    }

    let day = local_date(entry.timestamp, ctx.calendar);
    let week = week_start_date(day, ctx.calendar.week_start);

    let earlier_this_week: Vec<&MuscleSession> = ctx
        .prior_sessions
        .iter()
        .filter(|s| s.at <= entry.timestamp)
        .filter(|s| week_start_date(local_date(s.at, ctx.calendar), ctx.calendar.week_start) == week)
        .collect();

    let fresh_this_week = target
        .iter()
        .any(|m| !earlier_this_week.iter().any(|s| s.muscles.contains(m)));
    if fresh_this_week {
        return Novelty::FirstOfWeek;
    }

    let fresh_today = target.iter().any(|m| {
        !earlier_this_week
            .iter()
            .filter(|s| local_date(s.at, ctx.calendar) == day)
            .any(|s| s.muscles.contains(m))
    });
    if fresh_today {
        Novelty::FirstOfDay
    } else {
        Novelty::None
    }
}

fn lagging_bonus(
    muscles: &MuscleSet,
    lagging: &LaggingMuscles,
    config: &ExerciseScoringConfig,
) -> f64 {
    muscles
        .iter()
        .filter_map(|m| lagging.get(m))
        .map(|state| match state {
            LaggingState::NeverTrained => config.never_trained_bonus,
            LaggingState::UnderTrained => config.under_trained_bonus,
            LaggingState::Neglected => config.neglected_bonus,
        })
        .fold(0.0, f64::max)
}

/// Score one workout entry. Pure; the caller persists the result.
pub fn score_exercise(
    entry: &WorkoutLogEntry,
    exercise: &ExerciseMetadata,
    ctx: &ScoringContext<'_>,
    config: &ExerciseScoringConfig,
) -> ExerciseScore {
    let base = base_score(entry, config);
    let multiplier = effort_multiplier(&exercise.category);

    let novelty = novelty_for(entry, &exercise.target, ctx);
    let novelty_bonus = match novelty {
        Novelty::FirstOfWeek => config.first_of_week_bonus,
        Novelty::FirstOfDay => config.first_of_day_bonus,
        Novelty::None => 0.0,
    };

    let candidate = representative_value(entry, config);
    let personal_best = match (&candidate, ctx.personal_bests) {
        (Some(candidate), Some(existing)) => {
            personal_best_bonus(existing, candidate, entry.timestamp)
        }
        _ => PersonalBestBonus::default(),
    };

    let lagging = lagging_bonus(&exercise.all_muscles(), ctx.lagging, config);

    let raw = base * multiplier + novelty_bonus + personal_best.total + lagging;
    let total = if raw.is_finite() { raw.round() as i64 } else { 0 };

    tracing::debug!(
        "Scored {} ({}): base {:.2} x{} + novelty {} + pb {} + lagging {} = {}",
        entry.id,
        exercise.id,
        base,
        multiplier,
        novelty_bonus,
        personal_best.total,
        lagging,
        total
    );

    ExerciseScore {
        base,
        effort_multiplier: multiplier,
        novelty,
        novelty_bonus,
        personal_best,
        lagging_bonus: lagging,
        candidate,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PersonalBestRecord, PersonalBestType, SetEntry};
    use chrono::{Duration, TimeZone};

    // Wednesday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 18, 0, 0).unwrap()
    }

    fn exercise(category: ExerciseCategory, target: &str) -> ExerciseMetadata {
        ExerciseMetadata {
            id: "ex".into(),
            name: "Exercise".into(),
            target: MuscleSet::parse(target),
            secondary_muscles: MuscleSet::new(),
            category,
            equipment: None,
        }
    }

    fn entry(sets: Vec<SetEntry>, duration: Option<f64>) -> WorkoutLogEntry {
        let mut entry = WorkoutLogEntry::new("u1", "ex", now());
        entry.sets = sets;
        entry.duration = duration;
        entry
    }

    fn session(muscles: &str, at: DateTime<Utc>) -> MuscleSession {
        MuscleSession {
            at,
            muscles: MuscleSet::parse(muscles),
        }
    }

    fn score_with(
        entry: &WorkoutLogEntry,
        exercise: &ExerciseMetadata,
        prior: &[MuscleSession],
        bests: Option<&PersonalBestWindows>,
    ) -> ExerciseScore {
        let lagging = LaggingMuscles::new();
        let calendar = CalendarConfig::default();
        let ctx = ScoringContext {
            prior_sessions: prior,
            lagging: &lagging,
            personal_bests: bests,
            calendar: &calendar,
        };
        score_exercise(entry, exercise, &ctx, &ExerciseScoringConfig::default())
    }

    #[test]
    fn test_weighted_compound_base() {
        let config = ExerciseScoringConfig::default();
        let e = entry(vec![SetEntry::new(100.0, 5.0), SetEntry::new(80.0, 8.0)], None);
        assert!((base_score(&e, &config) - 114.0).abs() < 1e-9);

        // Earlier today on chest: no novelty
        let prior = [session("chest", now() - Duration::hours(2))];
        let score = score_with(&e, &exercise(ExerciseCategory::Compound, "chest"), &prior, None);
        assert_eq!(score.novelty, Novelty::None);
        assert_eq!(score.total, 171);
    }

    #[test]
    fn test_bodyweight_and_duration() {
        let config = ExerciseScoringConfig::default();
        let e = entry(vec![SetEntry::bodyweight(10.0), SetEntry::bodyweight(8.0)], Some(30.0));
        // Sets win over duration
        assert_eq!(base_score(&e, &config), 18.0);

        let e = entry(vec![], Some(30.0));
        assert_eq!(base_score(&e, &config), 150.0);
        let prior = [session("heart", now() - Duration::hours(1))];
        let score = score_with(&e, &exercise(ExerciseCategory::Cardio, "heart"), &prior, None);
        assert_eq!(score.total, 180);
    }

    #[test]
    fn test_malformed_sets_score_zero() {
        let config = ExerciseScoringConfig::default();
        let e = entry(
            vec![
                SetEntry::default(),
                SetEntry {
                    weight: Some(100.0),
                    reps: Some(0.0),
                },
            ],
            None,
        );
        assert_eq!(base_score(&e, &config), 0.0);

        // Malformed sets fall through to duration when one is present
        let e = entry(vec![SetEntry::default()], Some(10.0));
        assert_eq!(base_score(&e, &config), 50.0);
    }

    #[test]
    fn test_rounds_only_at_end() {
        // 2 sets of 1.5 x 3 at 0.1 = 0.45 each; 0.9 total rounds to 1
        let e = entry(vec![SetEntry::new(1.5, 3.0), SetEntry::new(1.5, 3.0)], None);
        let prior = [session("biceps", now() - Duration::minutes(30))];
        let score = score_with(&e, &exercise(ExerciseCategory::Isolation, "biceps"), &prior, None);
        assert_eq!(score.total, 1);
    }

    #[test]
    fn test_novelty_week_then_day() {
        let e = entry(vec![SetEntry::bodyweight(10.0)], None);
        let ex = exercise(ExerciseCategory::Core, "abs");

        // Nothing earlier this week
        let score = score_with(&e, &ex, &[], None);
        assert_eq!(score.novelty, Novelty::FirstOfWeek);
        assert_eq!(score.total, 35);

        // Trained Monday, not yet today
        let monday = Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap();
        let score = score_with(&e, &ex, &[session("abs", monday)], None);
        assert_eq!(score.novelty, Novelty::FirstOfDay);
        assert_eq!(score.total, 20);

        // Last week's training does not count
        let last_sunday = Utc.with_ymd_and_hms(2024, 1, 7, 9, 0, 0).unwrap();
        let score = score_with(&e, &ex, &[session("abs", last_sunday)], None);
        assert_eq!(score.novelty, Novelty::FirstOfWeek);

        // Sessions after the entry are ignored
        let later = now() + Duration::hours(1);
        let score = score_with(&e, &ex, &[session("abs", monday), session("abs", later)], None);
        assert_eq!(score.novelty, Novelty::FirstOfDay);

        // An earlier log with the same timestamp counts as prior
        let score = score_with(&e, &ex, &[session("abs", e.timestamp)], None);
        assert_eq!(score.novelty, Novelty::None);
    }

    #[test]
    fn test_personal_best_bonus_included() {
        let e = entry(vec![SetEntry::new(160.0, 1.0)], None);
        let bests = PersonalBestWindows {
            all_time: Some(PersonalBestRecord {
                value: 150.0,
                kind: PersonalBestType::OneRepMax,
                unit: "kg".into(),
                date: now() - Duration::days(100),
            }),
            ..Default::default()
        };
        let prior = [session("quads", now() - Duration::hours(3))];
        let score = score_with(&e, &exercise(ExerciseCategory::Compound, "quads"), &prior, Some(&bests));
        // 160 * 1 * 0.1 * 1.5 = 24, plus 300 all-time
        assert_eq!(score.personal_best.total, 300.0);
        assert_eq!(score.total, 324);
        assert_eq!(score.candidate.unwrap().value, 160.0);
    }

    #[test]
    fn test_lagging_bonus_takes_largest() {
        let config = ExerciseScoringConfig::default();
        let mut lagging = LaggingMuscles::new();
        lagging.insert("glutes".into(), LaggingState::UnderTrained);
        lagging.insert("hamstrings".into(), LaggingState::NeverTrained);

        let muscles = MuscleSet::parse("glutes, hamstrings, quads");
        assert_eq!(lagging_bonus(&muscles, &lagging, &config), 50.0);
        assert_eq!(lagging_bonus(&MuscleSet::parse("quads"), &lagging, &config), 0.0);
    }

    #[test]
    fn test_muscle_sessions_skip_unknown() {
        let mut catalog = Catalog::default();
        catalog.exercises.insert("ex".into(), exercise(ExerciseCategory::Core, "abs"));
        let history = vec![
            WorkoutLogEntry::new("u1", "ex", now()),
            WorkoutLogEntry::new("u1", "missing", now()),
        ];
        let sessions = muscle_sessions(&history, &catalog);
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].muscles.contains("abs"));
    }
}
