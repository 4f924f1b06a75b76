//! Personal-best tracking across four rolling windows.
//!
//! A logged entry is reduced to one representative measurement (its best
//! set), which is then compared against the stored records for the current
//! (30 day), quarter (90 day), year (365 day) and all-time windows. Pace
//! improves downwards; every other type improves upwards. The first stored
//! record fixes the exercise's type; candidates of any other type are
//! ignored in every window, expired or not.

use crate::config::ExerciseScoringConfig;
use crate::{PersonalBestRecord, PersonalBestType, PersonalBestWindows, WorkoutLogEntry};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// One of the four personal-best windows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PersonalBestWindow {
    Current,
    Quarter,
    Year,
    AllTime,
}

impl PersonalBestWindow {
    /// Shortest window first
    pub const ALL: [PersonalBestWindow; 4] = [
        PersonalBestWindow::Current,
        PersonalBestWindow::Quarter,
        PersonalBestWindow::Year,
        PersonalBestWindow::AllTime,
    ];

    /// Window length in days, `None` for unbounded
    pub fn days(self) -> Option<i64> {
        match self {
            PersonalBestWindow::Current => Some(30),
            PersonalBestWindow::Quarter => Some(90),
            PersonalBestWindow::Year => Some(365),
            PersonalBestWindow::AllTime => None,
        }
    }

    /// XP for beating the record in this window
    pub fn bonus(self) -> f64 {
        match self {
            PersonalBestWindow::Current => 50.0,
            PersonalBestWindow::Quarter => 150.0,
            PersonalBestWindow::Year => 200.0,
            PersonalBestWindow::AllTime => 300.0,
        }
    }

    fn get(self, windows: &PersonalBestWindows) -> Option<&PersonalBestRecord> {
        match self {
            PersonalBestWindow::Current => windows.current.as_ref(),
            PersonalBestWindow::Quarter => windows.quarter.as_ref(),
            PersonalBestWindow::Year => windows.year.as_ref(),
            PersonalBestWindow::AllTime => windows.all_time.as_ref(),
        }
    }

    fn slot(self, windows: &mut PersonalBestWindows) -> &mut Option<PersonalBestRecord> {
        match self {
            PersonalBestWindow::Current => &mut windows.current,
            PersonalBestWindow::Quarter => &mut windows.quarter,
            PersonalBestWindow::Year => &mut windows.year,
            PersonalBestWindow::AllTime => &mut windows.all_time,
        }
    }

    /// The stored record, unless it has aged out of this window
    fn live_record(
        self,
        windows: &PersonalBestWindows,
        now: DateTime<Utc>,
    ) -> Option<&PersonalBestRecord> {
        self.get(windows).filter(|record| match self.days() {
            Some(days) => now - record.date <= Duration::days(days),
            None => true,
        })
    }
}

/// Representative measurement of one logged entry
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonalBestCandidate {
    pub value: f64,
    pub kind: PersonalBestType,
    pub unit: String,
}

impl PersonalBestCandidate {
    fn to_record(&self, now: DateTime<Utc>) -> PersonalBestRecord {
        PersonalBestRecord {
            value: self.value,
            kind: self.kind,
            unit: self.unit.clone(),
            date: now,
        }
    }
}

/// Bonus awarded for beating existing records
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PersonalBestBonus {
    pub total: f64,
    pub beaten: Vec<PersonalBestWindow>,
}

/// Estimated one-rep max (Epley); a single rep is the weight itself
pub fn estimate_one_rep_max(weight: f64, reps: f64) -> f64 {
    if reps == 1.0 {
        weight
    } else {
        weight * (1.0 + reps / 30.0)
    }
}

/// Reduce an entry to the measurement of its best set.
///
/// Weighted sets give a 1RM estimate; bodyweight sets give reps; with no
/// usable sets, duration gives a duration record, or a pace record when a
/// distance is also present. Returns `None` for an entry with nothing usable.
pub fn representative_value(
    entry: &WorkoutLogEntry,
    config: &ExerciseScoringConfig,
) -> Option<PersonalBestCandidate> {
    let best_one_rep_max = entry
        .sets
        .iter()
        .filter_map(|set| Some(estimate_one_rep_max(set.effective_weight()?, set.effective_reps()?)))
        .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))));

    if let Some(value) = best_one_rep_max {
        return Some(PersonalBestCandidate {
            value,
            kind: PersonalBestType::OneRepMax,
            unit: config.weight_unit.clone(),
        });
    }

    let best_reps = entry
        .sets
        .iter()
        .filter_map(|set| set.effective_reps())
        .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))));

    if let Some(value) = best_reps {
        return Some(PersonalBestCandidate {
            value,
            kind: PersonalBestType::Reps,
            unit: "reps".into(),
        });
    }

    let duration = entry.effective_duration()?;
    match entry.effective_distance() {
        Some(distance) => Some(PersonalBestCandidate {
            value: duration / distance,
            kind: PersonalBestType::Pace,
            unit: format!("min/{}", config.distance_unit),
        }),
        None => Some(PersonalBestCandidate {
            value: duration,
            kind: PersonalBestType::Duration,
            unit: "min".into(),
        }),
    }
}

/// Type fixed by the stored records, longest window first. Expired records
/// still count.
pub fn established_kind(windows: &PersonalBestWindows) -> Option<PersonalBestType> {
    PersonalBestWindow::ALL
        .iter()
        .rev()
        .find_map(|window| window.get(windows))
        .map(|record| record.kind)
}

fn conflicts_with_established(windows: &PersonalBestWindows, candidate: &PersonalBestCandidate) -> bool {
    match established_kind(windows) {
        Some(kind) if kind != candidate.kind => {
            tracing::debug!(
                "Ignoring {:?} personal best candidate: exercise tracks {:?}",
                candidate.kind,
                kind
            );
            true
        }
        _ => false,
    }
}

/// Bonus for `candidate` measured against the records as they were before
/// this entry. Must be computed before [`update_personal_bests`].
pub fn personal_best_bonus(
    existing: &PersonalBestWindows,
    candidate: &PersonalBestCandidate,
    now: DateTime<Utc>,
) -> PersonalBestBonus {
    let mut bonus = PersonalBestBonus::default();
    if conflicts_with_established(existing, candidate) {
        return bonus;
    }

    for window in PersonalBestWindow::ALL {
        let Some(record) = window.live_record(existing, now) else {
            continue;
        };
        if record.kind == candidate.kind && candidate.kind.improves(candidate.value, record.value) {
            bonus.total += window.bonus();
            bonus.beaten.push(window);
        }
    }

    if !bonus.beaten.is_empty() {
        tracing::debug!(
            "Personal best {:.2} {} beats {:?} (+{})",
            candidate.value,
            candidate.unit,
            bonus.beaten,
            bonus.total
        );
    }
    bonus
}

/// Fold a candidate into the windows, returning the new records.
///
/// A window takes the candidate when it has no live record or when the
/// candidate improves on it. A candidate whose type differs from
/// [`established_kind`] changes nothing.
pub fn update_personal_bests(
    existing: &PersonalBestWindows,
    candidate: &PersonalBestCandidate,
    now: DateTime<Utc>,
) -> PersonalBestWindows {
    let mut updated = existing.clone();
    if conflicts_with_established(existing, candidate) {
        return updated;
    }

    for window in PersonalBestWindow::ALL {
        let replace = match window.live_record(existing, now) {
            None => true,
            Some(record) if record.kind != candidate.kind => {
                tracing::debug!(
                    "Skipping {:?} personal best: stored type {:?}, logged type {:?}",
                    window,
                    record.kind,
                    candidate.kind
                );
                false
            }
            Some(record) => candidate.kind.improves(candidate.value, record.value),
        };

        if replace {
            *window.slot(&mut updated) = Some(candidate.to_record(now));
        }
    }

    updated
}
