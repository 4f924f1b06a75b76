//! Core domain types for the fitxp engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout and food log entries (frozen once scored)
//! - Exercise and food reference metadata
//! - The mutable user profile aggregates (XP, muscle load, personal bests)
//!
//! Field names serialize in camelCase so the records match the documents
//! the log and profile stores already hold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

// ============================================================================
// Muscle sets
// ============================================================================

/// Normalized set of muscle names (lower-case, trimmed, non-empty).
///
/// Deserializes from a comma-joined string (`"chest, triceps"`), an array of
/// such strings, or null. Serializes as a plain array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MuscleSet(BTreeSet<String>);

impl MuscleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one comma-joined muscle string
    pub fn parse(raw: &str) -> Self {
        let mut set = Self::new();
        set.extend_from_str(raw);
        set
    }

    fn extend_from_str(&mut self, raw: &str) {
        for token in raw.split(',') {
            let token = token.trim().to_lowercase();
            if !token.is_empty() {
                self.0.insert(token);
            }
        }
    }

    pub fn contains(&self, muscle: &str) -> bool {
        self.0.contains(muscle)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Union of two sets
    pub fn union(&self, other: &MuscleSet) -> MuscleSet {
        MuscleSet(self.0.union(&other.0).cloned().collect())
    }
}

impl<S: AsRef<str>> FromIterator<S> for MuscleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for raw in iter {
            set.extend_from_str(raw.as_ref());
        }
        set
    }
}

impl<'de> Deserialize<'de> for MuscleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::One(s)) => MuscleSet::parse(&s),
            Some(Raw::Many(items)) => items.iter().collect(),
            None => MuscleSet::new(),
        })
    }
}

// ============================================================================
// Exercise metadata
// ============================================================================

/// Exercise category, which selects the effort multiplier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExerciseCategory {
    Compound,
    Cardio,
    Isolation,
    Core,
    Strength,
    Other(String),
}

impl From<String> for ExerciseCategory {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "compound" => ExerciseCategory::Compound,
            "cardio" => ExerciseCategory::Cardio,
            "isolation" => ExerciseCategory::Isolation,
            "core" => ExerciseCategory::Core,
            "strength" => ExerciseCategory::Strength,
            other => ExerciseCategory::Other(other.to_string()),
        }
    }
}

impl From<ExerciseCategory> for String {
    fn from(c: ExerciseCategory) -> Self {
        match c {
            ExerciseCategory::Compound => "compound".into(),
            ExerciseCategory::Cardio => "cardio".into(),
            ExerciseCategory::Isolation => "isolation".into(),
            ExerciseCategory::Core => "core".into(),
            ExerciseCategory::Strength => "strength".into(),
            ExerciseCategory::Other(s) => s,
        }
    }
}

/// Read-only exercise reference data
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseMetadata {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target: MuscleSet,
    #[serde(default)]
    pub secondary_muscles: MuscleSet,
    pub category: ExerciseCategory,
    #[serde(default)]
    pub equipment: Option<String>,
}

impl ExerciseMetadata {
    /// Every muscle this exercise touches (target and secondary)
    pub fn all_muscles(&self) -> MuscleSet {
        self.target.union(&self.secondary_muscles)
    }
}

// ============================================================================
// Food metadata
// ============================================================================

/// Canonical nutrition facts for one reference serving.
///
/// Built at the boundary by [`NutritionFacts::from_payload`]; engine code only
/// ever sees this shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    /// Micronutrient amounts keyed by numeric attribute id
    #[serde(default)]
    pub full_nutrients: BTreeMap<u32, f64>,
}

/// Read-only food reference data
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodMetadata {
    pub id: String,
    pub name: String,
    pub nutrition: NutritionFacts,
    /// Food-group code 0-9, absent for unclassified/branded foods
    #[serde(default)]
    pub food_group: Option<u8>,
}

// ============================================================================
// Log entries
// ============================================================================

/// One performed set
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<f64>,
}

impl SetEntry {
    pub fn new(weight: f64, reps: f64) -> Self {
        Self {
            weight: Some(weight),
            reps: Some(reps),
        }
    }

    pub fn bodyweight(reps: f64) -> Self {
        Self {
            weight: None,
            reps: Some(reps),
        }
    }

    /// Weight if positive and finite
    pub fn effective_weight(&self) -> Option<f64> {
        self.weight.filter(|w| w.is_finite() && *w > 0.0)
    }

    /// Reps if positive and finite
    pub fn effective_reps(&self) -> Option<f64> {
        self.reps.filter(|r| r.is_finite() && *r > 0.0)
    }
}

/// A logged workout. `score` is computed once at log time and never
/// recomputed afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLogEntry {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub exercise_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
    /// Duration in minutes
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub score: Option<f64>,
}

impl WorkoutLogEntry {
    /// Create an unscored entry with a fresh id
    pub fn new(
        user_id: impl Into<String>,
        exercise_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            exercise_id: exercise_id.into(),
            timestamp,
            sets: Vec::new(),
            duration: None,
            distance: None,
            score: None,
        }
    }

    /// Duration if positive and finite
    pub fn effective_duration(&self) -> Option<f64> {
        self.duration.filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Distance if positive and finite
    pub fn effective_distance(&self) -> Option<f64> {
        self.distance.filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Persisted score, with missing or non-finite values read as zero
    pub fn frozen_score(&self) -> f64 {
        self.score.filter(|s| s.is_finite()).unwrap_or(0.0)
    }
}

/// A logged food. `xp` is frozen at log time.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLogEntry {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub food_id: String,
    pub timestamp: DateTime<Utc>,
    /// Number of reference servings eaten
    #[serde(default = "default_serving")]
    pub serving: f64,
    #[serde(default)]
    pub units: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub xp: Option<f64>,
}

fn default_serving() -> f64 {
    1.0
}

impl FoodLogEntry {
    /// Create an unscored entry with a fresh id
    pub fn new(
        user_id: impl Into<String>,
        food_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        serving: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            food_id: food_id.into(),
            timestamp,
            serving,
            units: "serving".into(),
            xp: None,
        }
    }

    /// Persisted XP, with missing or non-finite values read as zero
    pub fn frozen_xp(&self) -> f64 {
        self.xp.filter(|x| x.is_finite()).unwrap_or(0.0)
    }
}

/// Accepts a number, a numeric string, or anything else (read as absent).
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

// ============================================================================
// Profile aggregates
// ============================================================================

/// Six rolling counters for one muscle.
///
/// Invariant after a full recompute:
/// `lifetime >= 30day >= 14day >= 7day >= 3day >= today >= 0`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleScoreRecord {
    #[serde(default)]
    pub today: f64,
    #[serde(default, rename = "3day")]
    pub three_day: f64,
    #[serde(default, rename = "7day")]
    pub seven_day: f64,
    #[serde(default, rename = "14day")]
    pub fourteen_day: f64,
    #[serde(default, rename = "30day")]
    pub thirty_day: f64,
    #[serde(default)]
    pub lifetime: f64,
    #[serde(default)]
    pub last_calculated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub oldest_relevant_log: Option<DateTime<Utc>>,
}

impl MuscleScoreRecord {
    /// True when the window ordering invariant holds
    pub fn windows_ordered(&self) -> bool {
        self.lifetime >= self.thirty_day
            && self.thirty_day >= self.fourteen_day
            && self.fourteen_day >= self.seven_day
            && self.seven_day >= self.three_day
            && self.three_day >= self.today
            && self.today >= 0.0
    }
}

/// Kind of personal-best measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonalBestType {
    #[serde(rename = "1rm")]
    OneRepMax,
    #[serde(rename = "reps")]
    Reps,
    #[serde(rename = "duration")]
    Duration,
    #[serde(rename = "pace")]
    Pace,
}

impl PersonalBestType {
    /// Pace improves downwards; every other type improves upwards
    pub fn lower_is_better(self) -> bool {
        matches!(self, PersonalBestType::Pace)
    }

    /// True if `candidate` beats `existing` under this type's direction
    pub fn improves(self, candidate: f64, existing: f64) -> bool {
        if self.lower_is_better() {
            candidate < existing
        } else {
            candidate > existing
        }
    }
}

/// One personal-best record within a window
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonalBestRecord {
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: PersonalBestType,
    pub unit: String,
    pub date: DateTime<Utc>,
}

/// Personal bests for one exercise across the four windows
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBestWindows {
    #[serde(default)]
    pub current: Option<PersonalBestRecord>,
    #[serde(default)]
    pub quarter: Option<PersonalBestRecord>,
    #[serde(default)]
    pub year: Option<PersonalBestRecord>,
    #[serde(default)]
    pub all_time: Option<PersonalBestRecord>,
}

/// Daily macro targets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MacroGoals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Caller-supplied lagging classification of a muscle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaggingState {
    NeverTrained,
    UnderTrained,
    Neglected,
}

/// Lagging classification keyed by normalized muscle name
pub type LaggingMuscles = HashMap<String, LaggingState>;

/// User's gamification profile, owned by the profile store
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub user_id: String,
    #[serde(default, rename = "totalXP")]
    pub total_xp: f64,
    #[serde(
        default,
        deserialize_with = "crate::muscle_load::deserialize_muscle_scores"
    )]
    pub muscle_scores: BTreeMap<String, MuscleScoreRecord>,
    #[serde(default)]
    pub personal_bests: BTreeMap<String, PersonalBestWindows>,
    #[serde(default)]
    pub macro_goals: Option<MacroGoals>,
    #[serde(default = "crate::leveling::default_curve_version")]
    pub level_curve_version: u32,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            level_curve_version: crate::leveling::LEVEL_CURVE_VERSION,
            ..Self::default()
        }
    }
}

// ============================================================================
// Catalog Type
// ============================================================================

/// Reference catalog of exercises and foods
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub exercises: HashMap<String, ExerciseMetadata>,
    #[serde(default)]
    pub foods: HashMap<String, FoodMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muscle_set_from_string() {
        let set: MuscleSet = serde_json::from_str(r#"" Chest, triceps ,,""#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("chest"));
        assert!(set.contains("triceps"));
    }

    #[test]
    fn test_muscle_set_from_array_of_joined_strings() {
        let set: MuscleSet =
            serde_json::from_str(r#"["Shoulders, Triceps", "core", "TRICEPS"]"#).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["core", "shoulders", "triceps"]);
    }

    #[test]
    fn test_muscle_set_from_null() {
        let set: MuscleSet = serde_json::from_str("null").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_exercise_category_parsing() {
        assert_eq!(ExerciseCategory::from("Compound".to_string()), ExerciseCategory::Compound);
        assert_eq!(ExerciseCategory::from("cardio".to_string()), ExerciseCategory::Cardio);
        assert_eq!(
            ExerciseCategory::from("plyometrics".to_string()),
            ExerciseCategory::Other("plyometrics".into())
        );
    }

    #[test]
    fn test_lenient_score_parsing() {
        let json = r#"{
            "id": "w1",
            "exerciseId": "squat",
            "timestamp": "2024-01-15T10:30:00Z",
            "score": "not a number"
        }"#;
        let entry: WorkoutLogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.score, None);
        assert_eq!(entry.frozen_score(), 0.0);

        let json = r#"{
            "id": "f1",
            "foodId": "apple",
            "timestamp": "2024-01-15T10:30:00Z",
            "xp": "42"
        }"#;
        let entry: FoodLogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.frozen_xp(), 42.0);
        assert_eq!(entry.serving, 1.0);
    }

    #[test]
    fn test_muscle_record_serde_names() {
        let record = MuscleScoreRecord {
            today: 1.0,
            three_day: 2.0,
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["3day"], 2.0);
        assert!(json.get("lastCalculated").is_some());
    }

    #[test]
    fn test_pace_direction() {
        assert!(PersonalBestType::Pace.improves(4.5, 5.0));
        assert!(!PersonalBestType::Pace.improves(5.5, 5.0));
        assert!(PersonalBestType::OneRepMax.improves(105.0, 100.0));
    }
}
