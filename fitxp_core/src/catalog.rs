//! Default catalog of exercises and foods.
//!
//! The built-in entries cover common lifts, bodyweight and cardio work plus
//! a handful of whole foods. A `catalog.json` in the data directory can add
//! to or override them.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Cached default catalog, built once on first use
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn exercise(
    id: &str,
    name: &str,
    target: &str,
    secondary: &str,
    category: ExerciseCategory,
    equipment: Option<&str>,
) -> ExerciseMetadata {
    ExerciseMetadata {
        id: id.into(),
        name: name.into(),
        target: MuscleSet::parse(target),
        secondary_muscles: MuscleSet::parse(secondary),
        category,
        equipment: equipment.map(Into::into),
    }
}

struct FoodRow {
    id: &'static str,
    name: &'static str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
    group: Option<u8>,
    micros: &'static [(u32, f64)],
}

// Per reference serving, roughly USDA values
const FOODS: &[FoodRow] = &[
    FoodRow { id: "apple", name: "Apple, medium", calories: 95.0, protein: 0.5, carbs: 25.1, fat: 0.3, fiber: 4.4, group: Some(3), micros: &[(401, 8.4), (306, 195.0)] },
    FoodRow { id: "banana", name: "Banana, medium", calories: 105.0, protein: 1.3, carbs: 27.0, fat: 0.4, fiber: 3.1, group: Some(3), micros: &[(306, 422.0), (415, 0.4), (401, 10.3)] },
    FoodRow { id: "broccoli", name: "Broccoli, 1 cup chopped", calories: 31.0, protein: 2.5, carbs: 6.0, fat: 0.3, fiber: 2.4, group: Some(4), micros: &[(401, 81.2), (430, 92.5), (417, 57.0), (306, 288.0)] },
    FoodRow { id: "spinach", name: "Spinach, 1 cup raw", calories: 7.0, protein: 0.9, carbs: 1.1, fat: 0.1, fiber: 0.7, group: Some(4), micros: &[(430, 145.0), (320, 141.0), (417, 58.0), (303, 0.8)] },
    FoodRow { id: "chicken_breast", name: "Chicken breast, 100 g", calories: 165.0, protein: 31.0, carbs: 0.0, fat: 3.6, fiber: 0.0, group: Some(2), micros: &[(406, 13.7), (415, 0.6), (305, 228.0), (317, 27.6)] },
    FoodRow { id: "salmon", name: "Salmon, 100 g", calories: 208.0, protein: 20.0, carbs: 0.0, fat: 13.0, fiber: 0.0, group: Some(2), micros: &[(328, 11.0), (418, 3.2), (317, 24.0)] },
    FoodRow { id: "egg", name: "Egg, large", calories: 72.0, protein: 6.3, carbs: 0.4, fat: 4.8, fiber: 0.0, group: Some(2), micros: &[(421, 147.0), (418, 0.4), (317, 15.4)] },
    FoodRow { id: "brown_rice", name: "Brown rice, 1 cup cooked", calories: 216.0, protein: 5.0, carbs: 45.0, fat: 1.8, fiber: 3.5, group: Some(5), micros: &[(304, 84.0), (315, 1.8)] },
    FoodRow { id: "oats", name: "Rolled oats, 40 g", calories: 150.0, protein: 5.0, carbs: 27.0, fat: 3.0, fiber: 4.0, group: Some(5), micros: &[(303, 1.7), (304, 56.0), (309, 1.5)] },
    FoodRow { id: "greek_yogurt", name: "Greek yogurt, 170 g", calories: 100.0, protein: 17.0, carbs: 6.0, fat: 0.7, fiber: 0.0, group: Some(1), micros: &[(301, 187.0), (418, 1.3)] },
    FoodRow { id: "almonds", name: "Almonds, 28 g", calories: 164.0, protein: 6.0, carbs: 6.1, fat: 14.2, fiber: 3.5, group: Some(7), micros: &[(323, 7.3), (304, 76.0)] },
    FoodRow { id: "olive_oil", name: "Olive oil, 1 tbsp", calories: 119.0, protein: 0.0, carbs: 0.0, fat: 13.5, fiber: 0.0, group: Some(6), micros: &[(323, 1.9)] },
    FoodRow { id: "protein_bar", name: "Protein bar", calories: 200.0, protein: 20.0, carbs: 22.0, fat: 7.0, fiber: 3.0, group: None, micros: &[] },
];

/// Builds the default catalog. Prefer [`get_default_catalog`] outside tests.
pub fn build_default_catalog() -> Catalog {
    use ExerciseCategory::*;

    let exercises = [
        exercise("bench_press", "Barbell Bench Press", "chest", "triceps, shoulders", Compound, Some("barbell")),
        exercise("back_squat", "Barbell Back Squat", "quads", "glutes, hamstrings, core", Compound, Some("barbell")),
        exercise("deadlift", "Conventional Deadlift", "hamstrings, glutes", "lower back, forearms, traps", Compound, Some("barbell")),
        exercise("overhead_press", "Standing Overhead Press", "shoulders", "triceps, core", Compound, Some("barbell")),
        exercise("barbell_row", "Bent-over Barbell Row", "lats", "biceps, rear delts", Compound, Some("barbell")),
        exercise("pullup", "Pull-up", "lats", "biceps, forearms", Compound, None),
        exercise("pushup", "Push-up", "chest", "triceps, shoulders, core", Compound, None),
        exercise("lunge", "Walking Lunge", "quads, glutes", "hamstrings, calves", Compound, Some("dumbbell")),
        exercise("bicep_curl", "Dumbbell Biceps Curl", "biceps", "forearms", Isolation, Some("dumbbell")),
        exercise("tricep_extension", "Cable Triceps Extension", "triceps", "", Isolation, Some("cable")),
        exercise("lateral_raise", "Dumbbell Lateral Raise", "shoulders", "", Isolation, Some("dumbbell")),
        exercise("calf_raise", "Standing Calf Raise", "calves", "", Isolation, None),
        exercise("plank", "Plank", "core", "shoulders", Core, None),
        exercise("hanging_leg_raise", "Hanging Leg Raise", "core", "forearms", Core, None),
        exercise("running", "Running", "quads, calves", "hamstrings, glutes", Cardio, None),
        exercise("cycling", "Cycling", "quads", "calves, glutes", Cardio, Some("bike")),
        exercise("rowing", "Rowing Machine", "lats, quads", "biceps, core, hamstrings", Cardio, Some("rower")),
    ];

    let foods = FOODS.iter().map(|row| FoodMetadata {
        id: row.id.into(),
        name: row.name.into(),
        nutrition: NutritionFacts {
            calories: row.calories,
            protein: row.protein,
            carbs: row.carbs,
            fat: row.fat,
            fiber: row.fiber,
            full_nutrients: row.micros.iter().copied().collect(),
        },
        food_group: row.group,
    });

    Catalog {
        exercises: exercises.into_iter().map(|e| (e.id.clone(), e)).collect(),
        foods: foods.map(|f| (f.id.clone(), f)).collect(),
    }
}

/// On-disk shape of `catalog.json`. Foods are raw payloads in any of the
/// shapes [`NutritionFacts::from_payload`] understands, each with an `id`.
#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    exercises: Vec<ExerciseMetadata>,
    #[serde(default)]
    foods: Vec<Value>,
}

impl Catalog {
    /// Load the default catalog with `path` merged over it, if the file
    /// exists. Entries in the file replace built-ins with the same id.
    pub fn load_with_overrides(path: &Path) -> Result<Self> {
        let mut catalog = get_default_catalog().clone();
        if !path.exists() {
            return Ok(catalog);
        }

        let file: CatalogFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let (exercise_count, food_count) = (file.exercises.len(), file.foods.len());

        for exercise in file.exercises {
            catalog.exercises.insert(exercise.id.clone(), exercise);
        }
        for payload in file.foods {
            match payload.get("id").and_then(Value::as_str) {
                Some(id) if !id.is_empty() => {
                    let food = FoodMetadata::from_payload(id, &payload);
                    catalog.foods.insert(food.id.clone(), food);
                }
                _ => tracing::warn!("Skipping catalog food without an id"),
            }
        }

        tracing::debug!(
            "Merged {} exercises and {} foods from {}",
            exercise_count,
            food_count,
            path.display()
        );

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }
        Ok(catalog)
    }

    pub fn exercise(&self, id: &str) -> Result<&ExerciseMetadata> {
        self.exercises.get(id).ok_or_else(|| Error::UnknownId {
            kind: "exercise",
            id: id.into(),
        })
    }

    pub fn food(&self, id: &str) -> Result<&FoodMetadata> {
        self.foods.get(id).ok_or_else(|| Error::UnknownId {
            kind: "food",
            id: id.into(),
        })
    }

    /// Every muscle any catalog exercise touches
    pub fn all_muscles(&self) -> BTreeSet<String> {
        self.exercises
            .values()
            .flat_map(|e| e.all_muscles().iter().map(String::from).collect::<Vec<_>>())
            .collect()
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, exercise) in &self.exercises {
            if id.is_empty() || exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if id != &exercise.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, exercise.id
                ));
            }
            if exercise.target.is_empty() {
                errors.push(format!("Exercise '{}' has no target muscles", id));
            }
        }

        for (id, food) in &self.foods {
            if id != &food.id {
                errors.push(format!("Food key '{}' doesn't match food.id '{}'", id, food.id));
            }
            let n = &food.nutrition;
            let values = [n.calories, n.protein, n.carbs, n.fat, n.fiber];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                errors.push(format!("Food '{}' has negative or invalid nutrition", id));
            }
            if food.food_group.is_some_and(|g| g > 9) {
                errors.push(format!("Food '{}' has food group outside 0-9", id));
            }
        }

        errors
    }
}
