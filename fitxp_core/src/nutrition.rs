//! Canonical nutrition facts and daily totals.
//!
//! Food payloads arrive in several shapes (a `nutritionix_data` object with
//! `nf_*` fields, a `nutrition` object, or flat fields on the food itself).
//! [`NutritionFacts::from_payload`] folds all of them into one record.

use crate::{FoodMetadata, NutritionFacts};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A tracked micronutrient with its recommended daily value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Micronutrient {
    pub attr_id: u32,
    pub name: &'static str,
    pub unit: &'static str,
    pub rdv: f64,
}

/// Micronutrients counted toward the daily completeness bonus, keyed by
/// Nutritionix attribute id
pub const MICRONUTRIENTS: &[Micronutrient] = &[
    Micronutrient { attr_id: 301, name: "calcium", unit: "mg", rdv: 1300.0 },
    Micronutrient { attr_id: 303, name: "iron", unit: "mg", rdv: 18.0 },
    Micronutrient { attr_id: 304, name: "magnesium", unit: "mg", rdv: 420.0 },
    Micronutrient { attr_id: 305, name: "phosphorus", unit: "mg", rdv: 1250.0 },
    Micronutrient { attr_id: 306, name: "potassium", unit: "mg", rdv: 4700.0 },
    Micronutrient { attr_id: 309, name: "zinc", unit: "mg", rdv: 11.0 },
    Micronutrient { attr_id: 312, name: "copper", unit: "mg", rdv: 0.9 },
    Micronutrient { attr_id: 315, name: "manganese", unit: "mg", rdv: 2.3 },
    Micronutrient { attr_id: 317, name: "selenium", unit: "µg", rdv: 55.0 },
    Micronutrient { attr_id: 320, name: "vitamin a", unit: "µg", rdv: 900.0 },
    Micronutrient { attr_id: 323, name: "vitamin e", unit: "mg", rdv: 15.0 },
    Micronutrient { attr_id: 328, name: "vitamin d", unit: "µg", rdv: 20.0 },
    Micronutrient { attr_id: 401, name: "vitamin c", unit: "mg", rdv: 90.0 },
    Micronutrient { attr_id: 404, name: "thiamin", unit: "mg", rdv: 1.2 },
    Micronutrient { attr_id: 405, name: "riboflavin", unit: "mg", rdv: 1.3 },
    Micronutrient { attr_id: 406, name: "niacin", unit: "mg", rdv: 16.0 },
    Micronutrient { attr_id: 410, name: "pantothenic acid", unit: "mg", rdv: 5.0 },
    Micronutrient { attr_id: 415, name: "vitamin b6", unit: "mg", rdv: 1.7 },
    Micronutrient { attr_id: 417, name: "folate", unit: "µg", rdv: 400.0 },
    Micronutrient { attr_id: 418, name: "vitamin b12", unit: "µg", rdv: 2.4 },
    Micronutrient { attr_id: 421, name: "choline", unit: "mg", rdv: 550.0 },
    Micronutrient { attr_id: 430, name: "vitamin k", unit: "µg", rdv: 120.0 },
];

/// Look up a tracked micronutrient
pub fn micronutrient(attr_id: u32) -> Option<&'static Micronutrient> {
    MICRONUTRIENTS.iter().find(|m| m.attr_id == attr_id)
}

const CALORIE_KEYS: &[&str] = &["nf_calories", "calories", "energy"];
const PROTEIN_KEYS: &[&str] = &["nf_protein", "protein"];
const CARB_KEYS: &[&str] = &["nf_total_carbohydrate", "carbs", "carbohydrates", "total_carbohydrate"];
const FAT_KEYS: &[&str] = &["nf_total_fat", "fat", "total_fat"];
const FIBER_KEYS: &[&str] = &["nf_dietary_fiber", "fiber", "dietary_fiber"];

/// Numeric value that may be encoded as a number or numeric string
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn first_number(source: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| source.get(*key).and_then(as_number))
}

/// The object that actually carries the nutrient fields
fn nutrient_source(payload: &Value) -> &Value {
    for key in ["nutritionix_data", "nutrition"] {
        if let Some(inner) = payload.get(key).filter(|v| v.is_object()) {
            return inner;
        }
    }
    payload
}

fn full_nutrients(source: &Value, payload: &Value) -> BTreeMap<u32, f64> {
    let list = source
        .get("full_nutrients")
        .or_else(|| payload.get("full_nutrients"))
        .and_then(Value::as_array);

    let mut nutrients = BTreeMap::new();
    for item in list.into_iter().flatten() {
        let attr_id = item
            .get("attr_id")
            .and_then(as_number)
            .filter(|id| *id >= 0.0 && id.fract() == 0.0);
        let value = item.get("value").and_then(as_number);
        if let (Some(attr_id), Some(value)) = (attr_id, value) {
            *nutrients.entry(attr_id as u32).or_insert(0.0) += value;
        }
    }
    nutrients
}

/// Food-group code 0-9 from `tags.food_group`, if present and valid
pub fn food_group_from_payload(payload: &Value) -> Option<u8> {
    let source = nutrient_source(payload);
    [source, payload]
        .iter()
        .find_map(|v| v.get("tags").and_then(|t| t.get("food_group")).and_then(as_number))
        .filter(|code| (0.0..=9.0).contains(code) && code.fract() == 0.0)
        .map(|code| code as u8)
}

impl NutritionFacts {
    /// Normalize any supported payload shape. Missing fields read as zero.
    pub fn from_payload(payload: &Value) -> Self {
        let source = nutrient_source(payload);
        Self {
            calories: first_number(source, CALORIE_KEYS).unwrap_or(0.0),
            protein: first_number(source, PROTEIN_KEYS).unwrap_or(0.0),
            carbs: first_number(source, CARB_KEYS).unwrap_or(0.0),
            fat: first_number(source, FAT_KEYS).unwrap_or(0.0),
            fiber: first_number(source, FIBER_KEYS).unwrap_or(0.0),
            full_nutrients: full_nutrients(source, payload),
        }
    }
}

impl FoodMetadata {
    /// Build food metadata from a raw payload (name from `food_name` or `name`)
    pub fn from_payload(id: impl Into<String>, payload: &Value) -> Self {
        let name = ["food_name", "name"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();
        Self {
            id: id.into(),
            name,
            nutrition: NutritionFacts::from_payload(payload),
            food_group: food_group_from_payload(payload),
        }
    }
}

/// Summed nutrition for a day
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DailyTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    /// Tracked micronutrients only, keyed by attribute id
    pub micronutrients: BTreeMap<u32, f64>,
}

/// Sum nutrition over `(facts, servings)` pairs. Non-finite or negative
/// serving counts contribute nothing.
pub fn daily_totals<'a>(items: impl IntoIterator<Item = (&'a NutritionFacts, f64)>) -> DailyTotals {
    let mut totals = DailyTotals::default();

    for (facts, servings) in items {
        if !(servings.is_finite() && servings > 0.0) {
            continue;
        }
        totals.calories += facts.calories * servings;
        totals.protein += facts.protein * servings;
        totals.carbs += facts.carbs * servings;
        totals.fat += facts.fat * servings;
        totals.fiber += facts.fiber * servings;

        for (attr_id, amount) in &facts.full_nutrients {
            if micronutrient(*attr_id).is_some() {
                *totals.micronutrients.entry(*attr_id).or_insert(0.0) += amount * servings;
            }
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nutritionix_shape() {
        let payload = json!({
            "food_name": "Apple",
            "nutritionix_data": {
                "nf_calories": 95,
                "nf_protein": 0.5,
                "nf_total_carbohydrate": 25.1,
                "nf_total_fat": 0.3,
                "nf_dietary_fiber": 4.4,
                "full_nutrients": [
                    {"attr_id": 401, "value": 8.4},
                    {"attr_id": 306, "value": 195}
                ],
                "tags": {"food_group": 3}
            }
        });

        let food = FoodMetadata::from_payload("apple", &payload);
        assert_eq!(food.name, "Apple");
        assert_eq!(food.nutrition.calories, 95.0);
        assert_eq!(food.nutrition.carbs, 25.1);
        assert_eq!(food.nutrition.full_nutrients[&401], 8.4);
        assert_eq!(food.food_group, Some(3));
    }

    #[test]
    fn test_nested_nutrition_and_flat_shapes() {
        let nested = json!({
            "name": "Rice",
            "nutrition": {"calories": "206", "protein": 4.3, "carbs": 45, "fat": 0.4}
        });
        let facts = NutritionFacts::from_payload(&nested);
        assert_eq!(facts.calories, 206.0);
        assert_eq!(facts.carbs, 45.0);

        let flat = json!({"calories": 120, "fat": 5, "tags": {"food_group": 12}});
        assert_eq!(NutritionFacts::from_payload(&flat).fat, 5.0);
        assert_eq!(food_group_from_payload(&flat), None);
    }

    #[test]
    fn test_garbage_payload_is_zero() {
        let facts = NutritionFacts::from_payload(&json!("not an object"));
        assert_eq!(facts, NutritionFacts::default());
    }

    #[test]
    fn test_daily_totals_scale_by_servings() {
        let mut apple = NutritionFacts {
            calories: 95.0,
            fiber: 4.4,
            ..Default::default()
        };
        apple.full_nutrients.insert(401, 8.4);
        apple.full_nutrients.insert(999, 1.0); // untracked

        let totals = daily_totals([(&apple, 2.0), (&apple, f64::NAN)]);
        assert_eq!(totals.calories, 190.0);
        assert_eq!(totals.micronutrients[&401], 16.8);
        assert!(!totals.micronutrients.contains_key(&999));
    }

    #[test]
    fn test_micronutrient_table() {
        assert!(MICRONUTRIENTS.len() >= 20);
        assert_eq!(micronutrient(303).unwrap().name, "iron");
        assert!(micronutrient(1).is_none());
    }
}
