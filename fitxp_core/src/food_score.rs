//! Food XP and the daily nutrition bonuses.
//!
//! Per entry: `round(calories * 2)`, then the food-group multiplier,
//! rounded again. Per day: macro-goal adherence, micronutrient completeness
//! and food variety bonuses on top of the summed entry XP.

use crate::calendar::local_date;
use crate::config::CalendarConfig;
use crate::nutrition::{daily_totals, DailyTotals, MICRONUTRIENTS};
use crate::{Catalog, FoodLogEntry, FoodMetadata, MacroGoals};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// XP per calorie eaten
pub const CALORIE_COEFF: f64 = 2.0;

const WHOLE_FOOD_MULTIPLIER: f64 = 1.5;

const MACRO_IN_RANGE_BONUS: f64 = 50.0;
const ALL_MACROS_BONUS: f64 = 500.0;
const MACRO_RANGE: (f64, f64) = (0.8, 1.2);

const MICRONUTRIENT_BONUS: f64 = 10.0;
const MICRONUTRIENT_COMPLETENESS_BONUS: f64 = 100.0;
const MICRONUTRIENT_COMPLETENESS_THRESHOLD: usize = 5;

const UNIQUE_FOOD_BONUS: f64 = 5.0;

/// Display name of a food-group code
pub fn food_group_name(code: Option<u8>) -> &'static str {
    match code {
        Some(1) => "dairy",
        Some(2) => "protein",
        Some(3) => "fruit",
        Some(4) => "vegetable",
        Some(5) => "grain",
        Some(6) => "fat",
        Some(7) => "legume, nut or seed",
        Some(8) => "mixed dish",
        _ => "unclassified",
    }
}

/// Fruits, vegetables and legumes/nuts/seeds earn 1.5x; everything else 1x
pub fn food_group_multiplier(code: Option<u8>) -> f64 {
    match code {
        Some(3) | Some(4) | Some(7) => WHOLE_FOOD_MULTIPLIER,
        _ => 1.0,
    }
}

/// XP for one food entry
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FoodScore {
    pub calories: f64,
    pub base_xp: f64,
    pub multiplier: f64,
    /// Extra XP from the food-group multiplier
    pub group_bonus: f64,
    pub total: i64,
}

/// Score one food entry. Non-finite calories or servings score zero.
pub fn score_food(entry: &FoodLogEntry, food: &FoodMetadata) -> FoodScore {
    let calories = food.nutrition.calories * entry.serving;
    let calories = if calories.is_finite() && calories > 0.0 {
        calories
    } else {
        0.0
    };

    let base_xp = (calories * CALORIE_COEFF).round();
    let multiplier = food_group_multiplier(food.food_group);
    let total = (base_xp * multiplier).round();

    tracing::debug!(
        "Scored food {} ({}): {:.1} kcal -> {} x{} = {}",
        entry.id,
        food.id,
        calories,
        base_xp,
        multiplier,
        total
    );

    FoodScore {
        calories,
        base_xp,
        multiplier,
        group_bonus: total - base_xp,
        total: total as i64,
    }
}

/// A food entry paired with its metadata
#[derive(Clone, Copy, Debug)]
pub struct DayFood<'a> {
    pub entry: &'a FoodLogEntry,
    pub food: &'a FoodMetadata,
}

/// The four goal-tracked macros
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Macro {
    Calories,
    Protein,
    Carbs,
    Fat,
}

/// Adherence of one macro to its goal
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MacroAdherence {
    pub nutrient: Macro,
    pub total: f64,
    pub goal: f64,
    pub in_range: bool,
}

/// Macro-goal bonus with per-macro detail
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MacroGoalBonus {
    pub adherence: Vec<MacroAdherence>,
    pub bonus: f64,
}

/// +50 per macro within 80-120% of its goal, +500 more when all four are.
///
/// A goal of zero or less never counts as in range. There is no separate
/// reward for hitting a goal exactly.
pub fn macro_goal_bonus(totals: &DailyTotals, goals: &MacroGoals) -> MacroGoalBonus {
    let pairs = [
        (Macro::Calories, totals.calories, goals.calories),
        (Macro::Protein, totals.protein, goals.protein),
        (Macro::Carbs, totals.carbs, goals.carbs),
        (Macro::Fat, totals.fat, goals.fat),
    ];

    let adherence: Vec<MacroAdherence> = pairs
        .into_iter()
        .map(|(nutrient, total, goal)| {
            let in_range = goal.is_finite() && goal > 0.0 && {
                let ratio = total / goal;
                ratio >= MACRO_RANGE.0 && ratio <= MACRO_RANGE.1
            };
            MacroAdherence {
                nutrient,
                total,
                goal,
                in_range,
            }
        })
        .collect();

    let in_range = adherence.iter().filter(|a| a.in_range).count();
    let mut bonus = in_range as f64 * MACRO_IN_RANGE_BONUS;
    if in_range == adherence.len() {
        bonus += ALL_MACROS_BONUS;
    }

    MacroGoalBonus { adherence, bonus }
}

/// Micronutrient completeness bonus
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MicronutrientBonus {
    pub met: Vec<&'static str>,
    pub bonus: f64,
}

/// +10 per micronutrient at or above its RDV, +100 more once 5 are met
pub fn micronutrient_bonus(totals: &DailyTotals) -> MicronutrientBonus {
    let met: Vec<&'static str> = MICRONUTRIENTS
        .iter()
        .filter(|m| {
            totals
                .micronutrients
                .get(&m.attr_id)
                .is_some_and(|amount| *amount >= m.rdv)
        })
        .map(|m| m.name)
        .collect();

    let mut bonus = met.len() as f64 * MICRONUTRIENT_BONUS;
    if met.len() >= MICRONUTRIENT_COMPLETENESS_THRESHOLD {
        bonus += MICRONUTRIENT_COMPLETENESS_BONUS;
    }
    MicronutrientBonus { met, bonus }
}

/// Identity of a food for variety counting: group and name for classified
/// foods, name alone otherwise (trimmed, case-insensitive)
pub fn unique_food_key(food: &FoodMetadata) -> String {
    let name = food.name.trim().to_lowercase();
    match food.food_group {
        Some(code) => format!("{}:{}", code, name),
        None => name,
    }
}

/// +5 per distinct food
pub fn unique_food_bonus<'a>(foods: impl IntoIterator<Item = &'a FoodMetadata>) -> (usize, f64) {
    let distinct: HashSet<String> = foods.into_iter().map(unique_food_key).collect();
    (distinct.len(), distinct.len() as f64 * UNIQUE_FOOD_BONUS)
}

/// Full breakdown of one day's nutrition XP
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyXpBreakdown {
    pub totals: DailyTotals,
    pub base_xp: f64,
    pub food_group_bonus: f64,
    pub macro_goal: MacroGoalBonus,
    pub micronutrients: MicronutrientBonus,
    pub unique_foods: usize,
    pub unique_food_bonus: f64,
    pub total_xp: f64,
}

/// Score a day's food logs against the user's macro goals
pub fn score_day(foods: &[DayFood<'_>], goals: &MacroGoals) -> DailyXpBreakdown {
    let scores: Vec<FoodScore> = foods.iter().map(|f| score_food(f.entry, f.food)).collect();
    let base_xp: f64 = scores.iter().map(|s| s.base_xp).sum();
    let food_group_bonus: f64 = scores.iter().map(|s| s.group_bonus).sum();

    let totals = daily_totals(foods.iter().map(|f| (&f.food.nutrition, f.entry.serving)));
    let macro_goal = macro_goal_bonus(&totals, goals);
    let micronutrients = micronutrient_bonus(&totals);
    let (unique_foods, unique_bonus) = unique_food_bonus(foods.iter().map(|f| f.food));

    let total_xp =
        base_xp + food_group_bonus + macro_goal.bonus + micronutrients.bonus + unique_bonus;

    tracing::debug!(
        "Day of {} foods: base {} + group {} + macros {} + micros {} + variety {} = {}",
        foods.len(),
        base_xp,
        food_group_bonus,
        macro_goal.bonus,
        micronutrients.bonus,
        unique_bonus,
        total_xp
    );

    DailyXpBreakdown {
        totals,
        base_xp,
        food_group_bonus,
        macro_goal,
        micronutrients,
        unique_foods,
        unique_food_bonus: unique_bonus,
        total_xp,
    }
}

/// Group food logs by local calendar day
pub fn group_food_logs_by_day<'a>(
    logs: &'a [FoodLogEntry],
    calendar: &CalendarConfig,
) -> BTreeMap<NaiveDate, Vec<&'a FoodLogEntry>> {
    let mut days: BTreeMap<NaiveDate, Vec<&FoodLogEntry>> = BTreeMap::new();
    for entry in logs {
        days.entry(local_date(entry.timestamp, calendar))
            .or_default()
            .push(entry);
    }
    days
}

/// Score every local day in `logs`, resolving foods through the catalog.
/// Entries for foods the catalog doesn't know are skipped.
pub fn daily_breakdowns(
    logs: &[FoodLogEntry],
    catalog: &Catalog,
    calendar: &CalendarConfig,
    goals: &MacroGoals,
) -> BTreeMap<NaiveDate, DailyXpBreakdown> {
    group_food_logs_by_day(logs, calendar)
        .into_iter()
        .map(|(day, entries)| {
            let foods: Vec<DayFood<'_>> = entries
                .into_iter()
                .filter_map(|entry| match catalog.foods.get(&entry.food_id) {
                    Some(food) => Some(DayFood { entry, food }),
                    None => {
                        tracing::warn!("Skipping log {}: unknown food {}", entry.id, entry.food_id);
                        None
                    }
                })
                .collect();
            (day, score_day(&foods, goals))
        })
        .collect()
}
