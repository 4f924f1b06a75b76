//! CSV reports for spreadsheets.
//!
//! Reports are written to a temp file in the target directory, synced, then
//! renamed into place.

use crate::food_score::DailyXpBreakdown;
use crate::muscle_load::MuscleScores;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Serialize)]
struct MuscleRow<'a> {
    muscle: &'a str,
    today: f64,
    #[serde(rename = "3day")]
    three_day: f64,
    #[serde(rename = "7day")]
    seven_day: f64,
    #[serde(rename = "14day")]
    fourteen_day: f64,
    #[serde(rename = "30day")]
    thirty_day: f64,
    lifetime: f64,
    last_calculated: Option<String>,
}

#[derive(Debug, Serialize)]
struct NutritionRow {
    date: NaiveDate,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
    base_xp: f64,
    food_group_bonus: f64,
    macro_bonus: f64,
    micronutrient_bonus: f64,
    unique_foods: usize,
    unique_food_bonus: f64,
    total_xp: f64,
}

impl From<(&NaiveDate, &DailyXpBreakdown)> for NutritionRow {
    fn from((date, day): (&NaiveDate, &DailyXpBreakdown)) -> Self {
        NutritionRow {
            date: *date,
            calories: day.totals.calories,
            protein: day.totals.protein,
            carbs: day.totals.carbs,
            fat: day.totals.fat,
            fiber: day.totals.fiber,
            base_xp: day.base_xp,
            food_group_bonus: day.food_group_bonus,
            macro_bonus: day.macro_goal.bonus,
            micronutrient_bonus: day.micronutrients.bonus,
            unique_foods: day.unique_foods,
            unique_food_bonus: day.unique_food_bonus,
            total_xp: day.total_xp,
        }
    }
}

fn write_rows<R: Serialize>(path: &Path, rows: impl IntoIterator<Item = R>) -> Result<usize> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&parent)?;

    let temp = NamedTempFile::new_in(&parent)?;
    let mut writer = csv::Writer::from_writer(temp.as_file());
    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;
    drop(writer);

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Wrote {} rows to {:?}", count, path);
    Ok(count)
}

/// One row per muscle, alphabetical
pub fn write_muscle_report(scores: &MuscleScores, path: &Path) -> Result<usize> {
    write_rows(
        path,
        scores.iter().map(|(muscle, record)| MuscleRow {
            muscle,
            today: record.today,
            three_day: record.three_day,
            seven_day: record.seven_day,
            fourteen_day: record.fourteen_day,
            thirty_day: record.thirty_day,
            lifetime: record.lifetime,
            last_calculated: record.last_calculated.map(|t| t.to_rfc3339()),
        }),
    )
}

/// One row per local day, oldest first
pub fn write_nutrition_report(
    days: &BTreeMap<NaiveDate, DailyXpBreakdown>,
    path: &Path,
) -> Result<usize> {
    write_rows(path, days.iter().map(NutritionRow::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food_score::{score_day, DayFood};
    use crate::{FoodLogEntry, FoodMetadata, MacroGoals, MuscleScoreRecord, NutritionFacts};
    use chrono::Utc;

    #[test]
    fn test_muscle_report() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("reports/muscles.csv");

        let mut scores = MuscleScores::new();
        scores.insert(
            "quads".into(),
            MuscleScoreRecord {
                today: 5.0,
                lifetime: 80.0,
                ..Default::default()
            },
        );
        scores.insert("chest".into(), MuscleScoreRecord::default());

        assert_eq!(write_muscle_report(&scores, &path).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "muscle");
        assert_eq!(&headers[2], "3day");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][0], "chest");
        assert_eq!(&rows[1][0], "quads");
        assert_eq!(&rows[1][6], "80.0");
    }

    #[test]
    fn test_nutrition_report_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nutrition.csv");
        std::fs::write(&path, "stale").unwrap();

        let food = FoodMetadata {
            id: "rice".into(),
            name: "Rice".into(),
            nutrition: NutritionFacts {
                calories: 200.0,
                carbs: 45.0,
                ..Default::default()
            },
            food_group: Some(7),
        };
        let entry = FoodLogEntry::new("u1", "rice", Utc::now(), 1.0);
        let goals = MacroGoals {
            calories: 2000.0,
            protein: 150.0,
            carbs: 200.0,
            fat: 60.0,
        };
        let day = score_day(&[DayFood { entry: &entry, food: &food }], &goals);

        let mut days = BTreeMap::new();
        days.insert(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), day);
        assert_eq!(write_nutrition_report(&days, &path).unwrap(), 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("date,calories"));
        assert!(contents.contains("2024-01-05,200.0"));
    }

    #[test]
    fn test_empty_report_has_no_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("muscles.csv");
        assert_eq!(write_muscle_report(&MuscleScores::new(), &path).unwrap(), 0);
        assert!(path.exists());
    }
}
