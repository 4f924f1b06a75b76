//! Integration tests for the fitxp binary.
//!
//! These tests verify end-to-end behavior including:
//! - Workout and food logging with frozen scores
//! - Profile updates and level display
//! - Maintenance commands (recompute, cleanup, validate)
//! - Reports

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NOW: &str = "2024-01-10T18:00:00Z";

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI pointed at `data_dir`, with config isolated from the host
fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitxp"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--now")
        .arg(NOW);
    cmd
}

fn read_profile(data_dir: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(data_dir.join("profile.json")).expect("Failed to read profile");
    serde_json::from_str(&raw).expect("Profile is not JSON")
}

fn log_bench(data_dir: &Path, set: &str) -> assert_cmd::assert::Assert {
    cli(data_dir)
        .args(["log-workout", "--exercise", "bench_press", "--set", set])
        .assert()
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("fitxp"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fitness XP tracker"));
}

#[test]
fn test_log_workout_scores_and_persists() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // 100 * 5 * 0.1 * 1.5 + 25 first of week + 50 never trained
    log_bench(data_dir, "100x5")
        .success()
        .stdout(predicate::str::contains("+150 XP"))
        .stdout(predicate::str::contains("First time this week"));

    let log = fs::read_to_string(data_dir.join("logs/workouts.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 1);
    let entry: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(entry["exerciseId"], "bench_press");
    assert_eq!(entry["score"], 150.0);

    let profile = read_profile(data_dir);
    assert_eq!(profile["totalXP"], 150.0);
    assert_eq!(profile["muscleScores"]["chest"]["today"], 150.0);
    assert_eq!(profile["muscleScores"]["triceps"]["lifetime"], 150.0);
    assert!(profile["personalBests"]["bench_press"]["allTime"].is_object());
}

#[test]
fn test_personal_best_stacks_all_windows() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_bench(data_dir, "100x5").success();

    // e1RM 120 beats 116.7 in all four windows: 50 + 150 + 200 + 300
    log_bench(data_dir, "120x1")
        .success()
        .stdout(predicate::str::contains("+718 XP"))
        .stdout(predicate::str::contains("Personal best"));

    assert_eq!(read_profile(data_dir)["totalXP"], 868.0);
}

#[test]
fn test_log_food_scores_whole_food() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // 95 kcal * 2 = 190, fruit x1.5 = 285
    cli(data_dir)
        .args(["log-food", "--food", "apple"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+285 XP"))
        .stdout(predicate::str::contains("fruit (x1.5)"));

    let log = fs::read_to_string(data_dir.join("logs/foods.jsonl")).unwrap();
    let entry: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(entry["xp"], 285.0);
    assert_eq!(entry["serving"], 1.0);
    assert_eq!(read_profile(data_dir)["totalXP"], 285.0);
}

#[test]
fn test_level_up_reported() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_bench(data_dir, "100x5").success();
    cli(data_dir)
        .args(["log-food", "--food", "apple", "--serving", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Level up!"))
        .stdout(predicate::str::contains("Level 2"));
}

#[test]
fn test_unknown_ids_fail() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["log-workout", "--exercise", "nope", "--set", "10x10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));

    cli(data_dir)
        .args(["log-food", "--food", "unobtainium"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unobtainium"));

    assert!(!data_dir.join("logs/workouts.jsonl").exists());
    assert!(!data_dir.join("profile.json").exists());
}

#[test]
fn test_invalid_workout_input() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["log-workout", "--exercise", "bench_press", "--set", "heavy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid set"));

    cli(data_dir)
        .args(["log-workout", "--exercise", "bench_press"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--set"));
}

#[test]
fn test_bodyweight_and_cardio_workouts() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["log-workout", "--exercise", "pushup", "--set", "20", "--set", "x15"])
        .assert()
        .success();

    cli(data_dir)
        .args(["log-workout", "--exercise", "running", "--duration", "30", "--distance", "5"])
        .assert()
        .success();

    let log = fs::read_to_string(data_dir.join("logs/workouts.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 2);
    let profile = read_profile(data_dir);
    let pace = &profile["personalBests"]["running"]["allTime"];
    assert_eq!(pace["type"], "pace");
    assert_eq!(pace["value"], 6.0);
}

#[test]
fn test_status_shows_level_and_streak() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Level 1 - Couch Starter"))
        .stdout(predicate::str::contains("Daily: 0"));

    log_bench(data_dir, "100x5").success();

    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total XP: 150"))
        .stdout(predicate::str::contains("Daily: 1"))
        .stdout(predicate::str::contains("chest"));
}

#[test]
fn test_default_command_is_status() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Streaks"));
}

#[test]
fn test_validate_detects_and_fixes_drift() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_bench(data_dir, "100x5").success();
    cli(data_dir)
        .args(["log-food", "--food", "apple"])
        .assert()
        .success();

    cli(data_dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("XP is consistent"));

    let mut profile = read_profile(data_dir);
    profile["totalXP"] = serde_json::json!(480.0);
    fs::write(data_dir.join("profile.json"), profile.to_string()).unwrap();

    cli(data_dir)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("discrepancy +45"));

    cli(data_dir)
        .args(["validate", "--fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("corrected to 435"));

    assert_eq!(read_profile(data_dir)["totalXP"], 435.0);
}

#[test]
fn test_recompute_and_cleanup() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_bench(data_dir, "100x5").success();

    cli(data_dir)
        .arg("recompute")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 muscles from 1 workouts"));
    assert_eq!(read_profile(data_dir)["muscleScores"]["chest"]["7day"], 150.0);

    // Same day: today's load stays
    cli(data_dir).arg("cleanup").assert().success();
    assert_eq!(read_profile(data_dir)["muscleScores"]["chest"]["today"], 150.0);

    // Next day: today resets, lifetime stays
    Command::new(assert_cmd::cargo::cargo_bin!("fitxp"))
        .env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(["--now", "2024-01-11T09:00:00Z", "cleanup"])
        .assert()
        .success();
    let profile = read_profile(data_dir);
    assert_eq!(profile["muscleScores"]["chest"]["today"], 0.0);
    assert_eq!(profile["muscleScores"]["chest"]["lifetime"], 150.0);
}

#[test]
fn test_day_breakdown() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["log-food", "--food", "apple"])
        .assert()
        .success();
    cli(data_dir)
        .args(["log-food", "--food", "greek_yogurt"])
        .assert()
        .success();

    cli(data_dir)
        .arg("day")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nutrition for 2024-01-10"))
        .stdout(predicate::str::contains("195 kcal"))
        .stdout(predicate::str::contains("(2 foods)"));

    cli(data_dir)
        .args(["day", "--date", "2024-01-09"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No food logged on 2024-01-09"));
}

#[test]
fn test_export_reports() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_bench(data_dir, "100x5").success();
    cli(data_dir)
        .args(["log-food", "--food", "banana"])
        .assert()
        .success();

    let muscles = data_dir.join("out/muscles.csv");
    cli(data_dir)
        .arg("export")
        .arg("--out")
        .arg(&muscles)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 rows"));
    let csv = fs::read_to_string(&muscles).unwrap();
    assert!(csv.starts_with("muscle,today,3day,7day,14day,30day,lifetime"));
    assert!(csv.contains("chest,150.0"));

    let nutrition = data_dir.join("out/nutrition.csv");
    cli(data_dir)
        .arg("export")
        .arg("--out")
        .arg(&nutrition)
        .args(["--report", "nutrition"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 rows"));
    assert!(fs::read_to_string(&nutrition).unwrap().contains("2024-01-10,105.0"));
}

#[test]
fn test_catalog_overrides_from_data_dir() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("catalog.json"),
        r#"{"foods": [{"id": "lentil_soup", "food_name": "Lentil soup",
            "nutrition": {"calories": 180, "protein": 12}}]}"#,
    )
    .unwrap();

    // Unclassified food: 180 * 2, no multiplier
    cli(data_dir)
        .args(["log-food", "--food", "lentil_soup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+360 XP"));
}

#[test]
fn test_config_file_changes_scoring() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let config_dir = data_dir.join("config/fitxp");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[exercise]\nfirst_of_week_bonus = 0.0\nnever_trained_bonus = 0.0\n",
    )
    .unwrap();

    log_bench(data_dir, "100x5")
        .success()
        .stdout(predicate::str::contains("+75 XP"));
}

#[test]
fn test_verbosity_controls_diagnostics() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["log-food", "--food", "apple"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Appended entry").not());

    cli(data_dir)
        .args(["-vv", "log-food", "--food", "apple"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Appended entry"));
}
