//! Configuration file support for fitxp.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitxp/config.toml`.
//! Every field has a default, so a partial file only overrides what it names.

use crate::leveling::LevelCurve;
use crate::{Error, MacroGoals, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub leveling: LevelingConfig,

    #[serde(default)]
    pub exercise: ExerciseScoringConfig,

    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    #[serde(default)]
    pub goals: GoalsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            user_id: default_user_id(),
        }
    }
}

impl DataConfig {
    pub fn workout_log_path(&self) -> PathBuf {
        self.data_dir.join("logs").join("workouts.jsonl")
    }

    pub fn food_log_path(&self) -> PathBuf {
        self.data_dir.join("logs").join("foods.jsonl")
    }

    pub fn profile_path(&self) -> PathBuf {
        self.data_dir.join("profile.json")
    }

    /// Optional catalog overrides
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }
}

/// First day of the calendar week
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

/// The user's local calendar: day and week boundaries
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CalendarConfig {
    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default)]
    pub week_start: WeekStart,
}

impl CalendarConfig {
    /// Local UTC offset; out-of-range values fall back to UTC
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| {
            tracing::warn!(
                "UTC offset of {} minutes is out of range, using UTC",
                self.utc_offset_minutes
            );
            Utc.fix()
        })
    }
}

/// Level curve parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LevelingConfig {
    #[serde(default = "default_level_base")]
    pub base: f64,

    #[serde(default = "default_level_scaling")]
    pub scaling: f64,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            base: default_level_base(),
            scaling: default_level_scaling(),
        }
    }
}

/// Exercise scoring coefficients and bonus amounts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseScoringConfig {
    #[serde(default = "default_weight_coeff")]
    pub weight_coeff: f64,

    #[serde(default = "default_bodyweight_coeff")]
    pub bodyweight_coeff: f64,

    #[serde(default = "default_duration_coeff")]
    pub duration_coeff: f64,

    #[serde(default = "default_first_of_week_bonus")]
    pub first_of_week_bonus: f64,

    #[serde(default = "default_first_of_day_bonus")]
    pub first_of_day_bonus: f64,

    #[serde(default = "default_never_trained_bonus")]
    pub never_trained_bonus: f64,

    #[serde(default = "default_under_trained_bonus")]
    pub under_trained_bonus: f64,

    #[serde(default = "default_neglected_bonus")]
    pub neglected_bonus: f64,

    /// Fraction of the mean 30-day load below which a muscle counts as under-trained
    #[serde(default = "default_under_trained_fraction")]
    pub under_trained_fraction: f64,

    #[serde(default = "default_weight_unit")]
    pub weight_unit: String,

    #[serde(default = "default_distance_unit")]
    pub distance_unit: String,
}

impl Default for ExerciseScoringConfig {
    fn default() -> Self {
        Self {
            weight_coeff: default_weight_coeff(),
            bodyweight_coeff: default_bodyweight_coeff(),
            duration_coeff: default_duration_coeff(),
            first_of_week_bonus: default_first_of_week_bonus(),
            first_of_day_bonus: default_first_of_day_bonus(),
            never_trained_bonus: default_never_trained_bonus(),
            under_trained_bonus: default_under_trained_bonus(),
            neglected_bonus: default_neglected_bonus(),
            under_trained_fraction: default_under_trained_fraction(),
            weight_unit: default_weight_unit(),
            distance_unit: default_distance_unit(),
        }
    }
}

/// XP drift detection
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReconciliationConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
        }
    }
}

/// Default daily macro goals, used when the profile carries none
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GoalsConfig {
    #[serde(default = "default_calorie_goal")]
    pub calories: f64,
    #[serde(default = "default_protein_goal")]
    pub protein: f64,
    #[serde(default = "default_carbs_goal")]
    pub carbs: f64,
    #[serde(default = "default_fat_goal")]
    pub fat: f64,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            calories: default_calorie_goal(),
            protein: default_protein_goal(),
            carbs: default_carbs_goal(),
            fat: default_fat_goal(),
        }
    }
}

impl GoalsConfig {
    pub fn macro_goals(&self) -> MacroGoals {
        MacroGoals {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("fitxp")
}

fn default_user_id() -> String {
    "local".into()
}

fn default_level_base() -> f64 {
    1000.0
}

fn default_level_scaling() -> f64 {
    1.2
}

fn default_weight_coeff() -> f64 {
    0.1
}

fn default_bodyweight_coeff() -> f64 {
    1.0
}

fn default_duration_coeff() -> f64 {
    5.0
}

fn default_first_of_week_bonus() -> f64 {
    25.0
}

fn default_first_of_day_bonus() -> f64 {
    10.0
}

fn default_never_trained_bonus() -> f64 {
    50.0
}

fn default_under_trained_bonus() -> f64 {
    25.0
}

fn default_neglected_bonus() -> f64 {
    35.0
}

fn default_under_trained_fraction() -> f64 {
    0.25
}

fn default_weight_unit() -> String {
    "kg".into()
}

fn default_distance_unit() -> String {
    "km".into()
}

fn default_tolerance() -> f64 {
    1.0
}

fn default_calorie_goal() -> f64 {
    2000.0
}

fn default_protein_goal() -> f64 {
    150.0
}

fn default_carbs_goal() -> f64 {
    200.0
}

fn default_fat_goal() -> f64 {
    60.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("fitxp").join("config.toml")
    }

    /// Check values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if let Err(reason) = LevelCurve::check(self.leveling.base, self.leveling.scaling) {
            return Err(Error::Config(format!("leveling: {}", reason)));
        }
        if !(self.reconciliation.tolerance.is_finite() && self.reconciliation.tolerance >= 0.0) {
            return Err(Error::Config(format!(
                "reconciliation.tolerance must be non-negative, got {}",
                self.reconciliation.tolerance
            )));
        }
        if FixedOffset::east_opt(self.calendar.utc_offset_minutes * 60).is_none() {
            return Err(Error::Config(format!(
                "calendar.utc_offset_minutes out of range: {}",
                self.calendar.utc_offset_minutes
            )));
        }
        Ok(())
    }

}
