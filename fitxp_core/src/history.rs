//! Log history loading.
//!
//! Reads the JSONL logs into memory for the engine. Duplicate ids (from a
//! retried append) are collapsed to the first occurrence.

use crate::config::DataConfig;
use crate::log_store::{read_entries, LogRecord};
use crate::{FoodLogEntry, Result, WorkoutLogEntry};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;

/// Load a log, deduplicated by id and sorted oldest first
pub fn load_history<T: DeserializeOwned + LogRecord>(path: &Path) -> Result<Vec<T>> {
    let mut seen_ids = HashSet::new();
    let mut entries: Vec<T> = read_entries::<T>(path)?
        .into_iter()
        .filter(|entry| seen_ids.insert(entry.id().to_string()))
        .collect();

    entries.sort_by_key(|entry| entry.timestamp());

    tracing::debug!("Loaded {} entries from {:?}", entries.len(), path);
    Ok(entries)
}

pub fn load_workout_history(data: &DataConfig) -> Result<Vec<WorkoutLogEntry>> {
    load_history(&data.workout_log_path())
}

pub fn load_food_history(data: &DataConfig) -> Result<Vec<FoodLogEntry>> {
    load_history(&data.food_log_path())
}
