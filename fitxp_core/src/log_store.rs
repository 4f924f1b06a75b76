//! Append-only JSONL log store for workout and food entries.
//!
//! Entries are appended one JSON object per line under an exclusive file
//! lock, so concurrent writers never interleave partial lines.

use crate::{FoodLogEntry, Result, WorkoutLogEntry};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// A persisted log entry with a stable id and an event time
pub trait LogRecord {
    fn id(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
}

impl LogRecord for WorkoutLogEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl LogRecord for FoodLogEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Sink for persisting log entries
pub trait LogSink<T> {
    fn append(&mut self, entry: &T) -> Result<()>;
}

/// JSONL-based sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl<T: Serialize + LogRecord> LogSink<T> for JsonlSink {
    fn append(&mut self, entry: &T) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        // One write per line keeps the record contiguous
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        drop(writer);

        file.sync_data()?;
        file.unlock()?;

        tracing::debug!("Appended entry {} to {:?}", entry.id(), self.path);
        Ok(())
    }
}

/// Read every entry from a JSONL log. Unparseable lines are skipped with a
/// warning; a missing file reads as empty.
pub fn read_entries<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = match line_result {
            Ok(line) => line,
            Err(e) => {
                // Invalid UTF-8 from a torn write
                tracing::warn!("Unreadable line {} in {:?}: {}", line_num + 1, path, e);
                skipped += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse entry at line {} of {:?}: {}", line_num + 1, path, e);
                skipped += 1;
            }
        }
    }

    file.unlock()?;
    tracing::debug!(
        "Read {} entries from {:?} ({} skipped)",
        entries.len(),
        path,
        skipped
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workout(exercise: &str) -> WorkoutLogEntry {
        let mut entry = WorkoutLogEntry::new("u1", exercise, Utc::now());
        entry.score = Some(42.0);
        entry
    }

    #[test]
    fn test_append_and_read_single_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs/workouts.jsonl");

        let entry = workout("squat");
        let mut sink = JsonlSink::new(&path);
        sink.append(&entry).unwrap();

        let entries: Vec<WorkoutLogEntry> = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, entry.id);
        assert_eq!(entries[0].score, Some(42.0));
    }

    #[test]
    fn test_append_mixed_kinds_to_separate_logs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workouts = temp_dir.path().join("workouts.jsonl");
        let foods = temp_dir.path().join("foods.jsonl");

        let mut workout_sink = JsonlSink::new(&workouts);
        for _ in 0..5 {
            workout_sink.append(&workout("bench_press")).unwrap();
        }
        let mut food_sink = JsonlSink::new(&foods);
        food_sink
            .append(&FoodLogEntry::new("u1", "apple", Utc::now(), 1.0))
            .unwrap();

        assert_eq!(read_entries::<WorkoutLogEntry>(&workouts).unwrap().len(), 5);
        assert_eq!(read_entries::<FoodLogEntry>(&foods).unwrap().len(), 1);
    }

    #[test]
    fn test_read_missing_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let entries: Vec<FoodLogEntry> =
            read_entries(&temp_dir.path().join("nonexistent.jsonl")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let mut sink = JsonlSink::new(&path);
        sink.append(&workout("squat")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"{\"id\": \"torn\", \"exerciseId\n").unwrap();
            file.write_all(b"\n   \n").unwrap();
        }
        sink.append(&workout("deadlift")).unwrap();

        let entries: Vec<WorkoutLogEntry> = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].exercise_id, "deadlift");
    }
}
