//! User profile persistence with file locking.
//!
//! The profile is the only mutable document. Saves go through a locked temp
//! file and an atomic rename, so readers never see a half-written profile.
//! Writers serialize on a sidecar `profile.lock` held for the whole
//! read-modify-write cycle of [`UserProfile::update`].

use crate::{Error, Result, UserProfile};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Exclusive writer lock on a profile, released on drop
pub struct ProfileLock {
    file: File,
    path: PathBuf,
}

impl ProfileLock {
    /// Block until no other writer holds the lock for `profile_path`
    pub fn acquire(profile_path: &Path) -> Result<Self> {
        let path = profile_path.with_extension("lock");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        file.lock_exclusive()?;
        tracing::debug!("Acquired profile lock {:?}", path);
        Ok(Self { file, path })
    }
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release profile lock {:?}: {}", self.path, e);
        }
    }
}

impl UserProfile {
    /// Load a profile with shared locking
    ///
    /// Returns a fresh profile for `user_id` if the file doesn't exist.
    /// A corrupt file is logged and replaced by a fresh profile.
    pub fn load(path: &Path, user_id: &str) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No profile found, starting fresh for {}", user_id);
            return Ok(Self::new(user_id));
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open profile {:?}: {}. Using defaults.", path, e);
                return Ok(Self::new(user_id));
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock profile {:?}: {}. Using defaults.", path, e);
            return Ok(Self::new(user_id));
        }

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        if let Err(e) = read {
            tracing::warn!("Failed to read profile {:?}: {}. Using defaults.", path, e);
            return Ok(Self::new(user_id));
        }

        match serde_json::from_str::<UserProfile>(&contents) {
            Ok(mut profile) => {
                if profile.user_id.is_empty() {
                    profile.user_id = user_id.to_string();
                }
                tracing::debug!("Loaded profile from {:?}", path);
                Ok(profile)
            }
            Err(e) => {
                tracing::warn!("Failed to parse profile {:?}: {}. Using defaults.", path, e);
                Ok(Self::new(user_id))
            }
        }
    }

    /// Save atomically: write a locked temp file, sync, rename over the
    /// original.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("profile path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile to {:?}", path);
        Ok(())
    }

    /// Load, transform, and save back under the profile lock.
    ///
    /// The closure sees the latest saved profile and returns the new one
    /// plus a value for the caller. Anything else it does (reading logs,
    /// appending to them) is serialized with every other update. If it
    /// fails, the profile is left as it was.
    pub fn update<T, F>(path: &Path, user_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&UserProfile) -> Result<(UserProfile, T)>,
    {
        let _lock = ProfileLock::acquire(path)?;
        let current = Self::load(path, user_id)?;
        let (next, value) = f(&current)?;
        next.save(path)?;
        Ok(value)
    }
}
