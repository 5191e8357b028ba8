//! Screenshot artifacts
//!
//! Checkpoints land in one directory as `NN-purpose.png`; failure captures
//! land in a separate directory named after the scenario. Every stored
//! image is recorded with its size and SHA-256 so runs can be compared
//! without opening the files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// A stored screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRecord {
    pub name: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

/// Lowercase, dash separated, ascii alphanumerics only
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// `NN-purpose`, numbered from 1
pub fn checkpoint_name(sequence: usize, purpose: &str) -> String {
    format!("{:02}-{}", sequence, slugify(purpose))
}

/// Checkpoint names become file names and must stay inside their directory
pub fn validate_artifact_name(name: &str) -> E2eResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(E2eError::InvalidArtifactName(name.to_string()))
    }
}

pub struct ScreenshotStore {
    checkpoint_dir: PathBuf,
    failure_dir: PathBuf,
    /// Failure captures handed out since the last clean
    claimed: Mutex<HashSet<PathBuf>>,
}

impl ScreenshotStore {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, failure_dir: impl Into<PathBuf>) -> E2eResult<Self> {
        let store = Self {
            checkpoint_dir: checkpoint_dir.into(),
            failure_dir: failure_dir.into(),
            claimed: Mutex::new(HashSet::new()),
        };
        std::fs::create_dir_all(&store.checkpoint_dir)?;
        std::fs::create_dir_all(&store.failure_dir)?;
        Ok(store)
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }

    pub fn checkpoint_path(&self, name: &str) -> E2eResult<PathBuf> {
        validate_artifact_name(name)?;
        Ok(self.checkpoint_dir.join(format!("{}.png", name)))
    }

    /// Path for a scenario's failure capture. Scenarios whose names share a
    /// slug get `-2`, `-3`, ... suffixes instead of overwriting each other.
    pub fn failure_path(&self, scenario: &str) -> PathBuf {
        let slug = match slugify(scenario) {
            s if s.is_empty() => "scenario".to_string(),
            s => s,
        };
        let mut claimed = self.claimed.lock();
        let mut path = self.failure_dir.join(format!("{}.png", slug));
        let mut n = 2;
        while claimed.contains(&path) {
            path = self.failure_dir.join(format!("{}-{}.png", slug, n));
            n += 1;
        }
        if n > 2 {
            warn!("Failure capture for '{}' renamed to {}", scenario, path.display());
        }
        claimed.insert(path.clone());
        path
    }

    /// Hash a screenshot that has just been written
    pub fn record(&self, name: &str, path: &Path) -> E2eResult<ScreenshotRecord> {
        let data = std::fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let record = ScreenshotRecord {
            name: name.to_string(),
            path: path.to_path_buf(),
            bytes: data.len() as u64,
            sha256: hex::encode(hasher.finalize()),
        };
        debug!("Stored {} ({} bytes)", record.path.display(), record.bytes);
        Ok(record)
    }

    /// Remove PNGs left over from a previous run
    pub fn clean(&self) -> E2eResult<usize> {
        let mut removed = 0;
        for dir in [&self.checkpoint_dir, &self.failure_dir] {
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().map(|e| e == "png").unwrap_or(false) {
                    std::fs::remove_file(&path)?;
                    removed += 1;
                }
            }
        }
        self.claimed.lock().clear();
        if removed > 0 {
            info!("Removed {} stale screenshot(s)", removed);
        }
        Ok(removed)
    }

    /// Write `manifest.json` next to the checkpoints
    pub fn write_manifest(&self, records: &[ScreenshotRecord]) -> E2eResult<PathBuf> {
        let path = self.checkpoint_dir.join("manifest.json");
        std::fs::write(&path, serde_json::to_string_pretty(records)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Item > should allow me to edit an item"), "item-should-allow-me-to-edit-an-item");
        assert_eq!(slugify("doctor's appointment!"), "doctor-s-appointment");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn test_checkpoint_name() {
        assert_eq!(checkpoint_name(1, "first-todo-added"), "01-first-todo-added");
        assert_eq!(checkpoint_name(31, "Before wrong count check"), "31-before-wrong-count-check");
    }

    #[test]
    fn test_record_and_clean() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path().join("shots"), dir.path().join("failures")).unwrap();

        let path = store.checkpoint_path("01-x").unwrap();
        std::fs::write(&path, b"abc").unwrap();
        let record = store.record("01-x", &path).unwrap();
        assert_eq!(record.bytes, 3);
        assert_eq!(
            record.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        let manifest = store.write_manifest(&[record]).unwrap();
        assert!(manifest.exists());

        std::fs::write(store.failure_path("Some > Scenario"), b"png").unwrap();
        assert_eq!(store.clean().unwrap(), 2);
        assert!(manifest.exists(), "clean only removes screenshots");
    }

    #[test]
    fn test_checkpoint_names_stay_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path().join("shots"), dir.path().join("failures")).unwrap();

        for bad in ["../x", "a/b", "..", "", "a\\b", ".hidden"] {
            assert!(
                matches!(store.checkpoint_path(bad), Err(E2eError::InvalidArtifactName(_))),
                "accepted {:?}",
                bad
            );
        }
        assert!(store.checkpoint_path("31-before_wrong.count").is_ok());
    }

    #[test]
    fn test_failure_paths_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path().join("shots"), dir.path().join("failures")).unwrap();

        let first = store.failure_path("G > a b");
        let second = store.failure_path("G > a-b");
        let third = store.failure_path("g a b");
        assert!(first.ends_with("g-a-b.png"));
        assert!(second.ends_with("g-a-b-2.png"));
        assert!(third.ends_with("g-a-b-3.png"));
        assert!(store.failure_path("!!").ends_with("scenario.png"));

        store.clean().unwrap();
        assert!(store.failure_path("G > a b").ends_with("g-a-b.png"));
    }
}
