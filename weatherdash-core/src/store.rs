//! Saved locations. Entries are identified by coordinates, never by display name.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{config::project_dirs, model::Coordinates};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub name: String,
    pub coordinates: Coordinates,
}

pub trait LocationStore {
    fn list(&self) -> Result<Vec<SavedLocation>>;

    /// Adds `location`, replacing any entry with equal coordinates.
    fn put(&self, location: SavedLocation) -> Result<()>;

    /// Removes the entry at `coordinates`. Returns whether one existed.
    fn delete(&self, coordinates: Coordinates) -> Result<bool>;
}

fn upsert(entries: &mut Vec<SavedLocation>, location: SavedLocation) {
    match entries.iter_mut().find(|e| e.coordinates == location.coordinates) {
        Some(existing) => *existing = location,
        None => entries.push(location),
    }
}

fn remove(entries: &mut Vec<SavedLocation>, coordinates: Coordinates) -> bool {
    let before = entries.len();
    entries.retain(|e| e.coordinates != coordinates);
    entries.len() != before
}

#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    entries: Mutex<Vec<SavedLocation>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<SavedLocation>> {
        // A poisoned list is still a valid list.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocationStore for MemoryLocationStore {
    fn list(&self) -> Result<Vec<SavedLocation>> {
        Ok(self.entries().clone())
    }

    fn put(&self, location: SavedLocation) -> Result<()> {
        upsert(&mut self.entries(), location);
        Ok(())
    }

    fn delete(&self, coordinates: Coordinates) -> Result<bool> {
        Ok(remove(&mut self.entries(), coordinates))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    locations: Vec<SavedLocation>,
}

/// TOML-backed store. Each call reads the file fresh and rewrites it whole.
#[derive(Debug, Clone)]
pub struct FileLocationStore {
    path: PathBuf,
}

impl FileLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dirs = project_dirs()?;
        Ok(Self::new(dirs.data_dir().join("locations.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreFile> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read locations file: {}", self.path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse locations file: {}", self.path.display()))
    }

    fn write(&self, file: &StoreFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(file).context("Failed to serialize saved locations")?;

        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write locations file: {}", self.path.display()))
    }
}

impl LocationStore for FileLocationStore {
    fn list(&self) -> Result<Vec<SavedLocation>> {
        Ok(self.read()?.locations)
    }

    fn put(&self, location: SavedLocation) -> Result<()> {
        let mut file = self.read()?;
        upsert(&mut file.locations, location);
        self.write(&file)
    }

    fn delete(&self, coordinates: Coordinates) -> Result<bool> {
        let mut file = self.read()?;
        let removed = remove(&mut file.locations, coordinates);
        if removed {
            self.write(&file)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(name: &str, lat: f64, lon: f64) -> SavedLocation {
        SavedLocation { name: name.into(), coordinates: Coordinates::new(lat, lon).unwrap() }
    }

    fn exercise(store: &dyn LocationStore) {
        assert!(store.list().unwrap().is_empty());

        store.put(saved("Amsterdam", 52.37, 4.89)).unwrap();
        // Same city name, different point: a separate entry.
        store.put(saved("Amsterdam", 52.35, 4.92)).unwrap();
        // Same point, new name: replaces.
        store.put(saved("Home", 52.37, 4.89)).unwrap();

        let list = store.list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Home");
        assert_eq!(list[1].name, "Amsterdam");

        assert!(store.delete(Coordinates::new(52.35, 4.92).unwrap()).unwrap());
        assert!(!store.delete(Coordinates::new(10.0, 10.0).unwrap()).unwrap());
        assert_eq!(store.list().unwrap(), vec![saved("Home", 52.37, 4.89)]);
    }

    #[test]
    fn memory_store_dedups_by_coordinates() {
        exercise(&MemoryLocationStore::new());
    }

    #[test]
    fn file_store_dedups_by_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&FileLocationStore::new(dir.path().join("data").join("locations.toml")));
    }

    #[test]
    fn file_store_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.toml");

        FileLocationStore::new(&path).put(saved("Scheveningen", 52.11, 4.28)).unwrap();

        let reopened = FileLocationStore::new(&path);
        assert_eq!(reopened.list().unwrap(), vec![saved("Scheveningen", 52.11, 4.28)]);
    }
}
