use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use geojson::FeatureCollection;
use serde_json::Value;

use crate::error::Result;
use crate::validate;

/// Slot the CLI persists converted routes under.
pub const DEFAULT_SLOT: &str = "cable-routes";

/// Key/value persistence for validated cable collections.
///
/// `put` refuses collections that fail validation. `get` never surfaces a
/// stored value that fails validation; it is reported as not found.
pub trait FeatureStore {
    fn get(&self, slot: &str) -> Result<Option<FeatureCollection>>;
    fn put(&mut self, slot: &str, collection: &FeatureCollection) -> Result<()>;
    /// Returns whether something was removed.
    fn delete(&mut self, slot: &str) -> Result<bool>;
}

fn checked(collection: &FeatureCollection) -> Result<Value> {
    let value = serde_json::to_value(collection)?;
    validate::validate_collection(&value)?;
    Ok(value)
}

fn accept(slot: &str, text: &str) -> Option<FeatureCollection> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("stored value for {:?} is not JSON: {}", slot, e);
            return None;
        }
    };
    if let Err(e) = validate::validate_collection(&value) {
        log::warn!("discarding stored value for {:?}: {}", slot, e);
        return None;
    }
    match serde_json::from_value(value) {
        Ok(collection) => Some(collection),
        Err(e) => {
            log::warn!("stored value for {:?} is not GeoJSON: {}", slot, e);
            None
        }
    }
}

/// Keeps collections as serialized JSON in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw text without validation, as an external writer might.
    pub fn put_raw(&mut self, slot: &str, text: &str) {
        self.slots.insert(slot.to_string(), text.to_string());
    }
}

impl FeatureStore for MemoryStore {
    fn get(&self, slot: &str) -> Result<Option<FeatureCollection>> {
        Ok(self.slots.get(slot).and_then(|text| accept(slot, text)))
    }

    fn put(&mut self, slot: &str, collection: &FeatureCollection) -> Result<()> {
        let value = checked(collection)?;
        self.slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, slot: &str) -> Result<bool> {
        Ok(self.slots.remove(slot).is_some())
    }
}

/// One pretty-printed `<slot>.geojson` file per slot under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{}.geojson", slot))
    }
}

impl FeatureStore for FileStore {
    fn get(&self, slot: &str) -> Result<Option<FeatureCollection>> {
        match fs::read_to_string(self.path(slot)) {
            Ok(text) => Ok(accept(slot, &text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, slot: &str, collection: &FeatureCollection) -> Result<()> {
        let value = checked(collection)?;
        fs::create_dir_all(&self.root)?;
        let path = self.path(slot);
        fs::write(&path, serde_json::to_string_pretty(&value)?)?;
        log::debug!("stored {} features in {}", collection.features.len(), path.display());
        Ok(())
    }

    fn delete(&mut self, slot: &str) -> Result<bool> {
        match fs::remove_file(self.path(slot)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
