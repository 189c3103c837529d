//! Per-extension key-value storage
//!
//! Implements the extension platform's `storage.local` contract, keyed by
//! extension identifier. The `sync` and `managed` areas alias the same
//! namespace; no separate sync backend exists. Documents load lazily, stay
//! cached in memory, and are written back to disk in full after every
//! mutation. Write volume from extensions is low, so correctness wins over
//! throughput here.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub type Document = Map<String, Value>;

const STORE_FILE: &str = "storage.json";

/// The polymorphic key argument accepted by `get`, mirroring the extension
/// platform's calling convention exactly: extensions depend on every shape.
#[derive(Debug, Clone)]
pub enum KeysSpec {
    /// Return the entire document.
    All,
    /// Return `{key: value}`, or an empty result when absent.
    One(String),
    /// Return only the listed keys that are present.
    Many(Vec<String>),
    /// Return every listed key, substituting the default when absent.
    WithDefaults(Document),
}

impl KeysSpec {
    /// Interpret a JSON argument the way the platform API does: `null`
    /// selects everything, a string one key, an array several, an object
    /// keys with defaults.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => KeysSpec::All,
            Value::String(key) => KeysSpec::One(key.clone()),
            Value::Array(items) => KeysSpec::Many(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            Value::Object(defaults) => KeysSpec::WithDefaults(defaults.clone()),
            _ => KeysSpec::All,
        }
    }
}

/// Durable, cached storage partitioned by extension identifier.
pub struct StorageBridge {
    root: PathBuf,
    cache: HashMap<String, Document>,
}

impl StorageBridge {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, extension_id: &str, keys: &KeysSpec) -> Document {
        let doc = self.document(extension_id);
        match keys {
            KeysSpec::All => doc.clone(),
            KeysSpec::One(key) => {
                let mut out = Document::new();
                if let Some(value) = doc.get(key) {
                    out.insert(key.clone(), value.clone());
                }
                out
            }
            KeysSpec::Many(keys) => {
                let mut out = Document::new();
                for key in keys {
                    if let Some(value) = doc.get(key) {
                        out.insert(key.clone(), value.clone());
                    }
                }
                out
            }
            KeysSpec::WithDefaults(defaults) => {
                let mut out = Document::new();
                for (key, default) in defaults {
                    let value = doc.get(key).cloned().unwrap_or_else(|| default.clone());
                    out.insert(key.clone(), value);
                }
                out
            }
        }
    }

    /// Shallow-merge `items` into the document and persist.
    pub fn set(&mut self, extension_id: &str, items: Document) {
        let doc = self.document(extension_id);
        for (key, value) in items {
            doc.insert(key, value);
        }
        self.persist(extension_id);
    }

    pub fn remove(&mut self, extension_id: &str, keys: &[String]) {
        let doc = self.document(extension_id);
        for key in keys {
            doc.remove(key);
        }
        self.persist(extension_id);
    }

    pub fn clear(&mut self, extension_id: &str) {
        self.cache.insert(extension_id.to_string(), Document::new());
        self.persist(extension_id);
    }

    /// Drop the cached document and delete the durable file. Called when
    /// the owning extension is removed; best-effort on the file side.
    pub fn delete_store(&mut self, extension_id: &str) {
        self.cache.remove(extension_id);
        let path = self.store_path(extension_id);
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(extension = extension_id, error = %e, "failed to delete storage file");
            }
        }
    }

    fn store_path(&self, extension_id: &str) -> PathBuf {
        self.root.join(extension_id).join(STORE_FILE)
    }

    fn document(&mut self, extension_id: &str) -> &mut Document {
        let path = self.store_path(extension_id);
        self.cache
            .entry(extension_id.to_string())
            .or_insert_with(|| load_document(&path, extension_id))
    }

    fn persist(&mut self, extension_id: &str) {
        let path = self.store_path(extension_id);
        let doc = match self.cache.get(extension_id) {
            Some(doc) => doc,
            None => return,
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(extension = extension_id, error = %e, "failed to create storage directory");
                return;
            }
        }
        match serde_json::to_string(doc) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    warn!(extension = extension_id, error = %e, "failed to persist storage document");
                }
            }
            Err(e) => warn!(extension = extension_id, error = %e, "failed to serialize storage document"),
        }
    }
}

/// Read a persisted document. A missing file is a fresh store; a corrupt
/// one resets to empty, because extensions have no path to handle the
/// error themselves.
fn load_document(path: &Path, extension_id: &str) -> Document {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => {
            debug!(extension = extension_id, "no storage document yet");
            return Document::new();
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(doc)) => doc,
        Ok(_) | Err(_) => {
            warn!(extension = extension_id, "storage document corrupt, resetting to empty");
            Document::new()
        }
    }
}
