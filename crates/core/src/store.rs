//! Layered configuration store.
//!
//! The effective document is built from three layers in increasing priority:
//! the hard-coded defaults, the bundled `default_config.json` and the user's
//! `config.json`. Layers are merged per top-level key: a layer that defines
//! `settings` replaces the whole `settings` section of the layers below it.
//! Typed deserialization then backfills any settings field the winning
//! section left out from the hard-coded defaults.
//!
//! A missing, unreadable or unparseable optional layer is logged and skipped,
//! so [`ConfigStore::load`] always yields a usable document. Inside a layer
//! that parses, only the keys (or `settings` fields) of the wrong type are
//! dropped. Every mutation rewrites the full document to the user file.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{self, ConfigDocument, RECENT_SCRIPTS_LIMIT, WindowSize};
use crate::error::{ConfigIoError, Error, Result};
use crate::logging::sanitize_path;
use crate::paths::ConfigPaths;

/// Process-wide configuration state with an explicit load/close lifecycle.
#[derive(Debug)]
pub struct ConfigStore {
    paths: ConfigPaths,
    document: ConfigDocument,
    warnings: Vec<ConfigIoError>,
}

impl ConfigStore {
    /// Load and merge all layers. Never fails; problems end up in [`Self::load_warnings`].
    ///
    /// When the user file does not exist yet the merged result is written as
    /// the initial user file.
    pub fn load(paths: ConfigPaths) -> Self {
        let mut warnings = Vec::new();
        let mut merged = ConfigDocument::default().to_map();
        let mut document = ConfigDocument::default();

        if let Some(bundled) = &paths.bundled {
            if bundled.exists() {
                apply_layer(bundled, &mut merged, &mut document, &mut warnings);
            } else {
                debug!(path = %sanitize_path(bundled), "no bundled defaults");
            }
        }

        let bootstrap = !paths.user.exists();
        if !bootstrap {
            apply_layer(&paths.user, &mut merged, &mut document, &mut warnings);
        }

        let mut store = Self { paths, document, warnings };

        if bootstrap {
            match store.persist() {
                Ok(()) => debug!(path = %sanitize_path(&store.paths.user), "created initial user config"),
                Err(err) => {
                    warn!(error = %err, "could not create initial user config");
                    store.warnings.push(err);
                }
            }
        }

        store
    }

    /// Final persist; consumes the store.
    pub fn close(self) -> Result<()> {
        self.persist()?;
        debug!(path = %sanitize_path(&self.paths.user), "config store closed");
        Ok(())
    }

    /// Locations the store reads and writes.
    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Read-only typed view of the effective document.
    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Non-fatal layer failures collected during load (and bootstrap).
    pub fn load_warnings(&self) -> &[ConfigIoError] {
        &self.warnings
    }

    /// Value at `dot_path`, or `default` when any component is absent or not a mapping.
    pub fn get(&self, dot_path: &str, default: Value) -> Value {
        self.lookup(dot_path).unwrap_or(default)
    }

    /// Value at `dot_path`, if present.
    pub fn lookup(&self, dot_path: &str) -> Option<Value> {
        config::lookup(&self.document.to_value(), dot_path).cloned()
    }

    /// Typed value at `dot_path`; `None` when absent or of another type.
    pub fn get_as<T: DeserializeOwned>(&self, dot_path: &str) -> Option<T> {
        self.lookup(dot_path).and_then(|v| serde_json::from_value(v).ok())
    }

    /// Assign `value` at `dot_path` and persist the full document.
    ///
    /// Intermediate mappings are created as needed. A value that does not fit
    /// the typed field it lands on is rejected and the document is left
    /// unchanged. A write failure is returned, but the in-memory change is kept.
    pub fn set(&mut self, dot_path: &str, value: impl Into<Value>) -> Result<()> {
        let mut root = self.document.to_value();
        config::assign(&mut root, dot_path, value.into()).map_err(Error::Config)?;

        let document = ConfigDocument::from_value(root)
            .map_err(|e| Error::Config(format!("invalid value for '{dot_path}': {e}")))?;
        self.document = document;

        debug!(key = dot_path, "config value set");
        self.persist()?;
        Ok(())
    }

    /// Monitored directories in insertion order.
    pub fn get_monitored_paths(&self) -> &[String] {
        &self.document.monitored_paths
    }

    /// Add a monitored directory. Returns `false` (and writes nothing) if already present.
    pub fn add_monitored_path(&mut self, path: impl Into<String>) -> Result<bool> {
        let path = path.into();
        if self.document.monitored_paths.contains(&path) {
            return Ok(false);
        }
        let mut paths = self.document.monitored_paths.clone();
        paths.push(path);
        self.set("monitored_paths", paths)?;
        Ok(true)
    }

    /// Remove a monitored directory. Returns `false` (and writes nothing) if absent.
    pub fn remove_monitored_path(&mut self, path: &str) -> Result<bool> {
        if !self.document.monitored_paths.iter().any(|p| p == path) {
            return Ok(false);
        }
        let paths: Vec<String> = self
            .document
            .monitored_paths
            .iter()
            .filter(|p| p.as_str() != path)
            .cloned()
            .collect();
        self.set("monitored_paths", paths)?;
        Ok(true)
    }

    /// Recently run scripts, most recent first.
    pub fn get_recent_scripts(&self) -> &[String] {
        &self.document.recent_scripts
    }

    /// Move `path` to the front of the recent list, keeping at most ten distinct entries.
    pub fn add_recent_script(&mut self, path: impl Into<String>) -> Result<()> {
        let path = path.into();
        let mut recent: Vec<String> = Vec::with_capacity(RECENT_SCRIPTS_LIMIT);
        recent.push(path.clone());
        recent.extend(self.document.recent_scripts.iter().filter(|p| **p != path).cloned());
        recent.truncate(RECENT_SCRIPTS_LIMIT);
        self.set("recent_scripts", recent)
    }

    /// Empty the recent list and persist.
    pub fn clear_recent_scripts(&mut self) -> Result<()> {
        self.set("recent_scripts", Vec::<String>::new())
    }

    /// Favorite script ids or locations.
    pub fn favorites(&self) -> &[String] {
        &self.document.favorites
    }

    /// Whether `script` is a favorite.
    pub fn is_favorite(&self, script: &str) -> bool {
        self.document.favorites.iter().any(|f| f == script)
    }

    /// Flip favorite membership of `script`; returns the new membership.
    pub fn toggle_favorite(&mut self, script: &str) -> Result<bool> {
        let mut favorites = self.document.favorites.clone();
        let now_favorite = if let Some(pos) = favorites.iter().position(|f| f == script) {
            favorites.remove(pos);
            false
        } else {
            favorites.push(script.to_string());
            true
        };
        self.set("favorites", favorites)?;
        Ok(now_favorite)
    }

    /// `settings.dark_mode`.
    pub fn is_dark_mode(&self) -> bool {
        self.document.settings.dark_mode
    }

    /// Set `settings.dark_mode` and persist.
    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<()> {
        self.set("settings.dark_mode", enabled)
    }

    /// Flip dark mode; returns the new state.
    pub fn toggle_dark_mode(&mut self) -> Result<bool> {
        let enabled = !self.is_dark_mode();
        self.set_dark_mode(enabled)?;
        Ok(enabled)
    }

    /// Last saved window size, if any.
    pub fn window_size(&self) -> Option<WindowSize> {
        self.document.settings.window_size
    }

    /// Set `settings.window_size` and persist.
    pub fn set_window_size(&mut self, width: u32, height: u32) -> Result<()> {
        let mut size = Map::new();
        size.insert("width".to_string(), width.into());
        size.insert("height".to_string(), height.into());
        self.set("settings.window_size", Value::Object(size))
    }

    /// Write the full in-memory document to the user file.
    fn persist(&self) -> std::result::Result<(), ConfigIoError> {
        let path = &self.paths.user;
        let write_err = |e: &dyn std::fmt::Display| ConfigIoError::write(path, e);

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| write_err(&e))?;
        }

        let json = serde_json::to_string_pretty(&self.document).map_err(|e| write_err(&e))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| write_err(&e))?;
        fs::rename(&tmp, path).map_err(|e| write_err(&e))?;

        debug!(path = %sanitize_path(path), "saved user config");
        Ok(())
    }
}

/// Read one optional layer and merge it over `merged` one top-level key at a time.
///
/// A key whose value does not fit the typed document is dropped and the rest
/// of the layer still applies. Inside a mapping section such as `settings`
/// only the offending fields are dropped, so the typed defaults fill them in.
fn apply_layer(
    path: &Path, merged: &mut Map<String, Value>, document: &mut ConfigDocument, warnings: &mut Vec<ConfigIoError>,
) {
    let layer = match read_layer(path) {
        Ok(layer) => layer,
        Err(err) => {
            warn!(error = %err, "skipping config layer");
            warnings.push(err);
            return;
        }
    };

    for (key, value) in layer {
        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value.clone());
        match ConfigDocument::from_value(Value::Object(candidate.clone())) {
            Ok(doc) => {
                *merged = candidate;
                *document = doc;
            }
            Err(e) => match value {
                Value::Object(section) if section_accepts_fields(merged, &key) => {
                    apply_section(path, &key, section, merged, document, warnings)
                }
                _ => {
                    let err = ConfigIoError::validate(path, format!("'{key}': {e}"));
                    warn!(error = %err, "skipping config key");
                    warnings.push(err);
                }
            },
        }
    }

    debug!(path = %sanitize_path(path), "loaded config layer");
}

/// Whether an empty mapping is a valid value for `key`.
fn section_accepts_fields(merged: &Map<String, Value>, key: &str) -> bool {
    let mut candidate = merged.clone();
    candidate.insert(key.to_string(), Value::Object(Map::new()));
    ConfigDocument::from_value(Value::Object(candidate)).is_ok()
}

/// Rebuild the `key` section field by field, keeping every field that still validates.
fn apply_section(
    path: &Path, key: &str, section: Map<String, Value>, merged: &mut Map<String, Value>,
    document: &mut ConfigDocument, warnings: &mut Vec<ConfigIoError>,
) {
    let mut kept = Map::new();
    let mut candidate = merged.clone();

    for (field, value) in section {
        let mut trial = kept.clone();
        trial.insert(field.clone(), value);
        candidate.insert(key.to_string(), Value::Object(trial.clone()));
        match ConfigDocument::from_value(Value::Object(candidate.clone())) {
            Ok(_) => kept = trial,
            Err(e) => {
                let err = ConfigIoError::validate(path, format!("'{key}.{field}': {e}"));
                warn!(error = %err, "skipping config field");
                warnings.push(err);
            }
        }
    }

    candidate.insert(key.to_string(), Value::Object(kept));
    if let Ok(doc) = ConfigDocument::from_value(Value::Object(candidate.clone())) {
        *merged = candidate;
        *document = doc;
    }
}

fn read_layer(path: &Path) -> std::result::Result<Map<String, Value>, ConfigIoError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigIoError::read(path, e))?;
    match serde_json::from_str::<Value>(&content).map_err(|e| ConfigIoError::parse(path, e))? {
        Value::Object(map) => Ok(map),
        other => Err(ConfigIoError::validate(
            path,
            format!("expected a JSON object, found {}", json_kind(&other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
