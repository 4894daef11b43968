//! Typed model of the configuration document.
//!
//! The on-disk format is a JSON object with the top-level keys `version`,
//! `settings`, `monitored_paths`, `recent_scripts` and `favorites`. Every
//! section is a typed struct; unknown keys are kept in flattened `extra` maps
//! so documents written by newer versions round-trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Version stamped into freshly bootstrapped documents.
pub const CONFIG_VERSION: &str = "0.1.0";

/// Maximum number of entries kept in `recent_scripts`.
pub const RECENT_SCRIPTS_LIMIT: usize = 10;

/// Main window geometry, persisted under `settings.window_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self { width: 800, height: 600 }
    }
}

/// The `settings` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Dark theme enabled
    pub dark_mode: bool,

    /// Rescan monitored paths periodically
    pub auto_refresh: bool,

    /// Rescan interval in seconds
    pub refresh_interval: u64,

    /// Descend into dot-directories during discovery
    pub show_hidden_files: bool,

    /// Template file used when creating a new script
    pub default_script_template: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_size: Option<WindowSize>,

    /// Open-ended settings keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            auto_refresh: true,
            refresh_interval: 5,
            show_hidden_files: false,
            default_script_template: "script-template.py".to_string(),
            window_size: None,
            extra: Map::new(),
        }
    }
}

/// Root configuration document.
///
/// `Default` yields the hard-coded defaults layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    pub version: String,

    pub settings: Settings,

    /// Directories scanned for scripts (set semantics)
    pub monitored_paths: Vec<String>,

    /// Most-recent-first, deduplicated, at most [`RECENT_SCRIPTS_LIMIT`] entries
    pub recent_scripts: Vec<String>,

    /// Favorite scripts (set semantics)
    pub favorites: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            settings: Settings::default(),
            monitored_paths: default_monitored_paths(),
            recent_scripts: Vec::new(),
            favorites: Vec::new(),
            extra: Map::new(),
        }
    }
}

fn default_monitored_paths() -> Vec<String> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    vec![
        home.join("Documents").join("Python Scripts").display().to_string(),
        home.join("Desktop").display().to_string(),
    ]
}

impl ConfigDocument {
    /// Build a document from a JSON value, then enforce the list invariants.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let mut document: ConfigDocument = serde_json::from_value(value)?;
        document.normalize();
        Ok(document)
    }

    /// JSON view of the document used for dot-path access and persistence.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Top-level mapping of the document.
    pub fn to_map(&self) -> Map<String, Value> {
        match self.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Restore list invariants that a hand-edited file may have broken.
    pub fn normalize(&mut self) {
        dedup_in_order(&mut self.monitored_paths);
        dedup_in_order(&mut self.favorites);
        dedup_in_order(&mut self.recent_scripts);
        self.recent_scripts.truncate(RECENT_SCRIPTS_LIMIT);
    }
}

/// Overwrite `base` with every top-level key of `layer`.
///
/// Sections are replaced whole; nested keys are not merged.
pub fn overlay(base: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        base.insert(key, value);
    }
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

/// Split a dot path into components, rejecting empty ones.
pub(crate) fn split_dot_path(path: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) { None } else { Some(parts) }
}

/// Navigate `root` along a dot path.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let parts = split_dot_path(path)?;
    parts.into_iter().try_fold(root, |node, key| node.as_object()?.get(key))
}

/// Assign `value` at a dot path, creating intermediate mappings.
///
/// Fails with the offending prefix when an intermediate node exists but is not
/// a mapping.
pub fn assign(root: &mut Value, path: &str, value: Value) -> Result<(), String> {
    let parts = split_dot_path(path).ok_or_else(|| format!("invalid dot path: '{path}'"))?;
    let (last, parents) = parts.split_last().ok_or_else(|| format!("invalid dot path: '{path}'"))?;

    let mut node = root;
    for (depth, key) in parents.iter().enumerate() {
        let map = node
            .as_object_mut()
            .ok_or_else(|| format!("'{}' is not a mapping", parts[..depth].join(".")))?;
        node = map.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
    }

    let map = node
        .as_object_mut()
        .ok_or_else(|| format!("'{}' is not a mapping", parents.join(".")))?;
    map.insert(last.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_contain_required_keys() {
        let map = ConfigDocument::default().to_map();
        for key in ["version", "settings", "monitored_paths", "recent_scripts", "favorites"] {
            assert!(map.contains_key(key), "missing {key}");
        }
        assert_eq!(map["settings"]["dark_mode"], json!(false));
        assert_eq!(map["settings"]["refresh_interval"], json!(5));
        assert!(map["settings"].get("window_size").is_none());
    }

    #[test]
    fn test_from_value_fills_missing_settings() {
        let doc = ConfigDocument::from_value(json!({ "settings": { "dark_mode": true } })).unwrap();
        assert!(doc.settings.dark_mode);
        assert!(doc.settings.auto_refresh);
        assert_eq!(doc.settings.default_script_template, "script-template.py");
    }

    #[test]
    fn test_from_value_rejects_wrong_shape() {
        assert!(ConfigDocument::from_value(json!({ "monitored_paths": 5 })).is_err());
        assert!(ConfigDocument::from_value(json!({ "settings": { "dark_mode": "yes" } })).is_err());
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let doc = ConfigDocument::from_value(json!({
            "window_layout": "split",
            "settings": { "font_size": 14 }
        }))
        .unwrap();
        let value = doc.to_value();
        assert_eq!(value["window_layout"], json!("split"));
        assert_eq!(value["settings"]["font_size"], json!(14));
    }

    #[test]
    fn test_normalize_enforces_list_invariants() {
        let recents: Vec<String> = (0..15).map(|i| format!("/s/{i}.py")).collect();
        let mut doc = ConfigDocument {
            monitored_paths: vec!["/a".into(), "/b".into(), "/a".into()],
            favorites: vec!["x".into(), "x".into()],
            recent_scripts: [vec!["/s/0.py".to_string()], recents].concat(),
            ..ConfigDocument::default()
        };
        doc.normalize();
        assert_eq!(doc.monitored_paths, vec!["/a", "/b"]);
        assert_eq!(doc.favorites, vec!["x"]);
        assert_eq!(doc.recent_scripts.len(), RECENT_SCRIPTS_LIMIT);
        assert_eq!(doc.recent_scripts[0], "/s/0.py");
        assert_eq!(doc.recent_scripts[1], "/s/1.py");
    }

    #[test]
    fn test_overlay_replaces_whole_sections() {
        let mut base = ConfigDocument::default().to_map();
        let layer = json!({ "settings": { "dark_mode": true }, "favorites": ["a"] });
        let Value::Object(layer) = layer else { unreachable!() };
        overlay(&mut base, layer);

        assert_eq!(base["settings"], json!({ "dark_mode": true }));
        assert_eq!(base["favorites"], json!(["a"]));
        assert_eq!(base["version"], json!(CONFIG_VERSION));
    }

    #[test]
    fn test_lookup() {
        let root = json!({ "a": { "b": { "c": 5 } }, "s": "text" });
        assert_eq!(lookup(&root, "a.b.c"), Some(&json!(5)));
        assert_eq!(lookup(&root, "a.b.x"), None);
        assert_eq!(lookup(&root, "s.inner"), None);
        assert_eq!(lookup(&root, "a..b"), None);
        assert_eq!(lookup(&root, ""), None);
    }

    #[test]
    fn test_assign_creates_intermediates() {
        let mut root = json!({});
        assign(&mut root, "a.b.c", json!(5)).unwrap();
        assert_eq!(root, json!({ "a": { "b": { "c": 5 } } }));

        assign(&mut root, "a.b.d", json!("x")).unwrap();
        assert_eq!(root["a"]["b"]["d"], json!("x"));
    }

    #[test]
    fn test_assign_through_scalar_fails() {
        let mut root = json!({ "version": "0.1.0" });
        let err = assign(&mut root, "version.major", json!(1)).unwrap_err();
        assert!(err.contains("'version' is not a mapping"));
        assert!(assign(&mut root, "a..b", json!(1)).is_err());
    }
}
