//! Script discovery across monitored directories.
//!
//! The catalog supports:
//! - Built-in scripts, always listed first
//! - `SCRIPT.md` directories up to two levels below each monitored path
//! - Lookup by id (directory name or built-in id) or by directory path

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use scriptdeck_core::ConfigStore;
use scriptdeck_core::logging::sanitize_path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::builtin::builtin_scripts;
use crate::parser::{MANIFEST_FILE, parse_script};
use crate::types::{Result, Script, ScriptError, ScriptSource};

/// Discovery settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Descend into dot-directories
    pub include_hidden: bool,
    pub include_builtins: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self { include_hidden: false, include_builtins: true }
    }
}

/// Every script known to the process, in listing order.
#[derive(Debug, Clone, Default)]
pub struct ScriptCatalog {
    scripts: Vec<Script>,
}

impl ScriptCatalog {
    /// Scan the store's monitored paths, honoring `settings.show_hidden_files`.
    pub fn from_store(store: &ConfigStore) -> Result<Self> {
        let options =
            DiscoveryOptions { include_hidden: store.document().settings.show_hidden_files, ..Default::default() };
        Self::discover(store.get_monitored_paths(), options)
    }

    /// Build the catalog from built-ins and the given directories.
    ///
    /// Missing directories and invalid manifests are logged and skipped.
    pub fn discover<P: AsRef<str>>(monitored: &[P], options: DiscoveryOptions) -> Result<Self> {
        let mut catalog = Self::default();

        if options.include_builtins {
            for script in builtin_scripts()? {
                catalog.insert(script);
            }
        }

        for raw in monitored {
            let dir = expand_home(raw.as_ref());
            if !dir.is_dir() {
                debug!(path = %sanitize_path(&dir), "monitored path is not a directory");
                continue;
            }
            for script in discover_in_dir(&dir, options.include_hidden) {
                catalog.insert(script);
            }
        }

        debug!(count = catalog.scripts.len(), "script discovery finished");
        Ok(catalog)
    }

    fn insert(&mut self, script: Script) {
        if let Some(existing) = self.scripts.iter().find(|s| s.id == script.id) {
            warn!(id = %script.id, kept = %existing.location(), skipped = %script.location(), "duplicate script id");
            return;
        }
        self.scripts.push(script);
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Find a script by id, recorded location, or directory path.
    pub fn find(&self, name: &str) -> Option<&Script> {
        if let Some(script) = self.scripts.iter().find(|s| s.id == name || s.location() == name) {
            return Some(script);
        }

        let wanted = canonical(&expand_home(name));
        self.scripts.iter().find(|s| match &s.source {
            ScriptSource::Directory(dir) => canonical(dir) == wanted,
            ScriptSource::Builtin => false,
        })
    }

    /// Like [`find`](Self::find), but fails with [`ScriptError::NotFound`].
    pub fn get(&self, name: &str) -> Result<&Script> {
        self.find(name).ok_or_else(|| ScriptError::NotFound(name.to_string()))
    }
}

/// Scripts in one monitored directory, sorted by path.
fn discover_in_dir(dir: &Path, include_hidden: bool) -> Vec<Script> {
    let mut scripts = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(2)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| include_hidden || !is_hidden(e));

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.file_name() != Some(OsStr::new(MANIFEST_FILE)) {
            continue;
        }
        let Some(script_dir) = path.parent() else {
            continue;
        };
        match parse_script(script_dir) {
            Ok(script) => scripts.push(script),
            Err(e) => warn!(path = %sanitize_path(script_dir), error = %e, "skipping invalid script"),
        }
    }

    scripts
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~")
        && (rest.is_empty() || rest.starts_with('/'))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest.trim_start_matches('/'));
    }
    PathBuf::from(path)
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
