//! Parser for SCRIPT.md files with YAML frontmatter.
//!
//! SCRIPT.md format:
//! ```markdown
//! ---
//! title: Hello world
//! description: Prints a phrase to the console
//! entry: hello.py
//! arguments:
//!   - name: input_phrase
//!     type: str
//!     default: hello world
//!     description: Phrase to print
//! ---
//!
//! Optional help text.
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::invoker::ScriptEntry;
use crate::runtimes::{ProcessEntry, ScriptType};
use crate::types::{ManifestError, Manifest, ParamType, ParamValue, ParameterSpec, Script, ScriptSource};

pub const MANIFEST_FILE: &str = "SCRIPT.md";

/// Preferred entry file stems when a directory holds several scripts.
const ENTRY_STEMS: &[&str] = &["main", "run"];

/// Parse a script directory: its SCRIPT.md plus the entry file.
pub fn parse_script(dir: &Path) -> Result<Script, ManifestError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(ManifestError::NotFound(manifest_path.display().to_string()));
    }

    let content = fs::read_to_string(&manifest_path)?;
    let (frontmatter, body) = split_frontmatter(&content)?;
    let manifest = build_manifest(&frontmatter)?;
    let entry_path = resolve_entry(dir, frontmatter.entry.as_deref())?;

    let id = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| manifest.title.clone());

    Ok(Script::new(id, manifest, ScriptSource::Directory(dir.to_path_buf()), entry_for(&entry_path)).with_help(body))
}

/// Parse manifest text without touching the filesystem.
pub fn parse_manifest_str(content: &str) -> Result<Manifest, ManifestError> {
    let (frontmatter, _) = split_frontmatter(content)?;
    build_manifest(&frontmatter)
}

fn split_frontmatter(content: &str) -> Result<(Frontmatter, String), ManifestError> {
    let content = content.trim_start_matches('\u{feff}');
    let Some(rest) = content.strip_prefix("---") else {
        return Err(ManifestError::InvalidFrontmatter(format!("{MANIFEST_FILE} must start with ---")));
    };

    let end = rest
        .find("\n---")
        .ok_or_else(|| ManifestError::InvalidFrontmatter("closing --- not found".to_string()))?;

    let yaml = &rest[..end];
    let body = rest[end + 4..].trim_start_matches('-');

    let frontmatter: Frontmatter =
        serde_yml::from_str(yaml).map_err(|e| ManifestError::InvalidFrontmatter(format!("YAML parse error: {e}")))?;

    Ok((frontmatter, body.trim().to_string()))
}

fn build_manifest(frontmatter: &Frontmatter) -> Result<Manifest, ManifestError> {
    let title = frontmatter.title.clone().unwrap_or_default();

    let mut parameters = Vec::with_capacity(frontmatter.arguments.len());
    for (index, arg) in frontmatter.arguments.iter().enumerate() {
        let name = match &arg.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => return Err(ManifestError::MissingName { index }),
        };

        let param_type: ParamType = match &arg.param_type {
            None => return Err(ManifestError::MissingType { name }),
            Some(raw) => raw.parse().map_err(|_| ManifestError::UnknownType { name: name.clone(), value: raw.clone() })?,
        };

        let default = match &arg.default {
            None | Some(Value::Null) => ParamValue::zero(param_type),
            Some(value) => ParamValue::from_json(param_type, value).ok_or_else(|| ManifestError::DefaultMismatch {
                name: name.clone(),
                expected: param_type,
                value: value.to_string(),
            })?,
        };

        parameters.push(ParameterSpec::new(name, param_type, default, arg.description.clone().unwrap_or_default()));
    }

    Manifest::new(title, frontmatter.description.clone().unwrap_or_default(), parameters)
}

/// Pick the file that runs the script.
///
/// An explicit `entry` must exist. Otherwise the directory must hold exactly
/// one script file, or one named `main.*` / `run.*`.
fn resolve_entry(dir: &Path, entry: Option<&str>) -> Result<PathBuf, ManifestError> {
    if let Some(entry) = entry {
        let path = dir.join(entry);
        return if path.is_file() {
            Ok(path)
        } else {
            Err(ManifestError::MissingEntry(format!("{} does not exist", path.display())))
        };
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && ScriptType::is_script_file(p))
        .collect();
    candidates.sort();

    if candidates.len() == 1 {
        return Ok(candidates.remove(0));
    }

    for stem in ENTRY_STEMS {
        if let Some(path) = candidates.iter().find(|p| p.file_stem().is_some_and(|s| s == *stem)) {
            return Ok(path.clone());
        }
    }

    Err(ManifestError::MissingEntry(if candidates.is_empty() {
        format!("no script file in {}", dir.display())
    } else {
        format!("several script files in {}; set `entry` in {MANIFEST_FILE}", dir.display())
    }))
}

#[cfg(feature = "lua")]
fn entry_for(path: &Path) -> Arc<dyn ScriptEntry> {
    match ScriptType::from_path(path) {
        ScriptType::Lua => Arc::new(crate::runtimes::LuaEntry::new(path)),
        _ => Arc::new(ProcessEntry::new(path)),
    }
}

#[cfg(not(feature = "lua"))]
fn entry_for(path: &Path) -> Arc<dyn ScriptEntry> {
    Arc::new(ProcessEntry::new(path))
}

/// YAML frontmatter structure.
#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    entry: Option<String>,

    #[serde(default)]
    arguments: Vec<FrontmatterArgument>,
}

#[derive(Debug, Deserialize)]
struct FrontmatterArgument {
    #[serde(default)]
    name: Option<String>,

    #[serde(default, rename = "type")]
    param_type: Option<String>,

    #[serde(default)]
    default: Option<Value>,

    #[serde(default)]
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO: &str = r#"---
title: Hello world
description: Prints "Hello world" to the console
arguments:
  - name: input_phrase
    type: str
    default: hello world
    description: Phrase to print to the console
  - name: repeat
    type: int
    default: 2
  - name: scale
    type: float
    default: 1
  - name: shout
    type: bool
---

# Hello

Prints a phrase.
"#;

    #[test]
    fn test_parse_manifest_str() {
        let manifest = parse_manifest_str(HELLO).unwrap();
        assert_eq!(manifest.title, "Hello world");
        assert_eq!(manifest.description, "Prints \"Hello world\" to the console");
        assert_eq!(manifest.parameters.len(), 4);

        let phrase = manifest.parameter("input_phrase").unwrap();
        assert_eq!(phrase.param_type, ParamType::Str);
        assert_eq!(phrase.default, ParamValue::from("hello world"));
        assert_eq!(phrase.description, "Phrase to print to the console");

        assert_eq!(manifest.parameter("repeat").unwrap().default, ParamValue::Int(2));
        assert_eq!(manifest.parameter("scale").unwrap().default, ParamValue::Float(1.0));
        assert_eq!(manifest.parameter("shout").unwrap().default, ParamValue::Bool(false));
    }

    #[test]
    fn test_missing_frontmatter() {
        let err = parse_manifest_str("# Just markdown").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidFrontmatter(_)));

        let err = parse_manifest_str("---\ntitle: x\n").unwrap_err();
        assert!(err.to_string().contains("closing ---"));
    }

    #[test]
    fn test_missing_title() {
        let err = parse_manifest_str("---\ndescription: nothing\n---\n").unwrap_err();
        assert!(matches!(err, ManifestError::MissingTitle));
    }

    #[test]
    fn test_argument_errors() {
        let missing_name = "---\ntitle: T\narguments:\n  - type: int\n---\n";
        assert!(matches!(parse_manifest_str(missing_name), Err(ManifestError::MissingName { index: 0 })));

        let missing_type = "---\ntitle: T\narguments:\n  - name: a\n---\n";
        assert!(matches!(parse_manifest_str(missing_type), Err(ManifestError::MissingType { .. })));

        let unknown_type = "---\ntitle: T\narguments:\n  - name: a\n    type: list\n---\n";
        let err = parse_manifest_str(unknown_type).unwrap_err();
        assert_eq!(err.to_string(), "argument 'a' has unknown type 'list' (must be str, int, float, or bool)");

        let bad_default = "---\ntitle: T\narguments:\n  - name: a\n    type: int\n    default: many\n---\n";
        assert!(matches!(parse_manifest_str(bad_default), Err(ManifestError::DefaultMismatch { .. })));

        let duplicate = "---\ntitle: T\narguments:\n  - {name: a, type: int}\n  - {name: a, type: str}\n---\n";
        assert!(matches!(parse_manifest_str(duplicate), Err(ManifestError::DuplicateName(_))));
    }

    #[test]
    fn test_parse_script_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("hello");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), HELLO).unwrap();
        fs::write(dir.join("hello.py"), "print('hi')\n").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let script = parse_script(&dir).unwrap();
        assert_eq!(script.id, "hello");
        assert_eq!(script.help, "# Hello\n\nPrints a phrase.");
        assert_eq!(script.source, ScriptSource::Directory(dir.clone()));
        assert_eq!(script.entry().kind(), "process");
    }

    #[test]
    fn test_entry_resolution() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();

        assert!(matches!(resolve_entry(dir, None), Err(ManifestError::MissingEntry(_))));

        fs::write(dir.join("helper.py"), "").unwrap();
        fs::write(dir.join("other.sh"), "").unwrap();
        let err = resolve_entry(dir, None).unwrap_err();
        assert!(err.to_string().contains("several script files"));

        fs::write(dir.join("main.py"), "").unwrap();
        assert_eq!(resolve_entry(dir, None).unwrap(), dir.join("main.py"));

        assert_eq!(resolve_entry(dir, Some("other.sh")).unwrap(), dir.join("other.sh"));
        assert!(resolve_entry(dir, Some("missing.sh")).is_err());
    }

    #[test]
    fn test_parse_script_without_manifest() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(parse_script(temp.path()), Err(ManifestError::NotFound(_))));
    }
}
