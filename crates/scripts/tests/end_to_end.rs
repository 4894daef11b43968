//! Discovery, resolution and invocation of an on-disk script.

#![cfg(unix)]

use std::fs;
use std::path::Path;

use scriptdeck_core::{ConfigPaths, ConfigStore};
use scriptdeck_scripts::{DiscoveryOptions, InvocationStatus, ScriptCatalog, parse_cli_overrides, resolve, run_script};
use tempfile::TempDir;

const MANIFEST: &str = r#"---
title: Write greeting
description: Writes a greeting to out.txt
entry: run.sh
arguments:
  - name: greeting
    type: str
    default: hello
  - name: times
    type: int
    default: 1
  - name: fail
    type: bool
    default: false
---

Writes `greeting` `times` times.
"#;

const RUN_SH: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    greeting=*) greeting="${arg#greeting=}" ;;
    times=*) times="${arg#times=}" ;;
    fail=*) fail="${arg#fail=}" ;;
  esac
done
if [ "$fail" = "true" ]; then
  echo "asked to fail" >&2
  exit 4
fi
i=0
: > out.txt
while [ "$i" -lt "$times" ]; do
  echo "$greeting" >> out.txt
  i=$((i + 1))
done
"#;

fn install_script(root: &Path) {
    let dir = root.join("greeter");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("SCRIPT.md"), MANIFEST).unwrap();
    fs::write(dir.join("run.sh"), RUN_SH).unwrap();
}

#[test]
fn test_discover_resolve_invoke() {
    let scripts = TempDir::new().unwrap();
    install_script(scripts.path());

    let dirs = [scripts.path().display().to_string()];
    let catalog = ScriptCatalog::discover(&dirs, DiscoveryOptions::default()).unwrap();
    let script = catalog.get("greeter").unwrap();
    assert_eq!(script.manifest.title, "Write greeting");
    assert_eq!(script.help, "Writes `greeting` `times` times.");

    let overrides = parse_cli_overrides(["greeting=hi there", "times=3", "unknown=1"]);
    let result = run_script(script, &overrides).unwrap();
    assert_eq!(result.status, InvocationStatus::Success, "{}", result.message);
    assert_eq!(result.message, "'Write greeting' completed successfully");

    let out = fs::read_to_string(scripts.path().join("greeter/out.txt")).unwrap();
    assert_eq!(out, "hi there\nhi there\nhi there\n");
}

#[test]
fn test_script_failure_surfaces_stderr() {
    let scripts = TempDir::new().unwrap();
    install_script(scripts.path());

    let dirs = [scripts.path().display().to_string()];
    let catalog = ScriptCatalog::discover(&dirs, DiscoveryOptions::default()).unwrap();
    let script = catalog.get("greeter").unwrap();

    let result = run_script(script, &parse_cli_overrides(["fail=yes"])).unwrap();
    assert_eq!(result.status, InvocationStatus::Failure);
    assert_eq!(result.message, "asked to fail (exited with status 4)");
}

#[test]
fn test_bad_arguments_never_reach_the_script() {
    let scripts = TempDir::new().unwrap();
    install_script(scripts.path());

    let dirs = [scripts.path().display().to_string()];
    let catalog = ScriptCatalog::discover(&dirs, DiscoveryOptions::default()).unwrap();
    let script = catalog.get("greeter").unwrap();

    let err = resolve(&script.manifest, &parse_cli_overrides(["times=lots", "fail=perhaps"])).unwrap_err();
    assert_eq!(err.errors.len(), 2);
    assert!(run_script(script, &parse_cli_overrides(["times=lots"])).is_err());
    assert!(!scripts.path().join("greeter/out.txt").exists());
}

#[test]
fn test_catalog_from_store_uses_monitored_paths() {
    let config = TempDir::new().unwrap();
    let scripts = TempDir::new().unwrap();
    install_script(scripts.path());

    let mut store = ConfigStore::load(ConfigPaths::new(config.path().join("config.json"), None));
    store.add_monitored_path(scripts.path().display().to_string()).unwrap();

    let catalog = ScriptCatalog::from_store(&store).unwrap();
    let script = catalog.get("greeter").unwrap();
    store.add_recent_script(script.location()).unwrap();
    assert_eq!(store.get_recent_scripts()[0], scripts.path().join("greeter").display().to_string());
}
