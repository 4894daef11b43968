//! Scripts run as child processes.
//!
//! The entry file is handed to an interpreter picked from its extension.
//! Resolved arguments arrive twice: as `key=value` argv tokens and as a JSON
//! object in [`ARGS_ENV_VAR`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::invoker::ScriptEntry;
use crate::resolver::ResolvedArguments;
use crate::types::InvocationError;

/// Environment variable carrying the resolved arguments as JSON.
pub const ARGS_ENV_VAR: &str = "SCRIPTDECK_ARGS";

/// The type of script based on file extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScriptType {
    Bash,
    JavaScript,
    Python,
    Lua,
    /// Executed directly; must carry its own shebang or be a binary
    Executable,
}

impl ScriptType {
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_lowercase().as_str() {
                "sh" | "bash" => ScriptType::Bash,
                "js" | "mjs" => ScriptType::JavaScript,
                "py" => ScriptType::Python,
                "lua" => ScriptType::Lua,
                _ => ScriptType::Executable,
            })
            .unwrap_or(ScriptType::Executable)
    }

    /// Interpreter program, or `None` when the file runs by itself.
    pub fn interpreter(&self) -> Option<&'static str> {
        match self {
            ScriptType::Bash => Some("bash"),
            ScriptType::JavaScript => Some("node"),
            ScriptType::Python => Some("python3"),
            ScriptType::Lua => Some("lua"),
            ScriptType::Executable => None,
        }
    }

    /// Whether a file with this extension is a candidate entry point.
    pub fn is_script_file(path: &Path) -> bool {
        !matches!(Self::from_path(path), ScriptType::Executable)
    }
}

/// Entry point that spawns the script file.
#[derive(Debug, Clone)]
pub struct ProcessEntry {
    path: PathBuf,
    script_type: ScriptType,
}

impl ProcessEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let script_type = ScriptType::from_path(&path);
        Self { path, script_type }
    }

    pub fn with_type(path: impl Into<PathBuf>, script_type: ScriptType) -> Self {
        Self { path: path.into(), script_type }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn script_type(&self) -> ScriptType {
        self.script_type
    }

    fn command(&self, args: &ResolvedArguments) -> Command {
        let mut cmd = match self.script_type.interpreter() {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(&self.path);
                cmd
            }
            None => Command::new(&self.path),
        };

        cmd.args(args.to_cli_tokens())
            .env(ARGS_ENV_VAR, args.to_json().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn program(&self) -> String {
        self.script_type
            .interpreter()
            .map(str::to_string)
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl ScriptEntry for ProcessEntry {
    fn kind(&self) -> &'static str {
        "process"
    }

    fn run(&self, args: &ResolvedArguments) -> Result<(), InvocationError> {
        let path = self.path.canonicalize().unwrap_or_else(|_| self.path.clone());
        let entry = Self { path, script_type: self.script_type };

        debug!(program = %entry.program(), path = %entry.path.display(), "spawning script");
        let output = entry
            .command(args)
            .output()
            .map_err(|source| InvocationError::Spawn { program: entry.program(), source })?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.is_empty() {
            if let Err(e) = std::io::stderr().write_all(stderr.as_bytes()) {
                debug!(error = %e, "failed to echo script stderr");
            }
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(InvocationError::Exit { code: output.status.code(), stderr })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    use crate::resolver::resolve;
    use crate::types::{Manifest, ParamType, ParamValue, ParameterSpec};

    fn args() -> ResolvedArguments {
        let manifest = Manifest::new(
            "Writer",
            "",
            vec![
                ParameterSpec::new("message", ParamType::Str, "hello", ""),
                ParameterSpec::new("times", ParamType::Int, 2_i64, ""),
            ],
        )
        .unwrap();
        let overrides = HashMap::from([("message".to_string(), ParamValue::from("from test"))]);
        resolve(&manifest, &overrides).unwrap()
    }

    #[test]
    fn test_script_type_from_extension() {
        assert_eq!(ScriptType::from_path(Path::new("run.sh")), ScriptType::Bash);
        assert_eq!(ScriptType::from_path(Path::new("main.PY")), ScriptType::Python);
        assert_eq!(ScriptType::from_path(Path::new("index.js")), ScriptType::JavaScript);
        assert_eq!(ScriptType::from_path(Path::new("x.lua")), ScriptType::Lua);
        assert_eq!(ScriptType::from_path(Path::new("tool")), ScriptType::Executable);
        assert_eq!(ScriptType::Python.interpreter(), Some("python3"));
        assert_eq!(ScriptType::Executable.interpreter(), None);
        assert!(!ScriptType::is_script_file(Path::new("README.md")));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_entry_receives_arguments() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("run.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > argv.txt\nprintf '%s' \"$SCRIPTDECK_ARGS\" > env.txt\n",
        )
        .unwrap();

        ProcessEntry::new(&script).run(&args()).unwrap();

        let argv = std::fs::read_to_string(temp.path().join("argv.txt")).unwrap();
        assert_eq!(argv, "message=from test\ntimes=2\n");
        let env: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(temp.path().join("env.txt")).unwrap()).unwrap();
        assert_eq!(env, serde_json::json!({ "message": "from test", "times": 2 }));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_entry_failure_carries_stderr() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("fail.sh");
        std::fs::write(&script, "echo 'input file missing' >&2\nexit 3\n").unwrap();

        let err = ProcessEntry::new(&script).run(&args()).unwrap_err();
        match err {
            InvocationError::Exit { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "input file missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_process_entry_stderr_on_success_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("warn.sh");
        std::fs::write(&script, "echo 'deprecated flag' >&2\nexit 0\n").unwrap();

        assert!(ProcessEntry::new(&script).run(&args()).is_ok());
    }

    #[test]
    fn test_process_entry_spawn_failure() {
        let entry = ProcessEntry::with_type("/definitely/not/here/tool", ScriptType::Executable);
        let err = entry.run(&args()).unwrap_err();
        assert!(matches!(err, InvocationError::Spawn { .. }));
    }
}
