//! Core types for scripts: manifests, typed parameter values and errors.
//!
//! A script declares its parameters in a manifest. Each parameter has a
//! declared [`ParamType`] and a default [`ParamValue`] of that type.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::invoker::ScriptEntry;

/// Declared type of a script parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[serde(rename = "str")]
    Str,
    Int,
    Float,
    Bool,
}

impl ParamType {
    pub const VALUES: &[ParamType] = &[ParamType::Str, ParamType::Int, ParamType::Float, ParamType::Bool];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Str => "str",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "bool",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "str" => Ok(ParamType::Str),
            "int" => Ok(ParamType::Int),
            "float" => Ok(ParamType::Float),
            "bool" => Ok(ParamType::Bool),
            _ => Err(format!("unknown parameter type: {s} (must be str, int, float, or bool)")),
        }
    }
}

/// A parameter value tagged with its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Str(_) => ParamType::Str,
            ParamValue::Int(_) => ParamType::Int,
            ParamValue::Float(_) => ParamType::Float,
            ParamValue::Bool(_) => ParamType::Bool,
        }
    }

    /// Value used when a manifest omits a default.
    pub fn zero(ty: ParamType) -> Self {
        match ty {
            ParamType::Str => ParamValue::Str(String::new()),
            ParamType::Int => ParamValue::Int(0),
            ParamType::Float => ParamValue::Float(0.0),
            ParamType::Bool => ParamValue::Bool(false),
        }
    }

    /// Read a JSON value as `ty`.
    ///
    /// Integers widen to `float`; scalars are rendered as text for `str`.
    pub fn from_json(ty: ParamType, value: &Value) -> Option<Self> {
        match (ty, value) {
            (ParamType::Str, Value::String(s)) => Some(ParamValue::Str(s.clone())),
            (ParamType::Str, Value::Number(n)) => Some(ParamValue::Str(n.to_string())),
            (ParamType::Str, Value::Bool(b)) => Some(ParamValue::Str(b.to_string())),
            (ParamType::Int, Value::Number(n)) => n.as_i64().map(ParamValue::Int),
            (ParamType::Float, Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).map(ParamValue::Float),
            (ParamType::Bool, Value::Bool(b)) => Some(ParamValue::Bool(*b)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Str(s) => Value::String(s.clone()),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Float(f) => Value::from(*f),
            ParamValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => write!(f, "{s}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Float(f)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

/// One declared parameter of a script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Always of `param_type`
    pub default: ParamValue,

    pub description: String,
}

impl ParameterSpec {
    pub fn new(
        name: impl Into<String>, param_type: ParamType, default: impl Into<ParamValue>, description: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), param_type, default: default.into(), description: description.into() }
    }
}

/// Static declaration of a script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub title: String,

    pub description: String,

    /// Display order
    #[serde(rename = "arguments")]
    pub parameters: Vec<ParameterSpec>,
}

impl Manifest {
    /// Build a manifest, rejecting duplicate names and mistyped defaults.
    pub fn new(
        title: impl Into<String>, description: impl Into<String>, parameters: Vec<ParameterSpec>,
    ) -> std::result::Result<Self, ManifestError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ManifestError::MissingTitle);
        }

        for (index, spec) in parameters.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(ManifestError::MissingName { index });
            }
            if parameters[..index].iter().any(|p| p.name == spec.name) {
                return Err(ManifestError::DuplicateName(spec.name.clone()));
            }
            if spec.default.param_type() != spec.param_type {
                return Err(ManifestError::DefaultMismatch {
                    name: spec.name.clone(),
                    expected: spec.param_type,
                    value: spec.default.to_string(),
                });
            }
        }

        Ok(Self { title, description: description.into(), parameters })
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Where a script came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Compiled into the binary
    Builtin,
    /// A directory holding `SCRIPT.md` and the entry file
    Directory(PathBuf),
}

/// A discovered script, ready to be resolved and invoked.
#[derive(Debug, Clone)]
pub struct Script {
    /// Lookup name: directory name or built-in id
    pub id: String,

    pub manifest: Manifest,

    pub source: ScriptSource,

    /// Markdown body of `SCRIPT.md`
    pub help: String,

    pub(crate) entry: Arc<dyn ScriptEntry>,
}

impl Script {
    pub fn new(id: impl Into<String>, manifest: Manifest, source: ScriptSource, entry: Arc<dyn ScriptEntry>) -> Self {
        Self { id: id.into(), manifest, source, help: String::new(), entry }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn entry(&self) -> &dyn ScriptEntry {
        self.entry.as_ref()
    }

    /// Stable string recorded in the recent-scripts list.
    pub fn location(&self) -> String {
        match &self.source {
            ScriptSource::Builtin => format!("builtin:{}", self.id),
            ScriptSource::Directory(dir) => dir.display().to_string(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.source, ScriptSource::Builtin)
    }
}

/// A manifest that cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest not found: {0}")]
    NotFound(String),

    #[error("invalid SCRIPT.md frontmatter: {0}")]
    InvalidFrontmatter(String),

    #[error("title is required")]
    MissingTitle,

    #[error("argument #{} is missing a name", .index + 1)]
    MissingName { index: usize },

    #[error("argument '{name}' is missing a type")]
    MissingType { name: String },

    #[error("argument '{name}' has unknown type '{value}' (must be str, int, float, or bool)")]
    UnknownType { name: String, value: String },

    #[error("duplicate argument name: {0}")]
    DuplicateName(String),

    #[error("argument '{name}': default {value} is not a valid {expected}")]
    DefaultMismatch { name: String, expected: ParamType, value: String },

    #[error("no entry point: {0}")]
    MissingEntry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A caller-supplied value that cannot be coerced to the declared type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("argument '{name}': cannot convert '{value}' to {expected}")]
pub struct ArgumentTypeError {
    pub name: String,
    pub value: String,
    pub expected: ParamType,
}

/// Every coercion failure of one resolution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", .errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ResolveError {
    pub errors: Vec<ArgumentTypeError>,
}

/// Typed access to a resolved argument failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgumentAccessError {
    #[error("no argument named '{0}'")]
    Missing(String),

    #[error("argument '{name}' is {actual}, not {expected}")]
    WrongType { name: String, expected: ParamType, actual: ParamType },
}

/// A script entry point failed while running.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("{0}")]
    Failed(String),

    #[error("script panicked: {0}")]
    Panicked(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", exit_message(.code, .stderr))]
    Exit { code: Option<i32>, stderr: String },

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Argument(#[from] ArgumentAccessError),
}

fn exit_message(code: &Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_string(),
    };
    let stderr = stderr.trim();
    if stderr.is_empty() { status } else { format!("{stderr} ({status})") }
}

/// Errors from the scripts crate.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("script not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;

impl From<ScriptError> for scriptdeck_core::Error {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::Manifest(e) => scriptdeck_core::Error::Manifest(e.to_string()),
            ScriptError::Resolve(e) => scriptdeck_core::Error::Argument(e.to_string()),
            ScriptError::Io(e) => scriptdeck_core::Error::Io(e),
            other => scriptdeck_core::Error::Other(other.to_string()),
        }
    }
}

impl From<InvocationError> for scriptdeck_core::Error {
    fn from(err: InvocationError) -> Self {
        scriptdeck_core::Error::Invocation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_type_from_str() {
        assert_eq!("str".parse::<ParamType>().unwrap(), ParamType::Str);
        assert_eq!("INT".parse::<ParamType>().unwrap(), ParamType::Int);
        assert_eq!(" float ".parse::<ParamType>().unwrap(), ParamType::Float);
        assert_eq!("bool".parse::<ParamType>().unwrap(), ParamType::Bool);
        assert!("list".parse::<ParamType>().is_err());
    }

    #[test]
    fn test_param_type_serde_names() {
        for ty in ParamType::VALUES {
            assert_eq!(serde_json::to_value(ty).unwrap(), json!(ty.as_str()));
        }
    }

    #[test]
    fn test_param_value_from_json() {
        assert_eq!(ParamValue::from_json(ParamType::Int, &json!(3)), Some(ParamValue::Int(3)));
        assert_eq!(ParamValue::from_json(ParamType::Float, &json!(3)), Some(ParamValue::Float(3.0)));
        assert_eq!(ParamValue::from_json(ParamType::Str, &json!(3)), Some(ParamValue::Str("3".into())));
        assert_eq!(ParamValue::from_json(ParamType::Int, &json!(2.5)), None);
        assert_eq!(ParamValue::from_json(ParamType::Bool, &json!("true")), None);
    }

    #[test]
    fn test_float_display() {
        assert_eq!(ParamValue::Float(2.0).to_string(), "2.0");
        assert_eq!(ParamValue::Float(-3.0).to_string(), "-3.0");
        assert_eq!(ParamValue::Float(0.5).to_string(), "0.5");
        assert_eq!(ParamValue::Int(2).to_string(), "2");
    }

    #[test]
    fn test_param_value_serializes_as_plain_json() {
        assert_eq!(serde_json::to_value(ParamValue::Int(4)).unwrap(), json!(4));
        assert_eq!(serde_json::to_value(ParamValue::from("x")).unwrap(), json!("x"));
        assert_eq!(ParamValue::Bool(true).to_json(), json!(true));
    }

    #[test]
    fn test_manifest_validation() {
        let ok = Manifest::new("T", "", vec![ParameterSpec::new("a", ParamType::Int, 1_i64, "")]);
        assert!(ok.is_ok());

        let dup = Manifest::new(
            "T",
            "",
            vec![
                ParameterSpec::new("a", ParamType::Int, 1_i64, ""),
                ParameterSpec::new("a", ParamType::Str, "x", ""),
            ],
        );
        assert!(matches!(dup, Err(ManifestError::DuplicateName(name)) if name == "a"));

        let mismatch = Manifest::new("T", "", vec![ParameterSpec::new("a", ParamType::Int, "x", "")]);
        assert!(matches!(mismatch, Err(ManifestError::DefaultMismatch { .. })));

        let unnamed = Manifest::new("T", "", vec![ParameterSpec::new("", ParamType::Int, 1_i64, "")]);
        assert_eq!(unnamed.unwrap_err().to_string(), "argument #1 is missing a name");

        assert!(matches!(Manifest::new(" ", "", vec![]), Err(ManifestError::MissingTitle)));
    }

    #[test]
    fn test_invocation_error_display() {
        let err = InvocationError::Exit { code: Some(2), stderr: "no such file\n".into() };
        assert_eq!(err.to_string(), "no such file (exited with status 2)");

        let err = InvocationError::Exit { code: None, stderr: String::new() };
        assert_eq!(err.to_string(), "terminated by signal");
    }

    #[test]
    fn test_resolve_error_lists_all() {
        let err = ResolveError {
            errors: vec![
                ArgumentTypeError { name: "a".into(), value: "x".into(), expected: ParamType::Int },
                ArgumentTypeError { name: "b".into(), value: "y".into(), expected: ParamType::Bool },
            ],
        };
        assert_eq!(
            err.to_string(),
            "argument 'a': cannot convert 'x' to int; argument 'b': cannot convert 'y' to bool"
        );
    }

    #[test]
    fn test_script_error_into_core_error() {
        let err: scriptdeck_core::Error = ScriptError::Manifest(ManifestError::MissingTitle).into();
        assert!(matches!(err, scriptdeck_core::Error::Manifest(_)));

        let err: scriptdeck_core::Error = ScriptError::NotFound("nope".into()).into();
        assert_eq!(err.to_string(), "script not found: nope");
    }
}
