//! Argument resolution: merge caller overrides with manifest defaults.
//!
//! Every declared parameter ends up with exactly one value of its declared
//! type. String overrides are coerced; unknown override keys are dropped.
//! Resolution collects every coercion failure before failing, so a caller
//! sees all bad arguments at once.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{ArgumentAccessError, ArgumentTypeError, Manifest, ParamType, ParamValue, ParameterSpec, ResolveError};

/// Fully populated, type-correct parameter set, in manifest order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedArguments {
    values: Vec<(String, ParamValue)>,
}

impl ResolvedArguments {
    /// Value of `name`, if the manifest declares it.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn require(&self, name: &str) -> Result<&ParamValue, ArgumentAccessError> {
        self.get(name).ok_or_else(|| ArgumentAccessError::Missing(name.to_string()))
    }

    fn wrong_type(name: &str, expected: ParamType, actual: &ParamValue) -> ArgumentAccessError {
        ArgumentAccessError::WrongType { name: name.to_string(), expected, actual: actual.param_type() }
    }

    /// String value of `name`; fails when absent or not a `str` parameter.
    pub fn get_str(&self, name: &str) -> Result<&str, ArgumentAccessError> {
        match self.require(name)? {
            ParamValue::Str(s) => Ok(s),
            other => Err(Self::wrong_type(name, ParamType::Str, other)),
        }
    }

    /// Integer value of `name`.
    pub fn get_int(&self, name: &str) -> Result<i64, ArgumentAccessError> {
        match self.require(name)? {
            ParamValue::Int(i) => Ok(*i),
            other => Err(Self::wrong_type(name, ParamType::Int, other)),
        }
    }

    /// Float value of `name`.
    pub fn get_float(&self, name: &str) -> Result<f64, ArgumentAccessError> {
        match self.require(name)? {
            ParamValue::Float(f) => Ok(*f),
            other => Err(Self::wrong_type(name, ParamType::Float, other)),
        }
    }

    /// Boolean value of `name`.
    pub fn get_bool(&self, name: &str) -> Result<bool, ArgumentAccessError> {
        match self.require(name)? {
            ParamValue::Bool(b) => Ok(*b),
            other => Err(Self::wrong_type(name, ParamType::Bool, other)),
        }
    }

    /// `(name, value)` pairs in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `key=value` tokens, the command-line form scripts accept.
    pub fn to_cli_tokens(&self) -> Vec<String> {
        self.values.iter().map(|(n, v)| format!("{n}={v}")).collect()
    }

    /// JSON object keyed by parameter name.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self.values.iter().map(|(n, v)| (n.clone(), v.to_json())).collect();
        Value::Object(map)
    }
}

impl Serialize for ResolvedArguments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Resolve `overrides` against the manifest.
///
/// Fails with every [`ArgumentTypeError`] found; on success every manifest
/// parameter has exactly one value of its declared type.
pub fn resolve(manifest: &Manifest, overrides: &HashMap<String, ParamValue>) -> Result<ResolvedArguments, ResolveError> {
    let mut values = Vec::with_capacity(manifest.parameters.len());
    let mut errors = Vec::new();

    for spec in &manifest.parameters {
        match overrides.get(&spec.name) {
            None => values.push((spec.name.clone(), spec.default.clone())),
            Some(value) => match coerce(spec, value) {
                Ok(v) => values.push((spec.name.clone(), v)),
                Err(e) => errors.push(e),
            },
        }
    }

    for key in overrides.keys().filter(|k| manifest.parameter(k).is_none()) {
        debug!(key = %key, script = %manifest.title, "ignoring unknown argument");
    }

    if errors.is_empty() { Ok(ResolvedArguments { values }) } else { Err(ResolveError { errors }) }
}

/// Coerce one override to the declared type of `spec`.
pub fn coerce(spec: &ParameterSpec, value: &ParamValue) -> Result<ParamValue, ArgumentTypeError> {
    let fail = || ArgumentTypeError { name: spec.name.clone(), value: value.to_string(), expected: spec.param_type };

    match (spec.param_type, value) {
        (_, ParamValue::Float(f)) if !f.is_finite() => Err(fail()),
        (ty, v) if v.param_type() == ty => Ok(v.clone()),
        (ParamType::Str, v) => Ok(ParamValue::Str(v.to_string())),
        (ParamType::Float, ParamValue::Int(i)) => Ok(ParamValue::Float(*i as f64)),
        (ParamType::Int, ParamValue::Str(s)) => s.trim().parse::<i64>().map(ParamValue::Int).map_err(|_| fail()),
        (ParamType::Float, ParamValue::Str(s)) => {
            s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(ParamValue::Float).ok_or_else(fail)
        }
        (ParamType::Bool, ParamValue::Str(s)) => parse_bool(s).map(ParamValue::Bool).ok_or_else(fail),
        _ => Err(fail()),
    }
}

/// `true`/`1`/`yes` and `false`/`0`/`no`, case-insensitive.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Parse `key=value` command-line tokens into string overrides.
///
/// Splits on the first `=`; tokens without one are ignored.
pub fn parse_cli_overrides<I, S>(tokens: I) -> HashMap<String, ParamValue>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .filter_map(|token| {
            let (key, value) = token.as_ref().split_once('=')?;
            Some((key.to_string(), ParamValue::Str(value.to_string())))
        })
        .collect()
}
