//! ScriptDeck scripts
//!
//! Scripts are directories holding a `SCRIPT.md` manifest and an entry file,
//! discovered under the monitored paths of the configuration store. Each run
//! resolves caller overrides against the manifest and hands the typed result
//! to the entry point.

pub mod builtin;
pub mod invoker;
mod loader;
mod parser;
pub mod resolver;
pub mod runtimes;
mod types;

pub use invoker::{InvocationResult, InvocationStatus, ScriptEntry, invoke, run_script};
pub use loader::{DiscoveryOptions, ScriptCatalog, expand_home};
pub use parser::{MANIFEST_FILE, parse_manifest_str, parse_script};
pub use resolver::{ResolvedArguments, parse_cli_overrides, resolve};
pub use runtimes::{NativeEntry, ProcessEntry, ScriptType};
pub use types::{
    ArgumentAccessError, ArgumentTypeError, InvocationError, Manifest, ManifestError, ParamType, ParamValue,
    ParameterSpec, ResolveError, Result, Script, ScriptError, ScriptSource,
};
