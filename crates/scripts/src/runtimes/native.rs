//! Scripts implemented as Rust functions.

use std::fmt;

use crate::invoker::ScriptEntry;
use crate::resolver::ResolvedArguments;
use crate::types::InvocationError;

/// Signature of an in-process entry point.
pub type NativeFn = fn(&ResolvedArguments) -> Result<(), InvocationError>;

/// Entry point backed by a plain function.
#[derive(Clone, Copy)]
pub struct NativeEntry {
    name: &'static str,
    func: NativeFn,
}

impl NativeEntry {
    pub fn new(name: &'static str, func: NativeFn) -> Self {
        Self { name, func }
    }
}

impl fmt::Debug for NativeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeEntry").field("name", &self.name).finish()
    }
}

impl ScriptEntry for NativeEntry {
    fn kind(&self) -> &'static str {
        "native"
    }

    fn run(&self, args: &ResolvedArguments) -> Result<(), InvocationError> {
        (self.func)(args)
    }
}
