//! Script invocation.
//!
//! A script's entry point receives fully resolved arguments and either
//! completes or fails. Failures and panics never escape [`invoke`]; they are
//! reported as a failed [`InvocationResult`].

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use scriptdeck_core::logging::truncate_for_log;
use serde::Serialize;
use tracing::{error, info};

use crate::resolver::{ResolvedArguments, resolve};
use crate::types::{InvocationError, ParamValue, ResolveError, Script};

/// Maximum characters of a failure message written to the log.
const LOG_MESSAGE_LIMIT: usize = 500;

/// Entry point of a script.
///
/// Implemented by native functions, external processes and Lua chunks.
pub trait ScriptEntry: fmt::Debug + Send + Sync {
    /// Short label for the entry kind, e.g. `native` or `process`
    fn kind(&self) -> &'static str;

    /// Run with a complete, type-correct argument set.
    fn run(&self, args: &ResolvedArguments) -> Result<(), InvocationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Success,
    Failure,
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResult {
    pub status: InvocationStatus,

    /// Human-readable summary or error text
    pub message: String,

    #[serde(skip)]
    pub duration: Duration,
}

impl InvocationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self { status: InvocationStatus::Success, message: message.into(), duration: Duration::ZERO }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { status: InvocationStatus::Failure, message: message.into(), duration: Duration::ZERO }
    }

    pub fn is_success(&self) -> bool {
        self.status == InvocationStatus::Success
    }

    fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Run `script` with already resolved arguments.
pub fn invoke(script: &Script, args: &ResolvedArguments) -> InvocationResult {
    let title = &script.manifest.title;
    info!(script = %script.id, entry = script.entry().kind(), args = args.len(), "invoking script");

    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| script.entry().run(args)));
    let elapsed = started.elapsed();

    let result = match outcome {
        Ok(Ok(())) => {
            info!(script = %script.id, duration_ms = elapsed.as_millis() as u64, "script completed");
            InvocationResult::success(format!("'{title}' completed successfully"))
        }
        Ok(Err(err)) => {
            let message = err.to_string();
            error!(
                script = %script.id,
                duration_ms = elapsed.as_millis() as u64,
                error = %truncate_for_log(&message, LOG_MESSAGE_LIMIT),
                "script failed"
            );
            InvocationResult::failure(message)
        }
        Err(payload) => {
            let message = InvocationError::Panicked(panic_message(payload.as_ref())).to_string();
            error!(script = %script.id, error = %truncate_for_log(&message, LOG_MESSAGE_LIMIT), "script panicked");
            InvocationResult::failure(message)
        }
    };

    result.with_duration(elapsed)
}

/// Resolve `overrides` against the script's manifest, then invoke it.
///
/// Argument errors are returned before the entry point is touched.
pub fn run_script(script: &Script, overrides: &HashMap<String, ParamValue>) -> Result<InvocationResult, ResolveError> {
    let args = resolve(&script.manifest, overrides)?;
    Ok(invoke(script, &args))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
