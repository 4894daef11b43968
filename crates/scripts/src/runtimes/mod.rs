//! Entry point implementations.
//!
//! - In-process Rust functions ([`NativeEntry`])
//! - External interpreters and executables ([`ProcessEntry`])
//! - Lua via mlua (behind `lua` feature)

pub mod native;
pub mod process;

#[cfg(feature = "lua")]
pub mod lua;

pub use native::NativeEntry;
pub use process::{ARGS_ENV_VAR, ProcessEntry, ScriptType};

#[cfg(feature = "lua")]
pub use lua::LuaEntry;
