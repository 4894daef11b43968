//! Lua entry points using mlua.
//!
//! Each run loads the file into a fresh state with a restricted standard
//! library and calls its global `main(args)`.

use std::path::{Path, PathBuf};

use mlua::{Function as LuaFunction, Lua, LuaOptions, StdLib, Table, Value as LuaValue};

use crate::invoker::ScriptEntry;
use crate::resolver::ResolvedArguments;
use crate::types::{InvocationError, ParamValue};

/// Global function every Lua script must define.
pub const LUA_MAIN: &str = "main";

#[derive(Debug, Clone)]
pub struct LuaEntry {
    path: PathBuf,
}

impl LuaEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn new_state(&self) -> mlua::Result<Lua> {
        let lua = Lua::new_with(StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8, LuaOptions::default())?;

        let globals = lua.globals();
        for key in ["dofile", "loadfile", "load", "require", "package", "debug"] {
            globals.set(key, LuaValue::Nil)?;
        }

        let scriptdeck = lua.create_table()?;
        let script = self.path.display().to_string();
        scriptdeck.set(
            "log",
            lua.create_function(move |_, (level, msg): (String, String)| {
                match level.to_lowercase().as_str() {
                    "error" => tracing::error!(target: "script", script = %script, "{}", msg),
                    "warn" | "warning" => tracing::warn!(target: "script", script = %script, "{}", msg),
                    "debug" => tracing::debug!(target: "script", script = %script, "{}", msg),
                    _ => tracing::info!(target: "script", script = %script, "{}", msg),
                }
                Ok(())
            })?,
        )?;
        globals.set("scriptdeck", scriptdeck)?;

        Ok(lua)
    }

    fn args_table(lua: &Lua, args: &ResolvedArguments) -> mlua::Result<Table> {
        let table = lua.create_table()?;
        for (name, value) in args.iter() {
            match value {
                ParamValue::Str(s) => table.set(name, s.as_str())?,
                ParamValue::Int(i) => table.set(name, *i)?,
                ParamValue::Float(f) => table.set(name, *f)?,
                ParamValue::Bool(b) => table.set(name, *b)?,
            }
        }
        Ok(table)
    }
}

impl ScriptEntry for LuaEntry {
    fn kind(&self) -> &'static str {
        "lua"
    }

    fn run(&self, args: &ResolvedArguments) -> Result<(), InvocationError> {
        let source = std::fs::read_to_string(&self.path)
            .map_err(|e| InvocationError::Runtime(format!("failed to read {}: {e}", self.path.display())))?;

        let lua = self.new_state().map_err(map_lua_error)?;
        lua.load(&source)
            .set_name(self.path.display().to_string())
            .exec()
            .map_err(map_lua_error)?;

        let main: LuaFunction = lua
            .globals()
            .get(LUA_MAIN)
            .map_err(|_| InvocationError::Runtime(format!("{} does not define {LUA_MAIN}(args)", self.path.display())))?;

        let table = Self::args_table(&lua, args).map_err(map_lua_error)?;
        main.call::<()>(table).map_err(map_lua_error)
    }
}

fn map_lua_error(err: mlua::Error) -> InvocationError {
    InvocationError::Runtime(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::types::{Manifest, ParamType, ParameterSpec};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn args() -> ResolvedArguments {
        let manifest = Manifest::new(
            "Lua",
            "",
            vec![
                ParameterSpec::new("name", ParamType::Str, "deck", ""),
                ParameterSpec::new("count", ParamType::Int, 2_i64, ""),
            ],
        )
        .unwrap();
        resolve(&manifest, &HashMap::new()).unwrap()
    }

    #[test]
    fn test_lua_main_receives_args() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("main.lua");
        std::fs::write(
            &path,
            r#"
function main(args)
    if args.name ~= "deck" or args.count ~= 2 then
        error("unexpected args")
    end
    scriptdeck.log("info", "ok")
end
"#,
        )
        .unwrap();

        LuaEntry::new(&path).run(&args()).unwrap();
    }

    #[test]
    fn test_lua_error_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("main.lua");
        std::fs::write(&path, "function main(args) error('bad input') end").unwrap();

        let err = LuaEntry::new(&path).run(&args()).unwrap_err();
        assert!(err.to_string().contains("bad input"));
    }

    #[test]
    fn test_lua_missing_main() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("main.lua");
        std::fs::write(&path, "local x = 1").unwrap();

        let err = LuaEntry::new(&path).run(&args()).unwrap_err();
        assert!(err.to_string().contains("does not define main"));
    }

    #[test]
    fn test_lua_sandbox_hides_require() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("main.lua");
        std::fs::write(&path, "function main(args) require('os') end").unwrap();

        assert!(LuaEntry::new(&path).run(&args()).is_err());
    }
}
