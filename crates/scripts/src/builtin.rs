//! Scripts compiled into the binary.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tracing::debug;

use crate::resolver::ResolvedArguments;
use crate::runtimes::NativeEntry;
use crate::runtimes::native::NativeFn;
use crate::types::{InvocationError, Manifest, ManifestError, ParamType, ParameterSpec, Script, ScriptSource};

pub const HELLO_WORLD: &str = "hello-world";
pub const PNG_TO_ICNS: &str = "png-to-icns";

/// Icon sizes required by `iconutil`, with their file names inside the iconset.
const ICONSET_SIZES: &[(u32, &str)] = &[
    (16, "icon_16x16.png"),
    (32, "icon_16x16@2x.png"),
    (32, "icon_32x32.png"),
    (64, "icon_32x32@2x.png"),
    (128, "icon_128x128.png"),
    (256, "icon_128x128@2x.png"),
    (256, "icon_256x256.png"),
    (512, "icon_256x256@2x.png"),
    (512, "icon_512x512.png"),
    (1024, "icon_512x512@2x.png"),
];

/// All built-in scripts, in listing order.
pub fn builtin_scripts() -> Result<Vec<Script>, ManifestError> {
    Ok(vec![
        native(
            HELLO_WORLD,
            Manifest::new(
                "Hello world",
                "Prints \"Hello world\" to the console",
                vec![ParameterSpec::new("input_phrase", ParamType::Str, "hello world", "Phrase to print to the console")],
            )?,
            hello_world,
        ),
        native(
            PNG_TO_ICNS,
            Manifest::new(
                "PNG to ICNS Converter",
                "Converts a PNG file to a macOS .icns icon file by generating all required icon sizes \
                 and using sips and iconutil. Requires macOS with sips and iconutil available in PATH.",
                vec![
                    ParameterSpec::new(
                        "input_png",
                        ParamType::Str,
                        "resources/logos/IconOnly_Transparent.png",
                        "Path to the source PNG file.",
                    ),
                    ParameterSpec::new(
                        "output_folder",
                        ParamType::Str,
                        "macos-app-icon",
                        "Folder to store the iconset and ICNS file.",
                    ),
                    ParameterSpec::new(
                        "output_icns",
                        ParamType::Str,
                        "IconOnly_Transparent.icns",
                        "Name of the output ICNS file (will be placed in output_folder).",
                    ),
                ],
            )?,
            png_to_icns,
        ),
    ])
}

fn native(id: &'static str, manifest: Manifest, func: NativeFn) -> Script {
    Script::new(id, manifest, ScriptSource::Builtin, Arc::new(NativeEntry::new(id, func)))
}

fn hello_world(args: &ResolvedArguments) -> Result<(), InvocationError> {
    println!("{}", args.get_str("input_phrase")?);
    Ok(())
}

fn png_to_icns(args: &ResolvedArguments) -> Result<(), InvocationError> {
    let input_png = args.get_str("input_png")?;
    let output_folder = Path::new(args.get_str("output_folder")?);
    let iconset_dir = output_folder.join("iconset.iconset");
    let icns_path = icns_output_path(args)?;

    if !Path::new(input_png).is_file() {
        return Err(InvocationError::Failed(format!("input PNG not found: {input_png}")));
    }

    println!("Input PNG: {input_png}");
    println!("Iconset directory: {}", iconset_dir.display());
    println!("ICNS output path: {}", icns_path.display());

    fs::create_dir_all(&iconset_dir)
        .map_err(|e| InvocationError::Failed(format!("failed to create {}: {e}", iconset_dir.display())))?;

    for (size, file_name) in ICONSET_SIZES {
        let out_path = iconset_dir.join(file_name);
        println!("Creating {} ({size}x{size})", out_path.display());
        let size = size.to_string();
        run_tool(
            "sips",
            &[OsStr::new("-z"), OsStr::new(&size), OsStr::new(&size), OsStr::new(input_png), OsStr::new("--out"), out_path.as_os_str()],
        )?;
    }

    println!("Running iconutil to create {}", icns_path.display());
    run_tool(
        "iconutil",
        &[OsStr::new("-c"), OsStr::new("icns"), iconset_dir.as_os_str(), OsStr::new("-o"), icns_path.as_os_str()],
    )?;
    println!("ICNS icon created at {}", icns_path.display());
    Ok(())
}

fn run_tool(program: &str, args: &[&OsStr]) -> Result<(), InvocationError> {
    debug!(program, ?args, "running tool");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| InvocationError::Spawn { program: program.to_string(), source })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(InvocationError::Exit {
            code: output.status.code(),
            stderr: format!("{program}: {}", String::from_utf8_lossy(&output.stderr).trim()),
        })
    }
}

/// Where the png-to-icns script writes its result.
pub fn icns_output_path(args: &ResolvedArguments) -> Result<PathBuf, InvocationError> {
    Ok(Path::new(args.get_str("output_folder")?).join(args.get_str("output_icns")?))
}
