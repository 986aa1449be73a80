//! Build script generation for the external executor.
//!
//! The emitted `build.ninja` captures everything the external executor
//! needs: stub generation from the .api files, compilation of component
//! sources and generated code, the library link, and a regeneration edge
//! that re-runs the original command line when the script is out of date.
//!
//! Emission is deterministic: inputs come from the model in declaration
//! order or from sorted sets, never from hash-map iteration.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::build::params::BuildParams;
use crate::model::{ApiRegistry, Component, MANIFEST_NAME};
use crate::util::fs;

/// Generate `build.ninja` for a component.
///
/// `argv` is the full command line of this invocation; it is baked into
/// the script's regeneration rule. Returns the written path.
pub fn generate(
    component: &Component,
    registry: &ApiRegistry,
    params: &BuildParams,
    argv: &[String],
) -> Result<PathBuf> {
    let script_path = params.script_path();

    tracing::debug!(
        "generating build script for component '{}' in '{}'",
        component.name(),
        script_path.display()
    );

    let contents = render(component, registry, params, argv)?;
    fs::write_string(&script_path, &contents)?;
    Ok(script_path)
}

fn render(
    component: &Component,
    registry: &ApiRegistry,
    params: &BuildParams,
    argv: &[String],
) -> Result<String> {
    let mut out = String::new();
    let work = &params.object_dir;
    let comp_work = work.join(component.working_dir());
    let src_gen_dir = comp_work.join("src");

    // The executor runs from the invocation directory, so canonical input
    // paths can be written relative to it; everything under the object
    // directory is already relative.
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let input = |path: &Path| escape_path(&fs::relative_path(&cwd, path));

    let cc = std::env::var("CC").unwrap_or_else(|_| "gcc".to_string());
    let cxx = std::env::var("CXX").unwrap_or_else(|_| "g++".to_string());

    writeln!(
        out,
        "# AUTO-GENERATED ninja build script for the {} component.",
        component.name()
    )
    .unwrap();
    writeln!(out, "# Don't bother hand-editing this file.").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "builddir = {}", escape_path(work)).unwrap();
    writeln!(out, "cc = {}", cc).unwrap();
    writeln!(out, "cxx = {}", cxx).unwrap();
    writeln!(out, "target = {}", params.target).unwrap();
    writeln!(out, "cflags ={}", params.cflags).unwrap();
    writeln!(out, "cxxflags ={}", params.cxxflags).unwrap();
    writeln!(out, "ldflags ={}", params.ldflags).unwrap();
    writeln!(out, "includes = {}", include_flags(component, registry, params)).unwrap();
    writeln!(out).unwrap();

    // Rules.
    writeln!(out, "rule cc").unwrap();
    writeln!(out, "  description = Compiling $in").unwrap();
    writeln!(out, "  depfile = $out.d").unwrap();
    writeln!(out, "  deps = gcc").unwrap();
    writeln!(
        out,
        "  command = $cc -MMD -MF $out.d $cflags $includes -c $in -o $out"
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "rule cxx").unwrap();
    writeln!(out, "  description = Compiling $in").unwrap();
    writeln!(out, "  depfile = $out.d").unwrap();
    writeln!(out, "  deps = gcc").unwrap();
    writeln!(
        out,
        "  command = $cxx -MMD -MF $out.d $cxxflags $includes -c $in -o $out"
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "rule shlib").unwrap();
    writeln!(out, "  description = Linking $out").unwrap();
    writeln!(out, "  command = $linker -shared -fPIC -o $out $in $ldflags").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "rule exe").unwrap();
    writeln!(out, "  description = Linking $out").unwrap();
    writeln!(out, "  command = $linker -o $out $in $ldflags").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "rule apigenClient").unwrap();
    writeln!(out, "  description = Generating client IPC code for $name").unwrap();
    writeln!(
        out,
        "  command = apigen client --target $target --name $name --output-dir $outdir $in"
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "rule apigenServer").unwrap();
    writeln!(out, "  description = Generating server IPC code for $name").unwrap();
    writeln!(
        out,
        "  command = apigen server $asyncflag --target $target --name $name --output-dir $outdir $in"
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "rule apigenTypes").unwrap();
    writeln!(out, "  description = Generating type definitions for $name").unwrap();
    writeln!(
        out,
        "  command = apigen interface --target $target --name $name --output-dir $outdir $in"
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "rule regen").unwrap();
    writeln!(out, "  description = Regenerating build script").unwrap();
    writeln!(out, "  generator = 1").unwrap();
    writeln!(out, "  command = {}", regen_command(argv)).unwrap();
    writeln!(out).unwrap();

    // Stub generation edges.
    let mut objects: Vec<PathBuf> = Vec::new();

    for types_only in component.types_only() {
        let api = registry.file(types_only.api);
        let header = work.join(&types_only.interface_file);
        writeln!(
            out,
            "build {}: apigenTypes {}",
            escape_path(&header),
            input(api.path())
        )
        .unwrap();
        writeln!(out, "  name = {}", types_only.internal_name).unwrap();
        writeln!(
            out,
            "  outdir = {}",
            escape_path(header.parent().unwrap_or(work))
        )
        .unwrap();
    }

    for client in component.clients() {
        let api = registry.file(client.api);
        let header = work.join(&client.interface_file);
        let local = work.join(&client.internal_header);
        let source = work.join(&client.source_file);

        let mut usetypes = BTreeSet::new();
        registry.client_usetypes_headers(client.api, &mut usetypes);
        let implicit = header_list(&usetypes, work);

        writeln!(
            out,
            "build {} {} {}: apigenClient {}{}",
            escape_path(&header),
            escape_path(&local),
            escape_path(&source),
            input(api.path()),
            implicit
        )
        .unwrap();
        writeln!(out, "  name = {}", client.internal_name).unwrap();
        writeln!(
            out,
            "  outdir = {}",
            escape_path(header.parent().unwrap_or(work))
        )
        .unwrap();

        let object = work.join(&client.object_file);
        writeln!(
            out,
            "build {}: cc {}",
            escape_path(&object),
            escape_path(&source)
        )
        .unwrap();
        objects.push(object);
    }

    for server in component.servers() {
        let api = registry.file(server.api);
        let header = work.join(&server.interface_file);
        let local = work.join(&server.internal_header);
        let source = work.join(&server.source_file);

        let mut usetypes = BTreeSet::new();
        registry.server_usetypes_headers(server.api, &mut usetypes);
        let implicit = header_list(&usetypes, work);

        writeln!(
            out,
            "build {} {} {}: apigenServer {}{}",
            escape_path(&header),
            escape_path(&local),
            escape_path(&source),
            input(api.path()),
            implicit
        )
        .unwrap();
        writeln!(out, "  name = {}", server.internal_name).unwrap();
        writeln!(
            out,
            "  asyncflag = {}",
            if server.async_mode { "--async" } else { "" }
        )
        .unwrap();
        writeln!(
            out,
            "  outdir = {}",
            escape_path(header.parent().unwrap_or(work))
        )
        .unwrap();

        let object = work.join(&server.object_file);
        writeln!(
            out,
            "build {}: cc {}",
            escape_path(&object),
            escape_path(&source)
        )
        .unwrap();
        objects.push(object);
    }

    // Type headers for the .api files pulled in via USETYPES.
    for (_, id) in registry.all() {
        let api = registry.file(id);
        if !api.is_included() {
            continue;
        }
        let header = work.join(api.client_interface_file(api.default_prefix()));
        writeln!(
            out,
            "build {}: apigenTypes {}",
            escape_path(&header),
            input(api.path())
        )
        .unwrap();
        writeln!(out, "  name = {}", api.default_prefix()).unwrap();
        writeln!(
            out,
            "  outdir = {}",
            escape_path(header.parent().unwrap_or(work))
        )
        .unwrap();
    }
    writeln!(out).unwrap();

    // Component sources.
    let interfaces_header = src_gen_dir.join("interfaces.h");
    let sources = fs::glob_files(component.dir(), component.sources())?;
    let mut use_cxx_linker = false;

    for source in &sources {
        let rel = source.strip_prefix(component.dir()).unwrap_or(source);
        let object = comp_work.join("obj").join(rel.with_extension("o"));
        let rule = if is_cpp_source(source) {
            use_cxx_linker = true;
            "cxx"
        } else {
            "cc"
        };

        writeln!(
            out,
            "build {}: {} {} | {}",
            escape_path(&object),
            rule,
            escape_path(source),
            escape_path(&interfaces_header)
        )
        .unwrap();
        objects.push(object);
    }

    // Bootstrap shims.
    let component_main_obj = comp_work.join("obj").join("_componentMain.o");
    writeln!(
        out,
        "build {}: cc {} | {}",
        escape_path(&component_main_obj),
        escape_path(&src_gen_dir.join("_componentMain.c")),
        escape_path(&interfaces_header)
    )
    .unwrap();
    objects.push(component_main_obj);
    writeln!(out).unwrap();

    // The component library.
    let object_list: Vec<String> = objects.iter().map(|o| escape_path(o)).collect();
    writeln!(
        out,
        "build {}: shlib {}",
        escape_path(component.lib()),
        object_list.join(" ")
    )
    .unwrap();
    writeln!(
        out,
        "  linker = {}",
        if use_cxx_linker { "$cxx" } else { "$cc" }
    )
    .unwrap();

    // Stand-alone mode additionally links a runnable executable.
    if params.stand_alone {
        let main_obj = comp_work.join("obj").join("_main.o");
        writeln!(
            out,
            "build {}: cc {}",
            escape_path(&main_obj),
            escape_path(&src_gen_dir.join("_main.c"))
        )
        .unwrap();

        let exe = comp_work.join("bin").join(component.name());
        writeln!(
            out,
            "build {}: exe {} {}",
            escape_path(&exe),
            escape_path(&main_obj),
            escape_path(component.lib())
        )
        .unwrap();
        writeln!(
            out,
            "  linker = {}",
            if use_cxx_linker { "$cxx" } else { "$cc" }
        )
        .unwrap();
    }
    writeln!(out).unwrap();

    // Regenerate the script when the inputs that shaped it change.
    let mut regen_deps = vec![component.dir().join(MANIFEST_NAME)];
    regen_deps.extend(registry.all().map(|(path, _)| path.to_path_buf()));
    let dep_list: Vec<String> = regen_deps.iter().map(|d| input(d)).collect();

    writeln!(
        out,
        "build {}: regen | {}",
        escape_path(&params.script_path()),
        dep_list.join(" ")
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "default {}", escape_path(component.lib())).unwrap();

    Ok(out)
}

/// The `-I` flag set shared by every compile step.
fn include_flags(component: &Component, registry: &ApiRegistry, params: &BuildParams) -> String {
    let work = &params.object_dir;
    let mut dirs = BTreeSet::new();

    dirs.insert(component.dir().to_path_buf());
    dirs.insert(work.join(component.working_dir()).join("src"));

    let mut headers = BTreeSet::new();
    for types_only in component.types_only() {
        headers.insert(types_only.interface_file.clone());
        registry.client_usetypes_headers(types_only.api, &mut headers);
    }
    for client in component.clients() {
        headers.insert(client.interface_file.clone());
        registry.client_usetypes_headers(client.api, &mut headers);
    }
    for server in component.servers() {
        headers.insert(server.interface_file.clone());
        registry.server_usetypes_headers(server.api, &mut headers);
    }

    for header in headers {
        if let Some(parent) = header.parent() {
            dirs.insert(work.join(parent));
        }
    }

    dirs.iter()
        .map(|d| format!("-I{}", escape_path(d)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render implicit header dependencies as a ninja `|` clause.
fn header_list(headers: &BTreeSet<PathBuf>, work: &Path) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let list: Vec<String> = headers.iter().map(|h| escape_path(&work.join(h))).collect();
    format!(" | {}", list.join(" "))
}

/// The command line baked into the regeneration rule: this invocation's
/// argv, with regeneration forced and the executor suppressed.
fn regen_command(argv: &[String]) -> String {
    let mut parts: Vec<String> = argv
        .iter()
        .filter(|a| a.as_str() != "-n" && a.as_str() != "--no-ninja")
        .map(|a| escape(a))
        .collect();
    parts.push("--no-ninja".to_string());
    parts.join(" ")
}

/// Escape a string for use in a ninja file.
fn escape(s: &str) -> String {
    s.replace('$', "$$").replace(' ', "$ ").replace(':', "$:")
}

/// Escape a path for use in a ninja file.
fn escape_path(path: &Path) -> String {
    escape(&path.to_string_lossy())
}

/// Check if a file path has a C++ source extension.
///
/// Uppercase `.C` counts as C++ on case-sensitive filesystems.
fn is_cpp_source(path: &Path) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };

    let ext_str = ext.to_string_lossy();

    matches!(
        ext_str.as_ref(),
        "cpp" | "cc" | "cxx" | "c++" | "CPP" | "CC" | "CXX"
    ) || ext_str == "C"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Component, ApiRegistry, BuildParams) {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("defs.api"), "ENUM E { X };\n").unwrap();
        std::fs::write(
            tmp.path().join("data.api"),
            "USETYPES defs.api;\nFUNCTION Read();\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join("sensorMgr.c"), "int x;\n").unwrap();
        std::fs::write(
            tmp.path().join(MANIFEST_NAME),
            r#"
[component]
name = "sensorMgr"
sources = ["*.c"]

[[requires]]
api = "data.api"
name = "dataSvc"

[[provides]]
api = "data.api"
name = "cmdSvc"
async = true
"#,
        )
        .unwrap();

        let mut reg = ApiRegistry::new();
        let component = Component::load(tmp.path(), Path::new("."), &mut reg, &[]).unwrap();

        let mut params = BuildParams::new();
        params.object_dir = tmp.path().join("_build");
        params.add_cflag("-O2");

        (tmp, component, reg, params)
    }

    fn test_argv() -> Vec<String> {
        vec!["slipway".to_string(), "sensorMgr".to_string()]
    }

    #[test]
    fn test_script_structure() {
        let (_tmp, component, reg, params) = fixture();

        let text = render(&component, &reg, &params, &test_argv()).unwrap();

        assert!(text.contains("rule cc"));
        assert!(text.contains("rule shlib"));
        assert!(text.contains("rule apigenClient"));
        assert!(text.contains("cflags = -O2"));
        assert!(text.contains("apigenClient"));
        assert!(text.contains("--async"));
        assert!(text.contains("default"));
        assert!(text.contains("libsensorMgr.so"));
    }

    #[test]
    fn test_regen_edge_reuses_argv() {
        let (_tmp, component, reg, params) = fixture();
        let argv = vec![
            "slipway".to_string(),
            "sensorMgr".to_string(),
            "-n".to_string(),
        ];

        let text = render(&component, &reg, &params, &argv).unwrap();

        assert!(text.contains("command = slipway sensorMgr --no-ninja"));
        assert!(text.contains("generator = 1"));
    }

    #[test]
    fn test_included_api_gets_types_edge() {
        let (_tmp, component, reg, params) = fixture();
        let text = render(&component, &reg, &params, &test_argv()).unwrap();

        assert!(text.contains("apigenTypes"));
        assert!(text.contains("defs_interface.h"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let (_tmp, component, reg, params) = fixture();

        let a = render(&component, &reg, &params, &test_argv()).unwrap();
        let b = render(&component, &reg, &params, &test_argv()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stand_alone_links_executable() {
        let (_tmp, component, reg, mut params) = fixture();
        params.stand_alone = true;

        let text = render(&component, &reg, &params, &test_argv()).unwrap();

        assert!(text.contains("_main.o"));
        assert!(text.contains("bin/sensorMgr"));
    }

    #[test]
    fn test_ninja_escaping() {
        assert_eq!(escape("a b"), "a$ b");
        assert_eq!(escape("a$b"), "a$$b");
        assert_eq!(escape("c:x"), "c$:x");
    }

    #[test]
    fn test_is_cpp_source() {
        assert!(is_cpp_source(Path::new("file.cpp")));
        assert!(is_cpp_source(Path::new("file.cc")));
        assert!(is_cpp_source(Path::new("file.C")));
        assert!(!is_cpp_source(Path::new("file.c")));
        assert!(!is_cpp_source(Path::new("Makefile")));
    }
}
