//! Aggregation header generation.
//!
//! Every component gets one generated `interfaces.h` gathering the
//! declarations of all its interfaces, so component code includes a single
//! file. The body is callable from both C and C++ translation units.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;

use crate::build::params::BuildParams;
use crate::model::Component;
use crate::util::fs;

/// The include guard token for a component's aggregation header.
///
/// Component names are validated C identifiers, so the mapping is
/// injective: two different component names never collide.
pub fn include_guard(component_name: &str) -> String {
    format!(
        "__{}_COMPONENT_INTERFACE_H_INCLUDE_GUARD",
        component_name
    )
}

/// Generate `interfaces.h` for a component.
///
/// The file lands at `<object-dir>/<component-working-dir>/src/interfaces.h`;
/// the directory is created if absent. Returns the written path.
pub fn generate_interfaces_header(
    component: &Component,
    params: &BuildParams,
) -> Result<PathBuf> {
    let output_dir = params.object_dir.join(component.working_dir()).join("src");
    let file_path = output_dir.join("interfaces.h");

    tracing::debug!(
        "generating interfaces.h for component '{}' in '{}'",
        component.name(),
        file_path.display()
    );

    fs::write_string(&file_path, &render(component))?;
    Ok(file_path)
}

/// Render the header text.
///
/// Pure function of the component model: repeated rendering from an
/// unchanged model is byte-identical.
fn render(component: &Component) -> String {
    let guard = include_guard(component.name());
    let mut out = String::new();

    writeln!(out, "/*").unwrap();
    writeln!(
        out,
        " * AUTO-GENERATED interfaces.h for the {} component.",
        component.name()
    )
    .unwrap();
    writeln!(out, " *").unwrap();
    writeln!(out, " * Don't bother hand-editing this file.").unwrap();
    writeln!(out, " */").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#ifndef {}", guard).unwrap();
    writeln!(out, "#define {}", guard).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#ifdef __cplusplus").unwrap();
    writeln!(out, "extern \"C\" {{").unwrap();
    writeln!(out, "#endif").unwrap();
    writeln!(out).unwrap();

    // Client-side headers for the .api files used for data types only.
    for types_only in component.types_only() {
        writeln!(out, "#include \"{}_interface.h\"", types_only.internal_name).unwrap();
    }

    // Client-side headers for the client interfaces.
    for client in component.clients() {
        writeln!(out, "#include \"{}_interface.h\"", client.internal_name).unwrap();
    }

    // Server-side headers for the server interfaces.
    for server in component.servers() {
        writeln!(out, "#include \"{}_server.h\"", server.internal_name).unwrap();
    }

    writeln!(out).unwrap();
    writeln!(out, "#ifdef __cplusplus").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out, "#endif").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#endif // {}", guard).unwrap();

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApiRegistry;
    use std::path::Path;
    use tempfile::TempDir;

    fn component_with_refs() -> (TempDir, Component) {
        let tmp = TempDir::new().unwrap();
        for api in ["a.api", "b.api", "c.api", "d.api", "e.api"] {
            std::fs::write(tmp.path().join(api), "FUNCTION F();\n").unwrap();
        }
        let dirs = vec![tmp.path().to_path_buf()];

        let mut reg = ApiRegistry::new();
        let mut component = Component::new("sensorMgr", tmp.path(), Path::new("."));
        component
            .add_types_only_interface(&mut reg, "a.api", "A", &dirs)
            .unwrap();
        component
            .add_types_only_interface(&mut reg, "b.api", "B", &dirs)
            .unwrap();
        component
            .add_client_interface(&mut reg, "c.api", "C", false, &dirs)
            .unwrap();
        component
            .add_server_interface(&mut reg, "d.api", "D", false, false, &dirs)
            .unwrap();
        component
            .add_server_interface(&mut reg, "e.api", "E", true, false, &dirs)
            .unwrap();

        (tmp, component)
    }

    #[test]
    fn test_include_lines_in_declaration_order() {
        let (_tmp, component) = component_with_refs();
        let text = render(&component);

        let includes: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("#include"))
            .collect();

        assert_eq!(
            includes,
            vec![
                "#include \"A_interface.h\"",
                "#include \"B_interface.h\"",
                "#include \"C_interface.h\"",
                "#include \"D_server.h\"",
                "#include \"E_server.h\"",
            ]
        );
    }

    #[test]
    fn test_generation_is_idempotent() {
        let (_tmp, component) = component_with_refs();
        assert_eq!(render(&component), render(&component));
    }

    #[test]
    fn test_include_guard_derivation() {
        assert_eq!(
            include_guard("fooBar"),
            "__fooBar_COMPONENT_INTERFACE_H_INCLUDE_GUARD"
        );
        assert_ne!(include_guard("fooBar"), include_guard("fooBaz"));
    }

    #[test]
    fn test_extern_c_wrapper() {
        let (_tmp, component) = component_with_refs();
        let text = render(&component);

        assert!(text.contains("#ifdef __cplusplus\nextern \"C\" {\n#endif"));
        assert!(text.contains("#ifdef __cplusplus\n}\n#endif"));
    }

    #[test]
    fn test_header_written_under_component_working_dir() {
        let (_tmp, component) = component_with_refs();
        let out = TempDir::new().unwrap();

        let mut params = BuildParams::new();
        params.object_dir = out.path().to_path_buf();

        let path = generate_interfaces_header(&component, &params).unwrap();

        assert_eq!(
            path,
            out.path().join("components/sensorMgr/src/interfaces.h")
        );
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render(&component));
    }

    #[test]
    fn test_empty_component_still_well_formed() {
        let tmp = TempDir::new().unwrap();
        let component = Component::new("bare", tmp.path(), Path::new("."));
        let text = render(&component);

        assert!(text.contains("#ifndef __bare_COMPONENT_INTERFACE_H_INCLUDE_GUARD"));
        assert!(!text.contains("#include"));
    }
}
