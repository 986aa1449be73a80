//! Component bootstrap shim generation.
//!
//! `_componentMain.c` gives each component a generated translation unit
//! that (a) references every interface's bootstrap symbol so the linker
//! keeps otherwise-unreferenced generated object code, and (b) defines the
//! initialization routine that connects client interfaces and advertises
//! server interfaces at startup, in declaration order.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;

use crate::build::params::BuildParams;
use crate::model::{ClientRef, Component, ServerRef};
use crate::util::fs;

/// Name of the bootstrap function that connects a client interface.
pub fn connect_function(client: &ClientRef) -> String {
    format!("{}_ConnectService", client.internal_name)
}

/// Name of the bootstrap function that advertises a server interface.
///
/// Asynchronous servers advertise through a distinct entry point, so a
/// synchronous stub library and an asynchronous one can never be confused
/// at link time.
pub fn advertise_function(server: &ServerRef) -> String {
    if server.async_mode {
        format!("{}_AdvertiseServiceAsync", server.internal_name)
    } else {
        format!("{}_AdvertiseService", server.internal_name)
    }
}

/// Name of the generated per-component initialization routine.
pub fn init_function(component: &Component) -> String {
    format!("_{}_InitInterfaces", component.name())
}

/// Generate `_componentMain.c` for a component.
///
/// `stand_alone` selects the linkage style: stand-alone builds link the
/// interface libraries directly into the component library, so the
/// keep-alive symbol references are only emitted when NOT stand-alone.
/// Returns the written path.
pub fn generate_component_main(
    component: &Component,
    params: &BuildParams,
    stand_alone: bool,
) -> Result<PathBuf> {
    let output_dir = params.object_dir.join(component.working_dir()).join("src");
    let file_path = output_dir.join("_componentMain.c");

    tracing::debug!(
        "generating _componentMain.c for component '{}' in '{}'",
        component.name(),
        file_path.display()
    );

    fs::write_string(&file_path, &render(component, stand_alone))?;
    Ok(file_path)
}

/// Render the shim text.
///
/// Pure function of the component model and the stand-alone flag: repeated
/// rendering from an unchanged model is byte-identical.
fn render(component: &Component, stand_alone: bool) -> String {
    let mut out = String::new();

    writeln!(out, "/*").unwrap();
    writeln!(
        out,
        " * AUTO-GENERATED _componentMain.c for the {} component.",
        component.name()
    )
    .unwrap();
    writeln!(out, " *").unwrap();
    writeln!(out, " * Don't bother hand-editing this file.").unwrap();
    writeln!(out, " */").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include \"interfaces.h\"").unwrap();
    writeln!(out).unwrap();

    // Declare every interface's bootstrap symbol, manual-start ones
    // included: the keep-alive table below needs them all.
    for client in component.clients() {
        writeln!(out, "void {}(void);", connect_function(client)).unwrap();
    }
    for server in component.servers() {
        writeln!(out, "void {}(void);", advertise_function(server)).unwrap();
    }
    if !component.clients().is_empty() || !component.servers().is_empty() {
        writeln!(out).unwrap();
    }

    if !stand_alone && (!component.clients().is_empty() || !component.servers().is_empty()) {
        // Resolve all names: take the address of every bootstrap symbol so
        // the linker keeps the generated interface objects even when the
        // component never calls them directly.
        writeln!(
            out,
            "__attribute__((used)) static void* const _{}_KeepServiceSymbols[] =",
            component.name()
        )
        .unwrap();
        writeln!(out, "{{").unwrap();
        for client in component.clients() {
            writeln!(out, "    (void*){},", connect_function(client)).unwrap();
        }
        for server in component.servers() {
            writeln!(out, "    (void*){},", advertise_function(server)).unwrap();
        }
        writeln!(out, "}};").unwrap();
        writeln!(out).unwrap();
    }

    writeln!(out, "void {}(void)", init_function(component)).unwrap();
    writeln!(out, "{{").unwrap();
    for client in component.clients() {
        if !client.manual_start {
            writeln!(out, "    {}();", connect_function(client)).unwrap();
        }
    }
    for server in component.servers() {
        if !server.manual_start {
            writeln!(out, "    {}();", advertise_function(server)).unwrap();
        }
    }
    writeln!(out, "}}").unwrap();

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApiRegistry;
    use std::path::Path;
    use tempfile::TempDir;

    fn component() -> (TempDir, Component) {
        let tmp = TempDir::new().unwrap();
        for api in ["data.api", "cmd.api", "evt.api"] {
            std::fs::write(tmp.path().join(api), "FUNCTION F();\n").unwrap();
        }
        let dirs = vec![tmp.path().to_path_buf()];

        let mut reg = ApiRegistry::new();
        let mut component = Component::new("sensorMgr", tmp.path(), Path::new("."));
        component
            .add_client_interface(&mut reg, "data.api", "dataSvc", false, &dirs)
            .unwrap();
        component
            .add_client_interface(&mut reg, "data.api", "lazySvc", true, &dirs)
            .unwrap();
        component
            .add_server_interface(&mut reg, "cmd.api", "cmdSvc", false, false, &dirs)
            .unwrap();
        component
            .add_server_interface(&mut reg, "evt.api", "evtSvc", true, false, &dirs)
            .unwrap();

        (tmp, component)
    }

    /// The body of the generated init routine, one call per line.
    fn init_calls(text: &str) -> Vec<String> {
        let body_start = text.find("_InitInterfaces(void)").unwrap();
        text[body_start..]
            .lines()
            .filter(|l| l.trim_end().ends_with("();"))
            .map(|l| l.trim().to_string())
            .collect()
    }

    #[test]
    fn test_init_calls_in_declaration_order() {
        let (_tmp, component) = component();
        let text = render(&component, false);

        assert_eq!(
            init_calls(&text),
            vec![
                "dataSvc_ConnectService();",
                "cmdSvc_AdvertiseService();",
                "evtSvc_AdvertiseServiceAsync();",
            ]
        );
    }

    #[test]
    fn test_manual_start_suppressed_but_declared() {
        let (_tmp, component) = component();
        let text = render(&component, false);

        // Not called at init...
        assert!(!init_calls(&text).contains(&"lazySvc_ConnectService();".to_string()));

        // ...but still declared and kept alive.
        assert!(text.contains("void lazySvc_ConnectService(void);"));
        assert!(text.contains("(void*)lazySvc_ConnectService,"));
    }

    #[test]
    fn test_async_server_uses_distinct_bootstrap() {
        let (_tmp, component) = component();
        let text = render(&component, false);

        assert!(text.contains("evtSvc_AdvertiseServiceAsync();"));
        assert!(!text.contains("evtSvc_AdvertiseService();"));
    }

    #[test]
    fn test_keep_alive_only_when_not_stand_alone() {
        let (_tmp, component) = component();

        let linked = render(&component, false);
        let stand_alone = render(&component, true);

        assert!(linked.contains("_sensorMgr_KeepServiceSymbols"));
        assert!(!stand_alone.contains("_sensorMgr_KeepServiceSymbols"));
    }

    #[test]
    fn test_generation_is_idempotent() {
        let (_tmp, component) = component();
        assert_eq!(render(&component, false), render(&component, false));
    }

    #[test]
    fn test_empty_component_has_empty_init() {
        let tmp = TempDir::new().unwrap();
        let component = Component::new("bare", tmp.path(), Path::new("."));
        let text = render(&component, false);

        assert!(text.contains("void _bare_InitInterfaces(void)"));
        assert!(!text.contains("KeepServiceSymbols"));
    }

    #[test]
    fn test_written_to_component_src_dir() {
        let (_tmp, component) = component();
        let out = TempDir::new().unwrap();

        let mut params = BuildParams::new();
        params.object_dir = out.path().to_path_buf();

        let path = generate_component_main(&component, &params, false).unwrap();
        assert_eq!(
            path,
            out.path().join("components/sensorMgr/src/_componentMain.c")
        );
    }
}
