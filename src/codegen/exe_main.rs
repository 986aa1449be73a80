//! Executable bootstrap shim generation.
//!
//! `_main.c` is the executable-side flavor of the bootstrap shim family:
//! generated from a component placement rather than the bare component, it
//! pins down the service instance name of every interface at the
//! executable boundary and provides the process entry point.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;

use crate::build::params::BuildParams;
use crate::codegen::component_main::init_function;
use crate::model::{ApiInterfaceInstance, Component, ComponentInstance};
use crate::util::fs;

/// Generate `_main.c` for a component placed into an executable.
///
/// Returns the written path.
pub fn generate_exe_main(
    component: &Component,
    instance: &ComponentInstance,
    params: &BuildParams,
) -> Result<PathBuf> {
    let output_dir = params.object_dir.join(component.working_dir()).join("src");
    let file_path = output_dir.join("_main.c");

    tracing::debug!(
        "generating _main.c for executable '{}' in '{}'",
        instance.exe_name(),
        file_path.display()
    );

    fs::write_string(&file_path, &render(component, instance))?;
    Ok(file_path)
}

/// Render the shim text.
///
/// Pure function of the model: repeated rendering from an unchanged model
/// is byte-identical.
fn render(component: &Component, instance: &ComponentInstance) -> String {
    let mut out = String::new();

    writeln!(out, "/*").unwrap();
    writeln!(
        out,
        " * AUTO-GENERATED _main.c for the {} executable.",
        instance.exe_name()
    )
    .unwrap();
    writeln!(out, " *").unwrap();
    writeln!(out, " * Don't bother hand-editing this file.").unwrap();
    writeln!(out, " */").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "void {}(void);", init_function(component)).unwrap();
    writeln!(out, "void {}_ComponentInit(void);", component.name()).unwrap();
    writeln!(out).unwrap();

    if !instance.instances().is_empty() {
        writeln!(
            out,
            "/* Service instance names resolved at the executable boundary. */"
        )
        .unwrap();
        for interface in instance.instances() {
            let (internal_name, service_name) = match interface {
                ApiInterfaceInstance::Client(client) => (
                    component.clients()[client.client_ref].internal_name.as_str(),
                    client.service_name(),
                ),
                ApiInterfaceInstance::Server(server) => (
                    component.servers()[server.server_ref].internal_name.as_str(),
                    server.name.clone(),
                ),
            };

            writeln!(
                out,
                "const char* _{}_{}_ServiceInstanceName = \"{}\";",
                component.name(),
                internal_name,
                service_name
            )
            .unwrap();
        }
        writeln!(out).unwrap();
    }

    writeln!(out, "int main(void)").unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out, "    {}();", init_function(component)).unwrap();
    writeln!(out, "    {}_ComponentInit();", component.name()).unwrap();
    writeln!(out, "    return 0;").unwrap();
    writeln!(out, "}}").unwrap();

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApiRegistry, Binding};
    use std::path::Path;
    use tempfile::TempDir;

    fn placement() -> (TempDir, Component, ComponentInstance) {
        let tmp = TempDir::new().unwrap();
        for api in ["data.api", "cmd.api"] {
            std::fs::write(tmp.path().join(api), "FUNCTION F();\n").unwrap();
        }
        let dirs = vec![tmp.path().to_path_buf()];

        let mut reg = ApiRegistry::new();
        let mut component = Component::new("sensorMgr", tmp.path(), Path::new("."));
        component
            .add_client_interface(&mut reg, "data.api", "dataSvc", false, &dirs)
            .unwrap();
        component
            .add_server_interface(&mut reg, "cmd.api", "cmdSvc", false, false, &dirs)
            .unwrap();

        let instance = ComponentInstance::new("sensorApp", &component);
        (tmp, component, instance)
    }

    #[test]
    fn test_unbound_client_uses_own_name() {
        let (_tmp, component, instance) = placement();
        let text = render(&component, &instance);

        assert!(text
            .contains("const char* _sensorMgr_dataSvc_ServiceInstanceName = \"dataSvc\";"));
        assert!(text
            .contains("const char* _sensorMgr_cmdSvc_ServiceInstanceName = \"cmdSvc\";"));
    }

    #[test]
    fn test_bound_client_uses_binding_target() {
        let (_tmp, component, mut instance) = placement();
        instance
            .bind_client(
                "dataSvc",
                Binding {
                    server_component: "dataHub".to_string(),
                    server_interface: "feed".to_string(),
                },
            )
            .unwrap();

        let text = render(&component, &instance);
        assert!(text
            .contains("const char* _sensorMgr_dataSvc_ServiceInstanceName = \"dataHub.feed\";"));
    }

    #[test]
    fn test_main_initializes_then_runs_component() {
        let (_tmp, component, instance) = placement();
        let text = render(&component, &instance);

        let init = text.find("    _sensorMgr_InitInterfaces();").unwrap();
        let run = text.find("    sensorMgr_ComponentInit();").unwrap();
        assert!(init < run);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let (_tmp, component, instance) = placement();
        assert_eq!(render(&component, &instance), render(&component, &instance));
    }

    #[test]
    fn test_written_to_component_src_dir() {
        let (_tmp, component, instance) = placement();
        let out = TempDir::new().unwrap();

        let mut params = BuildParams::new();
        params.object_dir = out.path().to_path_buf();

        let path = generate_exe_main(&component, &instance, &params).unwrap();
        assert_eq!(path, out.path().join("components/sensorMgr/src/_main.c"));
    }
}
