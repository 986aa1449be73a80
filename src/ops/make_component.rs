//! Implementation of the component build pipeline.
//!
//! One invocation processes exactly one component:
//!
//! ```text
//! args -> (fast path: delegate to ninja)
//!       | locate -> model -> generate code -> emit script -> delegate
//! ```
//!
//! Delegation is returned as data rather than performed in place, so
//! callers (and tests) can observe the decision without transferring
//! control. The binary executes it with process-replacement semantics: on
//! the success path the executor never returns here.

use std::path::PathBuf;

use anyhow::Result;

use crate::build::fingerprint::InvocationRecord;
use crate::build::{ninja, BuildParams};
use crate::codegen;
use crate::model::{self, ApiRegistry, Component, ComponentInstance};
use crate::util::diagnostic::ComponentNotFoundError;
use crate::util::env;
use crate::util::process::ProcessBuilder;

/// Options for one `make-component` invocation.
#[derive(Debug, Clone)]
pub struct MakeOptions {
    /// The component to build, as given on the command line.
    pub component: String,

    /// Explicit library output path, overriding the component default.
    pub output_path: Option<PathBuf>,

    /// Everything else gathered from the command line.
    pub params: BuildParams,

    /// The full command line, for the invocation record and the build
    /// script's regeneration rule.
    pub argv: Vec<String>,
}

/// How an invocation ends.
#[derive(Debug)]
pub enum Outcome {
    /// Prior build script is still valid: hand control to the external
    /// executor without regenerating anything.
    FastPath(ProcessBuilder),

    /// The full pipeline ran: hand control to the external executor.
    Delegate(ProcessBuilder),

    /// Generation finished and the executor must not run.
    Done,
}

impl Outcome {
    /// The executor command, if this outcome delegates.
    pub fn command(&self) -> Option<&ProcessBuilder> {
        match self {
            Outcome::FastPath(cmd) | Outcome::Delegate(cmd) => Some(cmd),
            Outcome::Done => None,
        }
    }
}

/// Run the pipeline for one component.
pub fn make_component(opts: &MakeOptions) -> Result<Outcome> {
    let params = &opts.params;

    // Publish the target so generated build steps and child processes see it.
    env::set_target(&params.target);

    let record = InvocationRecord::current(&opts.argv);

    // If a build script already exists and this invocation asks for exactly
    // what the last one asked for, skip straight to the executor.
    if !params.no_ninja && !params.codegen_only && params.script_path().exists() {
        if let Some(saved) = InvocationRecord::load(&params.record_path()) {
            if record.matches(&saved) {
                tracing::info!(
                    "arguments and environment unchanged ({}); delegating to ninja",
                    record.digest()
                );
                return Ok(Outcome::FastPath(ninja_command(params)));
            }
            tracing::debug!("invocation record mismatch; regenerating");
        }
    }

    // Locate the component: first source search directory wins.
    let component_dir = model::find_component(&opts.component, &params.source_dirs)
        .ok_or_else(|| ComponentNotFoundError {
            component: opts.component.clone(),
            searched: params.source_dirs.clone(),
        })?;
    tracing::info!(
        "building component '{}' from {}",
        opts.component,
        component_dir.display()
    );

    // Build the conceptual model. The registry is scoped to this
    // invocation; nothing leaks into the next one.
    let mut registry = ApiRegistry::new();
    let mut component = Component::load(
        &component_dir,
        &params.lib_output_dir,
        &mut registry,
        &params.interface_dirs,
    )?;

    if let Some(path) = &opts.output_path {
        component.set_lib(path.clone());
    }

    registry.ensure_acyclic()?;

    // Generate the derived sources.
    codegen::generate_interfaces_header(&component, params)?;
    codegen::generate_component_main(&component, params, params.stand_alone)?;

    if params.stand_alone {
        // A stand-alone library is runnable on its own; give it an
        // executable entry point with default, unbound instances.
        let instance = ComponentInstance::new(component.name(), &component);
        codegen::generate_exe_main(&component, &instance, params)?;
    }

    // Emit the build script for the external executor.
    ninja::generate(&component, &registry, params, &opts.argv)?;

    if params.no_ninja {
        // The executor is already running and asked us to regenerate its
        // script; it only does that right after a run that saved the
        // record, so there is nothing to save here.
        return Ok(Outcome::Done);
    }

    record.save(&params.record_path())?;

    if params.codegen_only {
        return Ok(Outcome::Done);
    }

    Ok(Outcome::Delegate(ninja_command(params)))
}

/// The external executor command for this invocation.
fn ninja_command(params: &BuildParams) -> ProcessBuilder {
    let mut cmd = ProcessBuilder::new("ninja")
        .arg("-f")
        .arg(params.script_path());

    if params.verbose {
        cmd = cmd.arg("-v");
    }

    cmd
}
