//! Component aggregate.
//!
//! A [`Component`] collects the interface references a component declares,
//! in three ordered categories. Order of addition is preserved and is
//! observable in generated output, so the collections are plain `Vec`s and
//! nothing ever sorts them. The aggregate is write-once per build; there is
//! no removal operation.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::model::api::ApiRegistry;
use crate::model::interface::{
    ApiInterfaceInstance, ClientInstance, ClientRef, ServerInstance, ServerRef, TypesOnlyRef,
};
use crate::model::manifest::{ComponentManifest, MANIFEST_NAME};
use crate::util::diagnostic::DuplicateInterfaceError;
use crate::util::fs;

/// A unit of reusable code and its declared IPC interfaces.
#[derive(Debug)]
pub struct Component {
    /// Component name, a valid C identifier.
    name: String,

    /// The component's source directory (canonical absolute path).
    dir: PathBuf,

    /// Working directory for build artifacts, relative to the object
    /// directory root.
    working_dir: PathBuf,

    /// The library artifact to build.
    lib: PathBuf,

    /// Source file patterns from the manifest.
    sources: Vec<String>,

    /// Types-only interface references, in declaration order.
    types_only: Vec<TypesOnlyRef>,

    /// Client-side interface references, in declaration order.
    clients: Vec<ClientRef>,

    /// Server-side interface references, in declaration order.
    servers: Vec<ServerRef>,
}

impl Component {
    /// Create an empty component rooted at `dir`.
    ///
    /// The library artifact defaults to `lib<name>.so` under
    /// `lib_output_dir`; override it with [`Component::set_lib`].
    pub fn new(name: &str, dir: &Path, lib_output_dir: &Path) -> Self {
        Component {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            working_dir: PathBuf::from("components").join(name),
            lib: lib_output_dir.join(format!("lib{}.so", name)),
            sources: Vec::new(),
            types_only: Vec::new(),
            clients: Vec::new(),
            servers: Vec::new(),
        }
    }

    /// Load a component from its directory, resolving declared interfaces
    /// through `registry`.
    pub fn load(
        dir: &Path,
        lib_output_dir: &Path,
        registry: &mut ApiRegistry,
        interface_dirs: &[PathBuf],
    ) -> Result<Self> {
        let manifest = ComponentManifest::load(&dir.join(MANIFEST_NAME))?;
        Self::from_manifest(&manifest, dir, lib_output_dir, registry, interface_dirs)
    }

    /// Build a component from a parsed manifest.
    pub fn from_manifest(
        manifest: &ComponentManifest,
        dir: &Path,
        lib_output_dir: &Path,
        registry: &mut ApiRegistry,
        interface_dirs: &[PathBuf],
    ) -> Result<Self> {
        let mut component = Component::new(&manifest.component.name, dir, lib_output_dir);
        component.sources = manifest.component.sources.clone();

        // Interface search also covers the component's own directory.
        let mut dirs = vec![dir.to_path_buf()];
        dirs.extend(interface_dirs.iter().cloned());

        for decl in &manifest.uses {
            component.add_types_only_interface(
                registry,
                &decl.api,
                decl.interface_name(),
                &dirs,
            )?;
        }

        for decl in &manifest.requires {
            component.add_client_interface(
                registry,
                &decl.api,
                decl.interface_name(),
                decl.manual_start,
                &dirs,
            )?;
        }

        for decl in &manifest.provides {
            component.add_server_interface(
                registry,
                &decl.api,
                decl.interface_name(),
                decl.async_mode,
                decl.manual_start,
                &dirs,
            )?;
        }

        Ok(component)
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The component's source directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Working directory for artifacts, relative to the object directory.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The library artifact to build.
    pub fn lib(&self) -> &Path {
        &self.lib
    }

    /// Override the library artifact path.
    pub fn set_lib(&mut self, lib: PathBuf) {
        self.lib = lib;
    }

    /// Source file patterns from the manifest.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Types-only references, in declaration order.
    pub fn types_only(&self) -> &[TypesOnlyRef] {
        &self.types_only
    }

    /// Client-side references, in declaration order.
    pub fn clients(&self) -> &[ClientRef] {
        &self.clients
    }

    /// Server-side references, in declaration order.
    pub fn servers(&self) -> &[ServerRef] {
        &self.servers
    }

    /// Declare a types-only interface.
    pub fn add_types_only_interface(
        &mut self,
        registry: &mut ApiRegistry,
        api: &str,
        name: &str,
        interface_dirs: &[PathBuf],
    ) -> Result<()> {
        self.check_unique(name)?;

        let id = registry.load(api, &self.name, interface_dirs)?;
        self.types_only
            .push(TypesOnlyRef::new(id, registry.file(id), name));
        Ok(())
    }

    /// Declare a client-side interface.
    pub fn add_client_interface(
        &mut self,
        registry: &mut ApiRegistry,
        api: &str,
        name: &str,
        manual_start: bool,
        interface_dirs: &[PathBuf],
    ) -> Result<()> {
        self.check_unique(name)?;

        let id = registry.load(api, &self.name, interface_dirs)?;
        self.clients.push(ClientRef::new(
            id,
            registry.file(id),
            &self.working_dir,
            name,
            manual_start,
        ));
        Ok(())
    }

    /// Declare a server-side interface.
    pub fn add_server_interface(
        &mut self,
        registry: &mut ApiRegistry,
        api: &str,
        name: &str,
        async_mode: bool,
        manual_start: bool,
        interface_dirs: &[PathBuf],
    ) -> Result<()> {
        self.check_unique(name)?;

        let id = registry.load(api, &self.name, interface_dirs)?;
        self.servers.push(ServerRef::new(
            id,
            registry.file(id),
            &self.working_dir,
            name,
            async_mode,
            manual_start,
        ));
        Ok(())
    }

    /// Internal names must be unique across all three categories.
    fn check_unique(&self, name: &str) -> Result<()> {
        let taken = self.types_only.iter().any(|r| r.internal_name == name)
            || self.clients.iter().any(|r| r.internal_name == name)
            || self.servers.iter().any(|r| r.internal_name == name);

        if taken {
            return Err(DuplicateInterfaceError {
                component: self.name.clone(),
                name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// An executable's placement of a component.
///
/// Owns one interface instance per client and server reference, in the
/// component's declaration order. Binding assignment happens afterwards,
/// through [`ComponentInstance::bind_client`].
#[derive(Debug)]
pub struct ComponentInstance {
    /// Name of the executable this placement belongs to.
    exe_name: String,

    /// Interface instances, clients first, each group in declaration order.
    instances: Vec<ApiInterfaceInstance>,
}

impl ComponentInstance {
    /// Place `component` into the executable `exe_name` with default,
    /// unbound instances.
    pub fn new(exe_name: &str, component: &Component) -> Self {
        let mut instances = Vec::new();

        for (i, client) in component.clients().iter().enumerate() {
            instances.push(ApiInterfaceInstance::Client(ClientInstance::new(
                i,
                &client.internal_name,
            )));
        }

        for (i, server) in component.servers().iter().enumerate() {
            instances.push(ApiInterfaceInstance::Server(ServerInstance::new(
                i,
                &server.internal_name,
            )));
        }

        ComponentInstance {
            exe_name: exe_name.to_string(),
            instances,
        }
    }

    /// Name of the owning executable.
    pub fn exe_name(&self) -> &str {
        &self.exe_name
    }

    /// The interface instances, clients first.
    pub fn instances(&self) -> &[ApiInterfaceInstance] {
        &self.instances
    }

    /// Bind the client instance named `name` to a server interface.
    pub fn bind_client(
        &mut self,
        name: &str,
        binding: crate::model::interface::Binding,
    ) -> Result<()> {
        for instance in &mut self.instances {
            if let ApiInterfaceInstance::Client(client) = instance {
                if client.name == name {
                    client.bind(binding);
                    return Ok(());
                }
            }
        }

        bail!("no client interface instance named `{}`", name);
    }
}

/// Locate a component by searching the source directories in order.
///
/// `component` may be a bare name or a relative path; the first search
/// directory containing `component/Component.toml` wins. Returns the
/// canonical component directory.
pub fn find_component(component: &str, source_dirs: &[PathBuf]) -> Option<PathBuf> {
    for dir in source_dirs {
        let candidate = dir.join(component);
        if candidate.join(MANIFEST_NAME).is_file() {
            return Some(fs::normalize_path(&candidate));
        }
    }
    None
}
