//! Interface references and instances.
//!
//! An [`ApiRef`] is a component's declared use of one API file under an
//! internal name; an [`ApiInterfaceInstance`] is the placement of such a
//! reference at an executable's boundary. Both families are closed sum
//! types so the code generator can match exhaustively.
//!
//! This layer is pure data modelling; construction has no side effects.

use std::path::{Path, PathBuf};

use crate::model::api::{ApiFile, ApiId};

/// A component's reference to an API file.
#[derive(Debug)]
pub enum ApiRef {
    /// Only the data types of the API are used.
    TypesOnly(TypesOnlyRef),
    /// The component consumes the service.
    Client(ClientRef),
    /// The component provides the service.
    Server(ServerRef),
}

impl ApiRef {
    /// Name used inside the component to refer to the interface.
    pub fn internal_name(&self) -> &str {
        match self {
            ApiRef::TypesOnly(r) => &r.internal_name,
            ApiRef::Client(r) => &r.internal_name,
            ApiRef::Server(r) => &r.internal_name,
        }
    }

    /// The API file this reference resolves to.
    pub fn api(&self) -> ApiId {
        match self {
            ApiRef::TypesOnly(r) => r.api,
            ApiRef::Client(r) => r.api,
            ApiRef::Server(r) => r.api,
        }
    }
}

/// Inclusion of data types from an API file, without a service endpoint.
#[derive(Debug)]
pub struct TypesOnlyRef {
    /// The API file object.
    pub api: ApiId,

    /// Name used inside the component to refer to the interface.
    pub internal_name: String,

    /// Header pulled into the component's aggregation header.
    pub interface_file: PathBuf,
}

impl TypesOnlyRef {
    /// Create a types-only reference to `api` under `internal_name`.
    pub fn new(api: ApiId, api_file: &ApiFile, internal_name: &str) -> Self {
        TypesOnlyRef {
            api,
            internal_name: internal_name.to_string(),
            interface_file: api_file.client_interface_file(internal_name),
        }
    }
}

/// A client-side IPC interface.
#[derive(Debug)]
pub struct ClientRef {
    /// The API file object.
    pub api: ApiId,

    /// Name used inside the component to refer to the interface.
    pub internal_name: String,

    /// Header pulled into the component's aggregation header.
    pub interface_file: PathBuf,

    /// Local header included by the generated client code.
    pub internal_header: PathBuf,

    /// Generated client source file.
    pub source_file: PathBuf,

    /// Object file compiled from the generated source.
    pub object_file: PathBuf,

    /// true = the generated bootstrap must not connect the service.
    pub manual_start: bool,
}

impl ClientRef {
    /// Create a client reference to `api` under `internal_name`.
    ///
    /// `working_dir` is the owning component's working directory, relative
    /// to the object directory root; the interface's object file lands
    /// under it.
    pub fn new(
        api: ApiId,
        api_file: &ApiFile,
        working_dir: &Path,
        internal_name: &str,
        manual_start: bool,
    ) -> Self {
        ClientRef {
            api,
            internal_name: internal_name.to_string(),
            interface_file: api_file.client_interface_file(internal_name),
            internal_header: api_file.client_internal_header(internal_name),
            source_file: api_file.client_source_file(internal_name),
            object_file: working_dir
                .join("obj")
                .join(format!("{}_client.o", internal_name)),
            manual_start,
        }
    }
}

/// A server-side IPC interface.
#[derive(Debug)]
pub struct ServerRef {
    /// The API file object.
    pub api: ApiId,

    /// Name used inside the component to refer to the interface.
    pub internal_name: String,

    /// Header pulled into the component's aggregation header.
    pub interface_file: PathBuf,

    /// Local header included by the generated server code.
    pub internal_header: PathBuf,

    /// Generated server source file.
    pub source_file: PathBuf,

    /// Object file compiled from the generated source.
    pub object_file: PathBuf,

    /// true = the component uses the asynchronous mode of operation.
    pub async_mode: bool,

    /// true = the generated bootstrap must not advertise the service.
    pub manual_start: bool,
}

impl ServerRef {
    /// Create a server reference to `api` under `internal_name`.
    pub fn new(
        api: ApiId,
        api_file: &ApiFile,
        working_dir: &Path,
        internal_name: &str,
        async_mode: bool,
        manual_start: bool,
    ) -> Self {
        let (interface_file, internal_header, source_file) = if async_mode {
            (
                api_file.async_server_interface_file(internal_name),
                api_file.server_internal_header(internal_name),
                api_file.async_server_source_file(internal_name),
            )
        } else {
            (
                api_file.server_interface_file(internal_name),
                api_file.server_internal_header(internal_name),
                api_file.server_source_file(internal_name),
            )
        };

        ServerRef {
            api,
            internal_name: internal_name.to_string(),
            interface_file,
            internal_header,
            source_file,
            object_file: working_dir
                .join("obj")
                .join(format!("{}_server.o", internal_name)),
            async_mode,
            manual_start,
        }
    }
}

/// A relation pairing a client interface instance to a server interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Component (or application) providing the service.
    pub server_component: String,

    /// The server's interface instance name.
    pub server_interface: String,
}

impl Binding {
    /// The service-directory name the bound client connects to.
    pub fn service_name(&self) -> String {
        format!("{}.{}", self.server_component, self.server_interface)
    }
}

/// An instantiation of an IPC interface within an executable.
#[derive(Debug)]
pub enum ApiInterfaceInstance {
    Client(ClientInstance),
    Server(ServerInstance),
}

impl ApiInterfaceInstance {
    /// Name identifying this interface to the service directory.
    pub fn name(&self) -> &str {
        match self {
            ApiInterfaceInstance::Client(i) => &i.name,
            ApiInterfaceInstance::Server(i) => &i.name,
        }
    }

    /// Whether the interface is visible beyond the owning executable.
    pub fn is_external(&self) -> bool {
        match self {
            ApiInterfaceInstance::Client(i) => i.is_external,
            ApiInterfaceInstance::Server(i) => i.is_external,
        }
    }
}

/// An instantiation of a client-side interface within an executable.
#[derive(Debug)]
pub struct ClientInstance {
    /// Index of the [`ClientRef`] in the owning component's client list.
    pub client_ref: usize,

    /// Name identifying this interface to the service directory.
    pub name: String,

    /// Whether the interface is visible beyond the owning executable.
    pub is_external: bool,

    /// The binding, if one has been supplied.
    ///
    /// Absence means the interface is unresolved at this stage: either an
    /// external binding arrives later, or it remains an application-level
    /// requirement.
    pub binding: Option<Binding>,
}

impl ClientInstance {
    /// Create an unbound instance named after the interface's internal name.
    pub fn new(client_ref: usize, internal_name: &str) -> Self {
        ClientInstance {
            client_ref,
            name: internal_name.to_string(),
            is_external: false,
            binding: None,
        }
    }

    /// Supply the binding. Binding assignment is a separate, later step
    /// performed by the surrounding binding-resolution process.
    pub fn bind(&mut self, binding: Binding) {
        self.binding = Some(binding);
    }

    /// The service name this instance connects to: the binding target when
    /// bound, otherwise the instance's own name.
    pub fn service_name(&self) -> String {
        match &self.binding {
            Some(binding) => binding.service_name(),
            None => self.name.clone(),
        }
    }
}

/// An instantiation of a server-side interface within an executable.
///
/// Servers are bound to, not bound from, so no binding is stored.
#[derive(Debug)]
pub struct ServerInstance {
    /// Index of the [`ServerRef`] in the owning component's server list.
    pub server_ref: usize,

    /// Name identifying this interface to the service directory.
    pub name: String,

    /// Whether the interface is visible beyond the owning executable.
    pub is_external: bool,
}

impl ServerInstance {
    /// Create an instance named after the interface's internal name.
    pub fn new(server_ref: usize, internal_name: &str) -> Self {
        ServerInstance {
            server_ref,
            name: internal_name.to_string(),
            is_external: false,
        }
    }
}
