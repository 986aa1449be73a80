//! Conceptual object model.
//!
//! The model ties API definition files to components and their interface
//! bindings. Objects live for the duration of one build invocation and are
//! never persisted; their only durable output is the generated text
//! artifacts and the build script.

pub mod api;
pub mod component;
pub mod interface;
pub mod manifest;

pub use api::{ApiFile, ApiId, ApiRegistry};
pub use component::{find_component, Component, ComponentInstance};
pub use interface::{
    ApiInterfaceInstance, ApiRef, Binding, ClientInstance, ClientRef, ServerInstance, ServerRef,
    TypesOnlyRef,
};
pub use manifest::{ComponentManifest, MANIFEST_NAME};
