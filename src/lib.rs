//! slipway - component build-model tool for embedded IPC applications
//!
//! This crate turns declarative component descriptions and their IPC
//! interface definitions into a typed conceptual model, deterministic
//! generated sources, and a build script consumed by the external
//! executor.

pub mod build;
pub mod codegen;
pub mod model;
pub mod ops;
pub mod util;

pub use build::{BuildParams, InvocationRecord};
pub use model::{ApiRegistry, Component, ComponentInstance, ComponentManifest};
pub use ops::{make_component, MakeOptions, Outcome};
