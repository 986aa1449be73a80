//! High-level operations.
//!
//! This module contains the implementation of the slipway pipeline.

pub mod make_component;

pub use make_component::{make_component, MakeOptions, Outcome};
