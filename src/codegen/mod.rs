//! Deterministic source generation.
//!
//! All generators are pure functions of the conceptual model: repeated
//! generation from an unchanged model reproduces prior output byte for
//! byte, so downstream tooling can diff content to decide whether
//! recompilation is needed.

pub mod component_main;
pub mod exe_main;
pub mod interfaces_header;

pub use component_main::generate_component_main;
pub use exe_main::generate_exe_main;
pub use interfaces_header::{generate_interfaces_header, include_guard};
