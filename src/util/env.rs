//! Build-related environment variables.
//!
//! A fixed set of variables influences code generation and the emitted build
//! script. Their values are captured in the saved invocation record so that
//! any change defeats the skip-regeneration fast path.

use std::env;

/// Environment variables whose values affect generated output.
///
/// Order is significant: snapshots preserve this order so that saved
/// records compare deterministically.
pub const TRACKED_VARS: &[&str] = &[
    "SLIPWAY_ROOT",
    "SLIPWAY_TARGET",
    "CC",
    "CXX",
    "AR",
    "LD",
];

/// The variable naming the target device for the current invocation.
pub const TARGET_VAR: &str = "SLIPWAY_TARGET";

/// The variable pointing at the framework installation root.
pub const ROOT_VAR: &str = "SLIPWAY_ROOT";

/// Publish the target device identifier to the build environment.
///
/// Generated build steps and child processes (the external executor and the
/// stub generator it runs) read this to select target-specific tooling.
pub fn set_target(target: &str) {
    env::set_var(TARGET_VAR, target);
}

/// Get the framework root directory, if configured.
pub fn framework_root() -> Option<String> {
    env::var(ROOT_VAR).ok()
}

/// Snapshot the tracked variables in their fixed order.
///
/// Unset variables are recorded as `None`, which is distinct from an empty
/// value.
pub fn snapshot() -> Vec<(String, Option<String>)> {
    TRACKED_VARS
        .iter()
        .map(|name| (name.to_string(), env::var(name).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_order_is_fixed() {
        let snap = snapshot();
        let names: Vec<&str> = snap.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, TRACKED_VARS);
    }

    // Keep the value aligned with the default target: tests share one
    // process environment, so writing a different value here could race
    // with pipeline tests that snapshot between their own set and read.
    #[test]
    fn test_set_target_is_visible_in_snapshot() {
        set_target("local");

        let snap = snapshot();
        let target = snap
            .iter()
            .find(|(n, _)| n == TARGET_VAR)
            .and_then(|(_, v)| v.clone());

        assert_eq!(target, Some("local".to_string()));
    }
}
