//! Build parameters for one invocation.

use std::path::{Path, PathBuf};

use crate::util::env;

/// Everything the pipeline needs to know about one invocation, gathered
/// from the command line before any work starts.
#[derive(Debug, Clone)]
pub struct BuildParams {
    /// Directory for generated runtime libraries.
    pub lib_output_dir: PathBuf,

    /// Directory for intermediate build artifacts and generated sources.
    pub object_dir: PathBuf,

    /// Target device identifier.
    pub target: String,

    /// Interface search directories, in priority order.
    pub interface_dirs: Vec<PathBuf>,

    /// Source search directories, in priority order.
    pub source_dirs: Vec<PathBuf>,

    /// Extra C compiler flags, space-joined.
    pub cflags: String,

    /// Extra C++ compiler flags, space-joined.
    pub cxxflags: String,

    /// Extra linker flags, space-joined.
    pub ldflags: String,

    /// Extra diagnostic output.
    pub verbose: bool,

    /// Build the component library for use without the executable builder.
    pub stand_alone: bool,

    /// Ignore any existing build script, regenerate everything, and exit
    /// without running the external executor.
    pub no_ninja: bool,

    /// Only generate code; don't compile or link anything.
    pub codegen_only: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        BuildParams {
            lib_output_dir: PathBuf::from("."),
            object_dir: PathBuf::from("_build"),
            target: "local".to_string(),
            interface_dirs: Vec::new(),
            source_dirs: Vec::new(),
            cflags: String::new(),
            cxxflags: String::new(),
            ldflags: String::new(),
            verbose: false,
            stand_alone: false,
            no_ninja: false,
            codegen_only: false,
        }
    }
}

impl BuildParams {
    /// Create parameters with all defaults.
    pub fn new() -> Self {
        BuildParams::default()
    }

    /// Accumulate an extra C compiler flag.
    pub fn add_cflag(&mut self, flag: &str) {
        self.cflags.push(' ');
        self.cflags.push_str(flag);
    }

    /// Accumulate an extra C++ compiler flag.
    pub fn add_cxxflag(&mut self, flag: &str) {
        self.cxxflags.push(' ');
        self.cxxflags.push_str(flag);
    }

    /// Accumulate an extra linker flag.
    pub fn add_ldflag(&mut self, flag: &str) {
        self.ldflags.push(' ');
        self.ldflags.push_str(flag);
    }

    /// Append the implicit search directories: the current directory for
    /// both lists, and the framework's interface directory when a
    /// framework root is configured.
    pub fn finalize_search_dirs(&mut self) {
        self.source_dirs.push(PathBuf::from("."));
        self.interface_dirs.push(PathBuf::from("."));

        if let Some(root) = env::framework_root() {
            self.interface_dirs.push(Path::new(&root).join("interfaces"));
        }
    }

    /// Path of the emitted build script.
    pub fn script_path(&self) -> PathBuf {
        self.object_dir.join("build.ninja")
    }

    /// Path of the saved invocation record.
    pub fn record_path(&self) -> PathBuf {
        self.object_dir.join(".slipway-invocation.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = BuildParams::new();
        assert_eq!(params.lib_output_dir, PathBuf::from("."));
        assert_eq!(params.object_dir, PathBuf::from("_build"));
        assert_eq!(params.target, "local");
        assert!(!params.stand_alone);
    }

    #[test]
    fn test_flag_accumulation_is_space_joined() {
        let mut params = BuildParams::new();
        params.add_cflag("-O2");
        params.add_cflag("-Wall");

        assert_eq!(params.cflags, " -O2 -Wall");
    }

    #[test]
    fn test_finalize_appends_current_dir() {
        let mut params = BuildParams::new();
        params.source_dirs.push(PathBuf::from("components"));
        params.finalize_search_dirs();

        assert_eq!(params.source_dirs.last(), Some(&PathBuf::from(".")));
        assert!(params.interface_dirs.contains(&PathBuf::from(".")));
    }

    #[test]
    fn test_derived_paths() {
        let mut params = BuildParams::new();
        params.object_dir = PathBuf::from("out");

        assert_eq!(params.script_path(), PathBuf::from("out/build.ninja"));
        assert_eq!(
            params.record_path(),
            PathBuf::from("out/.slipway-invocation.json")
        );
    }
}
