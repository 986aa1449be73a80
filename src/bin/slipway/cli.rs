//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use slipway::{BuildParams, MakeOptions};

/// slipway - build a component library from its declared IPC interfaces
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path or name of the component to build
    pub component: String,

    /// Complete path of the component library to be built
    #[arg(short = 'o', long)]
    pub output_path: Option<PathBuf>,

    /// Directory for generated runtime libraries (ignored if -o given)
    #[arg(short = 'l', long, default_value = ".", value_name = "DIR")]
    pub lib_output_dir: PathBuf,

    /// Directory for intermediate build artifacts and generated sources
    #[arg(short = 'w', long = "object-dir", default_value = "_build", value_name = "DIR")]
    pub object_dir: PathBuf,

    /// Target device to build for
    #[arg(short = 't', long, default_value = "local")]
    pub target: String,

    /// Add a directory to the interface search path
    #[arg(short = 'i', long = "interface-search", value_name = "DIR")]
    pub interface_dirs: Vec<PathBuf>,

    /// Add a directory to the source search path
    #[arg(short = 's', long = "source-search", value_name = "DIR")]
    pub source_dirs: Vec<PathBuf>,

    /// Extra flag to pass to the C compiler
    #[arg(
        short = 'C',
        long = "cflags",
        value_name = "FLAG",
        allow_hyphen_values = true
    )]
    pub cflags: Vec<String>,

    /// Extra flag to pass to the C++ compiler
    #[arg(
        short = 'X',
        long = "cxxflags",
        value_name = "FLAG",
        allow_hyphen_values = true
    )]
    pub cxxflags: Vec<String>,

    /// Extra flag to pass to the linker
    #[arg(
        short = 'L',
        long = "ldflags",
        value_name = "FLAG",
        allow_hyphen_values = true
    )]
    pub ldflags: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Build the component library so it can be loaded and run without the
    /// executable builder
    #[arg(short = 'a', long)]
    pub stand_alone: bool,

    /// Ignore any existing build script, regenerate all output files, and
    /// exit without running the external executor
    #[arg(short = 'n', long)]
    pub no_ninja: bool,

    /// Only generate code; don't compile or link anything
    #[arg(short = 'g', long)]
    pub codegen_only: bool,
}

impl Cli {
    /// Turn parsed arguments into pipeline options.
    ///
    /// `argv` is the raw command line, preserved verbatim for the saved
    /// invocation record and the build script's regeneration rule.
    pub fn into_options(self, argv: Vec<String>) -> MakeOptions {
        let mut params = BuildParams {
            lib_output_dir: self.lib_output_dir,
            object_dir: self.object_dir,
            target: self.target,
            interface_dirs: self.interface_dirs,
            source_dirs: self.source_dirs,
            verbose: self.verbose,
            stand_alone: self.stand_alone,
            no_ninja: self.no_ninja,
            codegen_only: self.codegen_only,
            ..BuildParams::default()
        };

        for flag in &self.cflags {
            params.add_cflag(flag);
        }
        for flag in &self.cxxflags {
            params.add_cxxflag(flag);
        }
        for flag in &self.ldflags {
            params.add_ldflag(flag);
        }

        params.finalize_search_dirs();

        MakeOptions {
            component: self.component,
            output_path: self.output_path,
            params,
            argv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::parse_from(["slipway", "sensorMgr"]);
        assert_eq!(cli.component, "sensorMgr");
        assert_eq!(cli.target, "local");
        assert_eq!(cli.object_dir, PathBuf::from("_build"));
    }

    #[test]
    fn test_repeatable_flags_accumulate() {
        let cli = Cli::parse_from([
            "slipway", "sensorMgr", "-C", "-O2", "-C", "-Wall", "-L", "-lm",
        ]);

        let opts = cli.into_options(vec![]);
        assert_eq!(opts.params.cflags, " -O2 -Wall");
        assert_eq!(opts.params.ldflags, " -lm");
    }

    #[test]
    fn test_second_component_rejected() {
        assert!(Cli::try_parse_from(["slipway", "first", "second"]).is_err());
    }

    #[test]
    fn test_missing_component_rejected() {
        assert!(Cli::try_parse_from(["slipway"]).is_err());
    }

    #[test]
    fn test_search_dirs_get_implicit_entries() {
        let cli = Cli::parse_from(["slipway", "sensorMgr", "-s", "components"]);
        let opts = cli.into_options(vec![]);

        assert_eq!(opts.params.source_dirs[0], PathBuf::from("components"));
        assert!(opts.params.source_dirs.contains(&PathBuf::from(".")));
        assert!(opts.params.interface_dirs.contains(&PathBuf::from(".")));
    }
}
