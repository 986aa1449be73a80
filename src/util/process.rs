//! Subprocess execution utilities.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute and return status only.
    pub fn status(&self) -> Result<ExitStatus> {
        let mut cmd = self.build_command();
        let status = cmd
            .status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))?;
        Ok(status)
    }

    /// Replace the current process with this command.
    ///
    /// On Unix this never returns on success; a returned value is always an
    /// error. On other platforms the command runs as a child and this
    /// process exits with the child's status.
    pub fn exec_replace(&self) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;

            let mut cmd = self.build_command();
            let err = cmd.exec();
            Err(anyhow::Error::from(err))
                .with_context(|| format!("failed to execute `{}`", self.display_command()))
        }

        #[cfg(not(unix))]
        {
            let status = self.status()?;
            std::process::exit(status.code().unwrap_or(1));
        }
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find the external build executor.
pub fn find_ninja() -> Option<PathBuf> {
    // Honor an explicit override first
    if let Ok(ninja) = std::env::var("NINJA") {
        if let Some(path) = find_executable(&ninja) {
            return Some(path);
        }
    }

    find_executable("ninja")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_builder_status() {
        let status = ProcessBuilder::new("true").status().unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("ninja").args(["-f", "_build/build.ninja"]);

        assert_eq!(pb.display_command(), "ninja -f _build/build.ninja");
    }

    #[test]
    fn test_builder_accessors() {
        let pb = ProcessBuilder::new("ninja")
            .arg("-f")
            .arg("build.ninja")
            .cwd("/tmp");

        assert_eq!(pb.get_program(), Path::new("ninja"));
        assert_eq!(pb.get_args(), &["-f".to_string(), "build.ninja".to_string()]);
    }
}
