//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
///
/// The destination is truncated and rewritten whole, never patched in place.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob::glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
/// Returns the path as-is if canonicalization fails.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a/b/c.txt");

        write_string(&path, "content").unwrap();

        assert_eq!(read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_write_string_truncates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("file.txt");

        write_string(&path, "a much longer first version").unwrap();
        write_string(&path, "short").unwrap();

        assert_eq!(read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_glob_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("main.c"), "int main() {}").unwrap();
        std::fs::write(tmp.path().join("util.c"), "void util() {}").unwrap();
        std::fs::write(tmp.path().join("readme.txt"), "readme").unwrap();

        let files = glob_files(tmp.path(), &["*.c".to_string()]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_normalize_path_missing_file() {
        let path = Path::new("/nonexistent/by/construction");
        assert_eq!(normalize_path(path), path.to_path_buf());
    }

    #[test]
    fn test_relative_path() {
        let base = Path::new("/work/build");
        let path = Path::new("/work/build/components/foo");
        assert_eq!(relative_path(base, path), PathBuf::from("components/foo"));
    }
}
