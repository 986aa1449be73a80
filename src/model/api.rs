//! API file registry and include graph.
//!
//! Every `.api` interface definition referenced during one invocation is
//! represented by exactly one [`ApiFile`] held in an [`ApiRegistry`]. The
//! registry is an explicitly passed context object owned by the build
//! orchestrator; it is never global, so independent invocations in one
//! process cannot observe each other's state.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use regex::Regex;

use crate::util::diagnostic::{
    ApiFileNotFoundError, ApiIncludeCycleError, DuplicateApiFileError,
};
use crate::util::fs;
use crate::util::hash::sha256_str;

/// Identifier of an [`ApiFile`] within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiId(usize);

/// One IPC interface definition file, identified by canonical path.
#[derive(Debug)]
pub struct ApiFile {
    /// Canonical absolute path to the .api file.
    path: PathBuf,

    /// Default prefix for generated code identifiers and files.
    default_prefix: String,

    /// Other .api files this one uses types from, in declaration order.
    includes: Vec<ApiId>,

    /// true if this .api file is pulled in by another one via USETYPES.
    is_included: bool,

    /// Code generation directory, relative to the object directory root.
    codegen_dir: PathBuf,
}

impl ApiFile {
    fn new(path: PathBuf) -> Self {
        let default_prefix = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        // A short path digest keeps generation directories distinct for
        // same-named .api files from different directories.
        let digest = sha256_str(&path.to_string_lossy());
        let codegen_dir =
            PathBuf::from("api").join(format!("{}-{}", default_prefix, &digest[..8]));

        ApiFile {
            path,
            default_prefix,
            includes: Vec::new(),
            is_included: false,
            codegen_dir,
        }
    }

    /// Canonical absolute path of the .api file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default identifier prefix (the file stem).
    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    /// The .api files this one uses types from.
    pub fn includes(&self) -> &[ApiId] {
        &self.includes
    }

    /// Whether another .api file includes this one via USETYPES.
    pub fn is_included(&self) -> bool {
        self.is_included
    }

    /// Code generation directory, relative to the object directory root.
    pub fn codegen_dir(&self) -> &Path {
        &self.codegen_dir
    }

    /// Client-side interface header generated for `internal_name`.
    pub fn client_interface_file(&self, internal_name: &str) -> PathBuf {
        self.codegen_dir
            .join("client")
            .join(format!("{}_interface.h", internal_name))
    }

    /// Client-side local header included by the generated client code.
    pub fn client_internal_header(&self, internal_name: &str) -> PathBuf {
        self.codegen_dir
            .join("client")
            .join(format!("{}_local.h", internal_name))
    }

    /// Generated client-side source file.
    pub fn client_source_file(&self, internal_name: &str) -> PathBuf {
        self.codegen_dir
            .join("client")
            .join(format!("{}_client.c", internal_name))
    }

    /// Server-side interface header generated for `internal_name`.
    pub fn server_interface_file(&self, internal_name: &str) -> PathBuf {
        self.codegen_dir
            .join("server")
            .join(format!("{}_server.h", internal_name))
    }

    /// Server-side local header included by the generated server code.
    pub fn server_internal_header(&self, internal_name: &str) -> PathBuf {
        self.codegen_dir
            .join("server")
            .join(format!("{}_local.h", internal_name))
    }

    /// Generated server-side source file.
    pub fn server_source_file(&self, internal_name: &str) -> PathBuf {
        self.codegen_dir
            .join("server")
            .join(format!("{}_server.c", internal_name))
    }

    /// Server-side interface header for the asynchronous mode of operation.
    pub fn async_server_interface_file(&self, internal_name: &str) -> PathBuf {
        self.codegen_dir
            .join("async_server")
            .join(format!("{}_server.h", internal_name))
    }

    /// Generated server-side source file for the asynchronous mode.
    pub fn async_server_source_file(&self, internal_name: &str) -> PathBuf {
        self.codegen_dir
            .join("async_server")
            .join(format!("{}_server.c", internal_name))
    }
}

/// Registry of every API file referenced during one invocation.
///
/// Holds the single unique [`ApiFile`] object per canonical path. Scoped to
/// one build invocation; construct a fresh registry for each.
#[derive(Debug, Default)]
pub struct ApiRegistry {
    files: Vec<ApiFile>,
    by_path: BTreeMap<PathBuf, ApiId>,
}

impl ApiRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        ApiRegistry::default()
    }

    /// Get a pre-existing API file object for the .api file at `path`.
    pub fn get(&self, path: &Path) -> Option<ApiId> {
        self.by_path.get(path).copied()
    }

    /// Create a new API file object for the .api file at `path`.
    ///
    /// Fails if an object for that canonical path already exists.
    pub fn create(&mut self, path: &Path) -> Result<ApiId> {
        if self.by_path.contains_key(path) {
            return Err(DuplicateApiFileError {
                path: path.to_path_buf(),
            }
            .into());
        }

        let id = ApiId(self.files.len());
        self.files.push(ApiFile::new(path.to_path_buf()));
        self.by_path.insert(path.to_path_buf(), id);
        Ok(id)
    }

    /// Access an API file by id.
    pub fn file(&self, id: ApiId) -> &ApiFile {
        &self.files[id.0]
    }

    /// Number of registered API files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Enumerate all registered API files in canonical path order.
    pub fn all(&self) -> impl Iterator<Item = (&Path, ApiId)> {
        self.by_path.iter().map(|(path, id)| (path.as_path(), *id))
    }

    /// Load the .api file referenced as `api`, reusing an existing object.
    ///
    /// Relative references are resolved against the interface search
    /// directories, first match wins. Loading a new file scans it for
    /// `USETYPES` lines and recursively loads the included definitions,
    /// marking them as included.
    pub fn load(
        &mut self,
        api: &str,
        referrer: &str,
        interface_dirs: &[PathBuf],
    ) -> Result<ApiId> {
        let path = resolve_api_path(api, referrer, interface_dirs)?;

        if let Some(id) = self.get(&path) {
            return Ok(id);
        }

        let id = self.create(&path)?;
        tracing::debug!("registered API file {}", path.display());

        let text = fs::read_to_string(&path)?;
        let mut includes = Vec::new();

        for name in scan_usetypes(&text) {
            // Included files are searched relative to the including file's
            // directory first, then the interface search path.
            let mut dirs = Vec::with_capacity(interface_dirs.len() + 1);
            if let Some(parent) = path.parent() {
                dirs.push(parent.to_path_buf());
            }
            dirs.extend(interface_dirs.iter().cloned());

            let child = self.load(&name, &path.to_string_lossy(), &dirs)?;
            self.files[child.0].is_included = true;
            includes.push(child);
        }

        self.files[id.0].includes = includes;
        Ok(id)
    }

    /// Check that the USETYPES include relation is a DAG.
    ///
    /// Mutual type inclusion has no meaningful header ordering, so a cycle
    /// is a fatal model error.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let mut graph = DiGraph::<ApiId, ()>::new();

        let nodes: Vec<_> = (0..self.files.len())
            .map(|i| graph.add_node(ApiId(i)))
            .collect();

        for (i, file) in self.files.iter().enumerate() {
            for &inc in &file.includes {
                graph.add_edge(nodes[i], nodes[inc.0], ());
            }
        }

        toposort(&graph, None).map_err(|cycle| ApiIncludeCycleError {
            path: self.files[cycle.node_id().index()].path.clone(),
        })?;

        Ok(())
    }

    /// Collect the client-side interface headers generated for every .api
    /// file transitively included by `id`. Results are added to `results`.
    pub fn client_usetypes_headers(&self, id: ApiId, results: &mut BTreeSet<PathBuf>) {
        for &inc in self.file(id).includes() {
            let file = self.file(inc);
            if results.insert(file.client_interface_file(file.default_prefix())) {
                self.client_usetypes_headers(inc, results);
            }
        }
    }

    /// Collect the server-side interface headers generated for every .api
    /// file transitively included by `id`. Results are added to `results`.
    pub fn server_usetypes_headers(&self, id: ApiId, results: &mut BTreeSet<PathBuf>) {
        for &inc in self.file(id).includes() {
            let file = self.file(inc);
            if results.insert(file.server_interface_file(file.default_prefix())) {
                self.server_usetypes_headers(inc, results);
            }
        }
    }
}

/// Resolve an .api reference to a canonical absolute path.
fn resolve_api_path(api: &str, referrer: &str, interface_dirs: &[PathBuf]) -> Result<PathBuf> {
    // References may omit the extension.
    let name = if api.ends_with(".api") {
        api.to_string()
    } else {
        format!("{}.api", api)
    };

    let as_path = Path::new(&name);
    if as_path.is_absolute() {
        if as_path.is_file() {
            return Ok(fs::normalize_path(as_path));
        }
    } else {
        for dir in interface_dirs {
            let candidate = dir.join(&name);
            if candidate.is_file() {
                return Ok(fs::normalize_path(&candidate));
            }
        }
    }

    Err(ApiFileNotFoundError {
        api: api.to_string(),
        referrer: referrer.to_string(),
    }
    .into())
}

/// Extract USETYPES inclusion names from .api file text.
fn scan_usetypes(text: &str) -> Vec<String> {
    let re = Regex::new(r"(?m)^\s*USETYPES\s+([A-Za-z0-9_][A-Za-z0-9_.\-]*)\s*;").unwrap();
    re.captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}
