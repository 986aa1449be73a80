//! Component manifest parsing.
//!
//! A component directory is identified by its `Component.toml` manifest,
//! which declares the component's sources and its use of IPC interfaces:
//!
//! ```toml
//! [component]
//! name = "sensorMgr"
//! sources = ["*.c"]
//!
//! [[uses]]          # data types only
//! api = "defs.api"
//!
//! [[requires]]      # client side
//! api = "data.api"
//! name = "dataSvc"
//!
//! [[provides]]      # server side
//! api = "cmd.api"
//! name = "cmdSvc"
//! async = false
//! manual-start = false
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::util::diagnostic::InvalidNameError;
use crate::util::fs;

/// The component manifest file name.
pub const MANIFEST_NAME: &str = "Component.toml";

/// Parsed `Component.toml`.
#[derive(Debug, Deserialize)]
pub struct ComponentManifest {
    /// The `[component]` section.
    pub component: ComponentSection,

    /// Interfaces used for their data types only.
    #[serde(default)]
    pub uses: Vec<TypesOnlyDecl>,

    /// Client-side interfaces.
    #[serde(default)]
    pub requires: Vec<ClientDecl>,

    /// Server-side interfaces.
    #[serde(default)]
    pub provides: Vec<ServerDecl>,
}

/// The `[component]` section.
#[derive(Debug, Deserialize)]
pub struct ComponentSection {
    /// Component name; becomes part of C identifiers in generated code.
    pub name: String,

    /// Source file patterns, relative to the component directory.
    #[serde(default)]
    pub sources: Vec<String>,
}

/// A `[[uses]]` declaration: types-only inclusion of an API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypesOnlyDecl {
    /// The .api file, resolved against the interface search path.
    pub api: String,

    /// Internal name; defaults to the api file stem.
    pub name: Option<String>,
}

/// A `[[requires]]` declaration: a client-side interface.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientDecl {
    /// The .api file, resolved against the interface search path.
    pub api: String,

    /// Internal name; defaults to the api file stem.
    pub name: Option<String>,

    /// Suppress the automatic service connection at startup.
    #[serde(default)]
    pub manual_start: bool,
}

/// A `[[provides]]` declaration: a server-side interface.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerDecl {
    /// The .api file, resolved against the interface search path.
    pub api: String,

    /// Internal name; defaults to the api file stem.
    pub name: Option<String>,

    /// Use the asynchronous mode of operation.
    #[serde(default, rename = "async")]
    pub async_mode: bool,

    /// Suppress the automatic service advertisement at startup.
    #[serde(default)]
    pub manual_start: bool,
}

impl ComponentManifest {
    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;

        let manifest: ComponentManifest = toml::from_str(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Check that every name that ends up in generated C code is a valid
    /// C identifier. This also makes the derived include guard injective
    /// over component names.
    fn validate(&self) -> Result<()> {
        check_identifier(&self.component.name)?;

        for name in self
            .uses
            .iter()
            .map(|d| d.interface_name())
            .chain(self.requires.iter().map(|d| d.interface_name()))
            .chain(self.provides.iter().map(|d| d.interface_name()))
        {
            check_identifier(name)?;
        }

        Ok(())
    }
}

impl TypesOnlyDecl {
    /// The declared internal name, or the api file stem.
    pub fn interface_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| default_interface_name(&self.api))
    }
}

impl ClientDecl {
    /// The declared internal name, or the api file stem.
    pub fn interface_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| default_interface_name(&self.api))
    }
}

impl ServerDecl {
    /// The declared internal name, or the api file stem.
    pub fn interface_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| default_interface_name(&self.api))
    }
}

/// Default internal name for an api reference: its file stem.
fn default_interface_name(api: &str) -> &str {
    let base = api.rsplit('/').next().unwrap_or(api);
    base.strip_suffix(".api").unwrap_or(base)
}

fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(InvalidNameError {
            name: name.to_string(),
        }
        .into())
    }
}
