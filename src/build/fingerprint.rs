//! Invocation fingerprinting for the skip-regeneration fast path.
//!
//! A record of the full command line and the tracked environment variables
//! is saved next to the emitted build script. A later invocation whose
//! record compares exactly equal can skip model construction and code
//! generation and delegate straight to the external executor.
//!
//! The serialization is order-sensitive on purpose: `argv` keeps command
//! line order and `env` keeps the fixed tracked-variable order, so any
//! single-character change in any flag or variable defeats the comparison.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::env;
use crate::util::fs;
use crate::util::hash::Fingerprint;

/// What was asked of one invocation: arguments and environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Full command line, in order.
    pub argv: Vec<String>,

    /// Tracked environment variables, in fixed order. Unset variables are
    /// recorded as `None`.
    pub env: Vec<(String, Option<String>)>,
}

impl InvocationRecord {
    /// Capture the current invocation.
    pub fn current(argv: &[String]) -> Self {
        InvocationRecord {
            argv: argv.to_vec(),
            env: env::snapshot(),
        }
    }

    /// Load a previously saved record.
    ///
    /// A missing or unreadable record is reported as `None`: the fast path
    /// is an optimization, so anything short of a clean match means
    /// regeneration.
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;

        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(
                    "discarding unreadable invocation record {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Save the record for comparison by a future invocation.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write_string(path, &content)
    }

    /// Exact structural comparison against another record.
    pub fn matches(&self, other: &InvocationRecord) -> bool {
        self == other
    }

    /// Short content digest, for log lines.
    pub fn digest(&self) -> String {
        let mut fp = Fingerprint::new();
        fp.update_strs(self.argv.iter().map(|s| s.as_str()));
        for (name, value) in &self.env {
            fp.update_str(name);
            fp.update_opt(value.as_deref());
        }
        fp.finish_short()
    }
}
