//! ---
//! lat_section: "02-harness-configuration"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Fixture descriptors replayed at harness start."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lattice_graph::GraphService;

use crate::{ConfigError, Result};

/// File extension recognized when expanding fixture directories.
pub const CYPHER_FIXTURE_EXTENSION: &str = "cyp";

/// Callback fixture operating directly on the graph service.
pub type FixtureFn = Arc<dyn Fn(&GraphService) -> anyhow::Result<()> + Send + Sync>;

/// A unit of pre-populated data or setup logic, applied in registration
/// order when the harness starts.
#[derive(Clone)]
pub enum Fixture {
    /// A statement file, or a directory of `.cyp` files applied in
    /// file-name order.
    CypherFile(PathBuf),
    /// Inline statement text.
    Inline(String),
    /// User callback invoked with the running graph service.
    Callback(FixtureFn),
}

impl Fixture {
    /// Short descriptor used in lifecycle logging.
    pub fn describe(&self) -> String {
        match self {
            Fixture::CypherFile(path) => format!("file {}", path.display()),
            Fixture::Inline(text) => {
                let head: String = text.chars().take(32).collect();
                format!("inline `{head}`")
            }
            Fixture::Callback(_) => "callback".to_owned(),
        }
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fixture::CypherFile(path) => f.debug_tuple("CypherFile").field(path).finish(),
            Fixture::Inline(text) => f.debug_tuple("Inline").field(text).finish(),
            Fixture::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Expand a fixture path into the statement files it denotes.
///
/// A plain file expands to itself. A directory expands to the `.cyp` files
/// directly inside it, sorted by file name so replay order is stable across
/// platforms. A missing path is an error, surfaced at harness start.
pub fn cypher_files_in(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(ConfigError::MissingFixture(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();
        let is_cypher = entry_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(CYPHER_FIXTURE_EXTENSION));
        if entry_path.is_file() && is_cypher {
            files.push(entry_path);
        }
    }
    files.sort();
    Ok(files)
}
