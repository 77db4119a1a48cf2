//! ---
//! lat_section: "04-harness-lifecycle"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Working-directory provisioning and store copy-in."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::debug;
use uuid::Uuid;
use walkdir::WalkDir;

const DATABASES_DIR: &str = "data/databases";
const STORE_FILE: &str = "store.json";

/// The directory a harness instance runs in.
///
/// A user-supplied base directory gets a fresh `harness-<uuid>` subdirectory
/// per instance and is left on disk after shutdown; without one, an ephemeral
/// temp directory is provisioned and removed when the workspace drops.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    _temp: Option<TempDir>,
}

impl Workspace {
    /// Provision a working directory for one harness instance.
    pub fn prepare(working_dir: Option<&Path>) -> Result<Self> {
        match working_dir {
            Some(base) => {
                let root = base.join(format!("harness-{}", Uuid::new_v4().simple()));
                fs::create_dir_all(&root).with_context(|| {
                    format!("unable to create working directory {}", root.display())
                })?;
                debug!(root = %root.display(), "working directory provisioned");
                Ok(Self { root, _temp: None })
            }
            None => {
                let temp = tempfile::Builder::new()
                    .prefix("lattice-harness-")
                    .tempdir()
                    .context("unable to create ephemeral working directory")?;
                let root = temp.path().to_path_buf();
                debug!(root = %root.display(), "ephemeral working directory provisioned");
                Ok(Self {
                    root,
                    _temp: Some(temp),
                })
            }
        }
    }

    /// Root of the working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True when the directory is removed on drop.
    pub fn is_ephemeral(&self) -> bool {
        self._temp.is_some()
    }

    /// Directory holding the named database.
    pub fn database_dir(&self, name: &str) -> PathBuf {
        self.root.join(DATABASES_DIR).join(name)
    }

    /// Snapshot file of the named database.
    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.database_dir(name).join(STORE_FILE)
    }
}

/// Recursively copy a directory tree into the destination, preserving
/// relative paths. Used for pre-populated store copy-in.
pub fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    if !source.is_dir() {
        anyhow::bail!("copy source {} is not a directory", source.display());
    }
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("failed to walk {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("walked entries live under the walk root");
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("unable to create directory {}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("unable to create directory {}", parent.display())
                })?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "unable to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    debug!(source = %source.display(), dest = %dest.display(), "store tree copied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn user_directory_gets_unique_subdirectories() {
        let base = tempdir().unwrap();
        let first = Workspace::prepare(Some(base.path())).unwrap();
        let second = Workspace::prepare(Some(base.path())).unwrap();
        assert_ne!(first.root(), second.root());
        assert!(!first.is_ephemeral());
        assert!(first.root().starts_with(base.path()));
    }

    #[test]
    fn ephemeral_directory_is_removed_on_drop() {
        let workspace = Workspace::prepare(None).unwrap();
        let root = workspace.root().to_path_buf();
        assert!(root.exists());
        assert!(workspace.is_ephemeral());
        drop(workspace);
        assert!(!root.exists());
    }

    #[test]
    fn copy_tree_preserves_relative_layout() {
        let source = tempdir().unwrap();
        fs::create_dir_all(source.path().join("data/databases/graph")).unwrap();
        fs::write(
            source.path().join("data/databases/graph/store.json"),
            b"{}",
        )
        .unwrap();
        fs::write(source.path().join("README"), b"hello").unwrap();

        let dest = tempdir().unwrap();
        copy_tree(source.path(), dest.path()).unwrap();
        assert!(dest.path().join("data/databases/graph/store.json").exists());
        assert!(dest.path().join("README").exists());
    }

    #[test]
    fn copy_tree_rejects_file_sources() {
        let source = tempdir().unwrap();
        let file = source.path().join("store.json");
        fs::write(&file, b"{}").unwrap();
        let dest = tempdir().unwrap();
        assert!(copy_tree(&file, dest.path()).is_err());
    }
}
