//! ---
//! lat_section: "04-harness-lifecycle"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Handle to one running harness instance."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use lattice_config::EffectiveSettings;
use lattice_graph::{GraphService, StatementResult};
use lattice_server::ServerHandle;
use tracing::{info, warn};

use crate::workdir::Workspace;

/// A running in-process harness instance.
///
/// Dropping the handle shuts the instance down: the store is persisted when
/// the persist setting is on, the server stops, and an ephemeral working
/// directory is removed. Call [`shutdown`] to observe shutdown errors
/// instead of having them logged.
///
/// [`shutdown`]: Harness::shutdown
#[derive(Debug)]
pub struct Harness {
    graph: GraphService,
    settings: EffectiveSettings,
    workspace: Workspace,
    server: Option<ServerHandle>,
    closed: bool,
}

impl Harness {
    pub(crate) fn new(
        graph: GraphService,
        settings: EffectiveSettings,
        workspace: Workspace,
        server: Option<ServerHandle>,
    ) -> Self {
        Self {
            graph,
            settings,
            workspace,
            server,
            closed: false,
        }
    }

    /// The graph service backing this instance.
    pub fn graph(&self) -> &GraphService {
        &self.graph
    }

    /// Execute statement text against the instance.
    pub fn execute(&self, text: &str) -> lattice_graph::Result<Vec<StatementResult>> {
        self.graph.execute(text)
    }

    /// Base URI of the embedded server, when one is running.
    pub fn http_uri(&self) -> Option<String> {
        self.server.as_ref().map(ServerHandle::uri)
    }

    /// Bound server address, when one is running.
    pub fn addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(ServerHandle::addr)
    }

    /// Working directory of this instance.
    pub fn working_dir(&self) -> &Path {
        self.workspace.root()
    }

    /// Effective settings the instance was started with.
    pub fn settings(&self) -> &EffectiveSettings {
        &self.settings
    }

    /// Shut the instance down, surfacing persistence errors.
    pub fn shutdown(mut self) -> Result<()> {
        self.close()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(server) = self.server.take() {
            server.shutdown();
        }
        if self.settings.persist_on_shutdown {
            let snapshot = self.workspace.snapshot_path(&self.settings.database_name);
            self.graph
                .persist(&snapshot)
                .with_context(|| format!("failed to persist store {}", snapshot.display()))?;
        }
        info!(
            working_dir = %self.workspace.root().display(),
            ephemeral = self.workspace.is_ephemeral(),
            "harness instance stopped"
        );
        Ok(())
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "harness shutdown reported an error");
        }
    }
}
