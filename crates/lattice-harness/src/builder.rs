//! ---
//! lat_section: "04-harness-lifecycle"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Internal builder that turns a configuration record into a running harness."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use lattice_config::{
    cypher_files_in, EffectiveSettings, ExtensionFactory, Fixture, FixtureFn, HarnessConfig,
    UnmanagedMount,
};
use lattice_graph::{GraphService, Procedure, UserAggregation, UserFunction};
use lattice_server::spawn_server;
use tracing::{debug, info};

use crate::handle::Harness;
use crate::workdir::{copy_tree, Workspace};

/// Builder that assembles and starts an in-process harness instance.
///
/// This is where all deferred validation happens: settings resolution,
/// fixture path checks, and component wiring all run inside [`start`].
/// The mutating methods themselves never fail.
///
/// [`start`]: InProcessBuilder::start
#[derive(Debug, Default)]
pub struct InProcessBuilder {
    config: HarnessConfig,
}

impl InProcessBuilder {
    /// Create a builder over an empty configuration record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder over an existing configuration record.
    pub fn from_config(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// View of the accumulated record.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Set the base working directory.
    pub fn set_working_dir(&mut self, dir: PathBuf) {
        self.config.working_dir = Some(dir);
    }

    /// Record a raw setting; later writes for the same key win.
    pub fn set_config(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.settings.set(key, value);
    }

    /// Append a statement-file or directory fixture.
    pub fn add_fixture_path(&mut self, path: PathBuf) {
        self.config.fixtures.push(Fixture::CypherFile(path));
    }

    /// Append an inline statement fixture.
    pub fn add_fixture_statement(&mut self, statement: impl Into<String>) {
        self.config.fixtures.push(Fixture::Inline(statement.into()));
    }

    /// Append a callback fixture.
    pub fn add_fixture_fn(&mut self, fixture: FixtureFn) {
        self.config.fixtures.push(Fixture::Callback(fixture));
    }

    /// Append a procedure registration.
    pub fn add_procedure(&mut self, procedure: Arc<dyn Procedure>) {
        self.config.procedures.push(procedure);
    }

    /// Append a user function registration.
    pub fn add_function(&mut self, function: Arc<dyn UserFunction>) {
        self.config.functions.push(function);
    }

    /// Append an aggregation registration.
    pub fn add_aggregation(&mut self, aggregation: Arc<dyn UserAggregation>) {
        self.config.aggregations.push(aggregation);
    }

    /// Append a kernel extension factory.
    pub fn add_extension_factory(&mut self, factory: Arc<dyn ExtensionFactory>) {
        self.config.extension_factories.push(factory);
    }

    /// Append an unmanaged extension mount.
    pub fn add_unmanaged_mount(&mut self, mount: UnmanagedMount) {
        self.config.unmanaged_mounts.push(mount);
    }

    /// Disable the embedded HTTP server for this instance.
    pub fn disable_server(&mut self) {
        self.config.server_disabled = true;
    }

    /// Set the directory whose store tree is copied in before start.
    pub fn set_copy_from(&mut self, source: PathBuf) {
        self.config.copy_from = Some(source);
    }

    /// Start a harness instance from the accumulated record.
    pub fn start(self) -> Result<Harness> {
        let config = self.config;

        let settings = EffectiveSettings::resolve(&config.settings)
            .context("harness settings failed validation")?;
        let workspace = Workspace::prepare(config.working_dir.as_deref())
            .context("failed to provision harness working directory")?;

        if let Some(source) = &config.copy_from {
            copy_tree(source, workspace.root()).with_context(|| {
                format!("failed to copy store from {}", source.display())
            })?;
        }

        let snapshot = workspace.snapshot_path(&settings.database_name);
        let graph = GraphService::new();
        if snapshot.exists() {
            graph
                .restore(&snapshot)
                .with_context(|| format!("failed to open store {}", snapshot.display()))?;
        }

        for factory in &config.extension_factories {
            factory
                .init(&graph)
                .with_context(|| format!("extension `{}` failed to initialize", factory.name()))?;
            debug!(extension = factory.name(), "kernel extension initialized");
        }
        for procedure in &config.procedures {
            graph.register_procedure(Arc::clone(procedure));
        }
        for function in &config.functions {
            graph.register_function(Arc::clone(function));
        }
        for aggregation in &config.aggregations {
            graph.register_aggregation(Arc::clone(aggregation));
        }

        for fixture in &config.fixtures {
            apply_fixture(&graph, fixture)
                .with_context(|| format!("fixture {} failed", fixture.describe()))?;
        }

        let server = if config.server_disabled {
            debug!("embedded server disabled by configuration");
            None
        } else {
            Some(
                spawn_server(
                    graph.clone(),
                    settings.database_name.clone(),
                    settings.http_listen,
                    &config.unmanaged_mounts,
                )
                .context("failed to start embedded server")?,
            )
        };

        info!(
            working_dir = %workspace.root().display(),
            database = %settings.database_name,
            fixtures = config.fixtures.len(),
            server = server.is_some(),
            "harness instance started"
        );
        Ok(Harness::new(graph, settings, workspace, server))
    }
}

fn apply_fixture(graph: &GraphService, fixture: &Fixture) -> Result<()> {
    match fixture {
        Fixture::CypherFile(path) => {
            for file in cypher_files_in(path)? {
                let text = fs::read_to_string(&file)
                    .with_context(|| format!("unable to read fixture {}", file.display()))?;
                graph
                    .execute(&text)
                    .with_context(|| format!("fixture {} did not execute", file.display()))?;
                debug!(fixture = %file.display(), "fixture file applied");
            }
            Ok(())
        }
        Fixture::Inline(text) => {
            graph.execute(text).context("inline fixture did not execute")?;
            Ok(())
        }
        Fixture::Callback(callback) => callback(graph),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_config::SETTING_DB_NAME;

    #[test]
    fn start_rejects_unknown_settings() {
        let mut builder = InProcessBuilder::new();
        builder.set_config("dbms.bogus", "1");
        builder.disable_server();
        let err = builder.start().unwrap_err();
        assert!(format!("{err:#}").contains("dbms.bogus"));
    }

    #[test]
    fn start_rejects_missing_fixture_paths() {
        let mut builder = InProcessBuilder::new();
        builder.disable_server();
        builder.add_fixture_path(PathBuf::from("/nonexistent/seed.cyp"));
        let err = builder.start().unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/seed.cyp"));
    }

    #[test]
    fn later_config_writes_win() {
        let mut builder = InProcessBuilder::new();
        builder.set_config(SETTING_DB_NAME, "first");
        builder.set_config(SETTING_DB_NAME, "second");
        builder.disable_server();
        let harness = builder.start().unwrap();
        assert_eq!(harness.settings().database_name, "second");
    }

    #[test]
    fn fixtures_apply_in_registration_order() {
        let mut builder = InProcessBuilder::new();
        builder.disable_server();
        builder.add_fixture_statement("CREATE (:Seed {step: 1})");
        builder.add_fixture_fn(Arc::new(|graph: &GraphService| {
            // Relies on the inline fixture having run first.
            let count = graph.node_count();
            anyhow::ensure!(count == 1, "expected 1 node before callback, saw {count}");
            graph.execute("CREATE (:Seed {step: 2})")?;
            Ok(())
        }));
        let harness = builder.start().unwrap();
        assert_eq!(harness.graph().node_count(), 2);
    }
}
