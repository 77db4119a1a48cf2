//! ---
//! lat_section: "04-harness-lifecycle"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Public fluent builder and test-lifecycle extension."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use lattice_config::{ExtensionFactory, HarnessConfig, UnmanagedExtension, UnmanagedMount};
use lattice_graph::{GraphService, Procedure, UserAggregation, UserFunction};

use crate::builder::InProcessBuilder;
use crate::handle::Harness;

/// Fluent configuration surface of the harness.
///
/// Every method delegates to the internal [`InProcessBuilder`] and returns
/// the builder by value, so chains compose in any order. No method validates
/// or fails; problems surface when the built extension starts an instance.
/// `build` consumes the builder, which makes configuring after build a type
/// error rather than an undefined behavior.
#[derive(Debug, Default)]
pub struct HarnessBuilder {
    inner: InProcessBuilder,
}

impl HarnessBuilder {
    /// Start an empty configuration chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the harness under the provided base directory instead of an
    /// ephemeral temp directory. The directory is left on disk afterwards.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inner.set_working_dir(dir.into());
        self
    }

    /// Record an engine setting. Later writes for the same key win; the key
    /// is only validated when the instance starts.
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.set_config(key, value);
        self
    }

    /// Register a fixture file, or a directory whose `.cyp` files are
    /// applied in file-name order. Fixtures replay in registration order.
    pub fn with_fixture(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner.add_fixture_path(path.into());
        self
    }

    /// Register an inline statement fixture.
    pub fn with_fixture_statement(mut self, statement: impl Into<String>) -> Self {
        self.inner.add_fixture_statement(statement);
        self
    }

    /// Register a callback fixture operating on the graph service.
    pub fn with_fixture_fn<F>(mut self, fixture: F) -> Self
    where
        F: Fn(&GraphService) -> Result<()> + Send + Sync + 'static,
    {
        self.inner.add_fixture_fn(Arc::new(fixture));
        self
    }

    /// Register a procedure made callable through `CALL`.
    pub fn with_procedure(mut self, procedure: Arc<dyn Procedure>) -> Self {
        self.inner.add_procedure(procedure);
        self
    }

    /// Register a user function usable in statement expressions.
    pub fn with_function(mut self, function: Arc<dyn UserFunction>) -> Self {
        self.inner.add_function(function);
        self
    }

    /// Register an aggregation usable in `RETURN` projections.
    pub fn with_aggregation(mut self, aggregation: Arc<dyn UserAggregation>) -> Self {
        self.inner.add_aggregation(aggregation);
        self
    }

    /// Register a kernel extension initialized before fixtures run.
    pub fn with_extension_factory(mut self, factory: Arc<dyn ExtensionFactory>) -> Self {
        self.inner.add_extension_factory(factory);
        self
    }

    /// Mount an unmanaged extension at an HTTP path on the embedded server.
    pub fn with_unmanaged_extension(
        mut self,
        mount_path: impl Into<String>,
        extension: Arc<dyn UnmanagedExtension>,
    ) -> Self {
        self.inner
            .add_unmanaged_mount(UnmanagedMount::new(mount_path, extension));
        self
    }

    /// Disable the embedded HTTP server for instances of this extension.
    pub fn with_disabled_server(mut self) -> Self {
        self.inner.disable_server();
        self
    }

    /// Pre-populate instances with the store tree copied from the given
    /// directory. The source needs the `data/databases/<name>` layout a
    /// previous harness run leaves behind.
    pub fn copy_from(mut self, source: impl Into<PathBuf>) -> Self {
        self.inner.set_copy_from(source.into());
        self
    }

    /// Finalize the chain into a lifecycle extension.
    pub fn build(self) -> HarnessExtension {
        HarnessExtension {
            config: self.inner.config().clone(),
        }
    }
}

/// Test-lifecycle wrapper over an accumulated configuration.
///
/// The extension holds the record immutably; each [`start`] spins up a fresh,
/// independent instance from it, which maps onto start-before-test /
/// stop-after-test hooks of any test framework.
///
/// [`start`]: HarnessExtension::start
#[derive(Debug, Clone)]
pub struct HarnessExtension {
    config: HarnessConfig,
}

impl HarnessExtension {
    /// Start a configuration chain; equivalent to [`HarnessBuilder::new`].
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::new()
    }

    /// View of the recorded configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Start a fresh harness instance from the recorded configuration.
    pub fn start(&self) -> Result<Harness> {
        InProcessBuilder::from_config(self.config.clone()).start()
    }

    /// Run a closure inside one start/stop lifecycle.
    pub fn run<R>(&self, f: impl FnOnce(&Harness) -> R) -> Result<R> {
        let harness = self.start()?;
        let result = f(&harness);
        harness.shutdown()?;
        Ok(result)
    }
}
