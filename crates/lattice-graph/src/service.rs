//! ---
//! lat_section: "01-graph-kernel"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Shared graph service handle exposed to fixtures and extensions."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::info;

use crate::exec::{execute_statements, StatementResult};
use crate::parser::parse_statements;
use crate::procedures::{Procedure, ProcedureRegistry, UserAggregation, UserFunction};
use crate::store::{load_store, save_store, GraphStore, Node, NodeId, RelId};
use crate::value::Value;
use crate::Result;

/// Cloneable handle over a shared graph store and component registry.
///
/// This is the service handed to fixture callbacks, kernel extensions, and
/// the HTTP surface. All mutation goes through the store lock; the registry
/// is only written during harness start-up.
#[derive(Debug, Clone, Default)]
pub struct GraphService {
    store: Arc<RwLock<GraphStore>>,
    registry: Arc<RwLock<ProcedureRegistry>>,
}

impl GraphService {
    /// Create a service over an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service over a pre-populated store.
    pub fn with_store(store: GraphStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            registry: Arc::new(RwLock::new(ProcedureRegistry::new())),
        }
    }

    /// Parse and execute statement text, returning one result per statement.
    pub fn execute(&self, text: &str) -> Result<Vec<StatementResult>> {
        let statements = parse_statements(text)?;
        let registry = self.registry.read().clone();
        let mut store = self.store.write();
        execute_statements(&mut store, &registry, &statements)
    }

    /// Create a node directly, bypassing the statement dialect.
    pub fn create_node(
        &self,
        labels: Vec<String>,
        properties: IndexMap<String, Value>,
    ) -> NodeId {
        self.store.write().create_node(labels, properties)
    }

    /// Create a relationship directly, bypassing the statement dialect.
    pub fn create_relationship(
        &self,
        rel_type: impl Into<String>,
        start: NodeId,
        end: NodeId,
        properties: IndexMap<String, Value>,
    ) -> Result<RelId> {
        self.store
            .write()
            .create_relationship(rel_type, start, end, properties)
    }

    /// Number of nodes in the store.
    pub fn node_count(&self) -> usize {
        self.store.read().node_count()
    }

    /// Number of relationships in the store.
    pub fn relationship_count(&self) -> usize {
        self.store.read().relationship_count()
    }

    /// Cloned nodes matching the given labels and exact property values.
    pub fn match_nodes(
        &self,
        labels: &[String],
        properties: &IndexMap<String, Value>,
    ) -> Vec<Node> {
        self.store
            .read()
            .match_nodes(labels, properties)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Evaluate a registered user function by name.
    pub fn call_function(&self, name: &str, args: &[Value]) -> Result<Value> {
        let function = self
            .registry
            .read()
            .function(name)
            .ok_or_else(|| crate::GraphError::UnknownFunction(name.to_owned()))?;
        function.evaluate(args)
    }

    /// Register a procedure on the shared registry.
    pub fn register_procedure(&self, procedure: Arc<dyn Procedure>) {
        self.registry.write().register_procedure(procedure);
    }

    /// Register a user function on the shared registry.
    pub fn register_function(&self, function: Arc<dyn UserFunction>) {
        self.registry.write().register_function(function);
    }

    /// Register an aggregation on the shared registry.
    pub fn register_aggregation(&self, aggregation: Arc<dyn UserAggregation>) {
        self.registry.write().register_aggregation(aggregation);
    }

    /// Names of registered procedures, in registration order.
    pub fn procedure_names(&self) -> Vec<String> {
        self.registry.read().procedure_names()
    }

    /// Persist the store to a hash-verified snapshot file.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let store = self.store.read();
        save_store(&store, path)?;
        info!(path = %path.display(), "graph store persisted");
        Ok(())
    }

    /// Replace the store contents from a snapshot file.
    pub fn restore(&self, path: &Path) -> Result<()> {
        let loaded = load_store(path)?;
        info!(path = %path.display(), nodes = loaded.node_count(), "graph store restored");
        *self.store.write() = loaded;
        Ok(())
    }

    /// Run a closure with read access to the raw store.
    pub fn read<R>(&self, f: impl FnOnce(&GraphStore) -> R) -> R {
        f(&self.store.read())
    }
}
