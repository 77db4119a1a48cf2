//! ---
//! lat_section: "01-graph-kernel"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Procedure, function, and aggregation registry."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::store::GraphStore;
use crate::value::Value;
use crate::Result;

/// A named, side-effecting routine invoked via `CALL name(args...)`.
///
/// Procedures receive mutable access to the store and may yield result rows.
pub trait Procedure: Send + Sync {
    /// Dotted name the procedure is callable under.
    fn name(&self) -> &str;

    /// Invoke the procedure with evaluated arguments.
    fn invoke(&self, store: &mut GraphStore, args: &[Value]) -> Result<Vec<Vec<Value>>>;
}

/// A named pure function usable inside property-value expressions.
pub trait UserFunction: Send + Sync {
    /// Dotted name the function is callable under.
    fn name(&self) -> &str;

    /// Evaluate the function over its arguments.
    fn evaluate(&self, args: &[Value]) -> Result<Value>;
}

/// A named aggregation folding a projected property column.
pub trait UserAggregation: Send + Sync {
    /// Dotted name the aggregation is callable under.
    fn name(&self) -> &str;

    /// Fold the projected values into a single result.
    fn fold(&self, values: &[Value]) -> Result<Value>;
}

/// Registry of callable components, keyed by dotted name.
///
/// Registration order is preserved; re-registering a name replaces the
/// earlier entry, mirroring component re-registration in the harness builder.
#[derive(Default, Clone)]
pub struct ProcedureRegistry {
    procedures: IndexMap<String, Arc<dyn Procedure>>,
    functions: IndexMap<String, Arc<dyn UserFunction>>,
    aggregations: IndexMap<String, Arc<dyn UserAggregation>>,
}

impl ProcedureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a procedure, replacing any earlier entry with the same name.
    pub fn register_procedure(&mut self, procedure: Arc<dyn Procedure>) {
        let name = procedure.name().to_owned();
        if self.procedures.insert(name.clone(), procedure).is_some() {
            debug!(%name, "procedure re-registered");
        }
    }

    /// Register a user function, replacing any earlier entry with the same name.
    pub fn register_function(&mut self, function: Arc<dyn UserFunction>) {
        let name = function.name().to_owned();
        if self.functions.insert(name.clone(), function).is_some() {
            debug!(%name, "function re-registered");
        }
    }

    /// Register an aggregation, replacing any earlier entry with the same name.
    pub fn register_aggregation(&mut self, aggregation: Arc<dyn UserAggregation>) {
        let name = aggregation.name().to_owned();
        if self.aggregations.insert(name.clone(), aggregation).is_some() {
            debug!(%name, "aggregation re-registered");
        }
    }

    /// Look up a procedure by name.
    pub fn procedure(&self, name: &str) -> Option<Arc<dyn Procedure>> {
        self.procedures.get(name).map(Arc::clone)
    }

    /// Look up a user function by name.
    pub fn function(&self, name: &str) -> Option<Arc<dyn UserFunction>> {
        self.functions.get(name).map(Arc::clone)
    }

    /// Look up an aggregation by name.
    pub fn aggregation(&self, name: &str) -> Option<Arc<dyn UserAggregation>> {
        self.aggregations.get(name).map(Arc::clone)
    }

    /// Registered procedure names in registration order.
    pub fn procedure_names(&self) -> Vec<String> {
        self.procedures.keys().cloned().collect()
    }
}

impl std::fmt::Debug for ProcedureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcedureRegistry")
            .field("procedures", &self.procedures.len())
            .field("functions", &self.functions.len())
            .field("aggregations", &self.aggregations.len())
            .finish()
    }
}
