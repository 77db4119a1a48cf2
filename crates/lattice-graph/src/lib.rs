//! ---
//! lat_section: "01-graph-kernel"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Embedded property-graph kernel and statement dialect."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
//! The graph kernel backing the Lattice harness. It provides the in-memory
//! property-graph store, snapshot persistence, the procedure/function
//! registry, and the small statement dialect used to replay fixtures.
#![warn(missing_docs)]

/// Result alias used throughout the graph kernel.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error type for the graph kernel.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Wrapper for IO errors encountered while reading/writing store files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization issues.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// Reported when a statement fails to parse.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// 1-based line of the offending token.
        line: u32,
        /// 1-based column of the offending token.
        column: u32,
        /// Human-readable description of the failure.
        message: String,
    },
    /// Reported when a statement references an unbound alias.
    #[error("unknown alias `{0}`")]
    UnknownAlias(String),
    /// Reported when a CREATE pattern redeclares an already bound alias.
    #[error("alias `{0}` is already bound in this statement")]
    AliasRebound(String),
    /// Reported when a relationship endpoint does not exist in the store.
    #[error("node {0} does not exist")]
    MissingNode(u64),
    /// Reported when a CALL names an unregistered procedure.
    #[error("unknown procedure `{0}`")]
    UnknownProcedure(String),
    /// Reported when an expression names an unregistered function.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// Reported when a RETURN clause names an unregistered aggregation.
    #[error("unknown aggregation `{0}`")]
    UnknownAggregation(String),
    /// Reported when a registered procedure fails during invocation.
    #[error("procedure `{name}` failed: {message}")]
    ProcedureFailed {
        /// Name of the failing procedure.
        name: String,
        /// Failure detail supplied by the procedure.
        message: String,
    },
    /// Reported for statements that parse but are semantically invalid.
    #[error("invalid statement: {0}")]
    InvalidStatement(String),
    /// Reported when a store snapshot fails integrity verification.
    #[error("store snapshot hash mismatch")]
    SnapshotHashMismatch,
}

pub mod exec;
pub mod lexer;
pub mod parser;
pub mod procedures;
pub mod service;
pub mod store;
pub mod value;

pub use exec::StatementResult;
pub use parser::parse_statements;
pub use procedures::{Procedure, ProcedureRegistry, UserAggregation, UserFunction};
pub use service::GraphService;
pub use store::{load_store, save_store, GraphStore, Node, NodeId, RelId, Relationship};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_reports_position() {
        let err = GraphError::Parse {
            line: 2,
            column: 7,
            message: "expected `)`".to_owned(),
        };
        assert_eq!(format!("{err}"), "parse error at 2:7: expected `)`");
    }
}
