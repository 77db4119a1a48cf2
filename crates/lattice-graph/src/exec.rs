//! ---
//! lat_section: "01-graph-kernel"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Statement executor over the store and registry."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::{Expr, NodePattern, ReturnClause, Statement};
use crate::procedures::ProcedureRegistry;
use crate::store::{GraphStore, Node, NodeId};
use crate::value::Value;
use crate::{GraphError, Result};

/// Outcome of executing one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatementResult {
    /// Counts produced by a `CREATE`.
    Created {
        /// Number of nodes created.
        nodes: usize,
        /// Number of relationships created.
        relationships: usize,
    },
    /// Matched nodes returned by `MATCH ... RETURN alias`.
    Rows {
        /// Cloned node rows in store order.
        rows: Vec<Node>,
    },
    /// Single value returned by an aggregation projection.
    Value {
        /// Aggregated value.
        value: Value,
    },
    /// Rows yielded by a `CALL`.
    Call {
        /// Procedure name.
        name: String,
        /// Result rows as yielded by the procedure.
        rows: Vec<Vec<Value>>,
    },
}

/// Execute parsed statements against a store and registry.
///
/// Alias bindings are scoped to a single statement; each `CREATE` starts with
/// an empty binding table.
pub fn execute_statements(
    store: &mut GraphStore,
    registry: &ProcedureRegistry,
    statements: &[Statement],
) -> Result<Vec<StatementResult>> {
    statements
        .iter()
        .map(|statement| execute_one(store, registry, statement))
        .collect()
}

fn execute_one(
    store: &mut GraphStore,
    registry: &ProcedureRegistry,
    statement: &Statement,
) -> Result<StatementResult> {
    match statement {
        Statement::Create(paths) => execute_create(store, registry, paths),
        Statement::Match { pattern, ret } => execute_match(store, registry, pattern, ret),
        Statement::Call { name, args } => execute_call(store, registry, name, args),
    }
}

fn execute_create(
    store: &mut GraphStore,
    registry: &ProcedureRegistry,
    paths: &[crate::parser::PathPattern],
) -> Result<StatementResult> {
    let mut aliases: IndexMap<String, NodeId> = IndexMap::new();
    let mut nodes = 0usize;
    let mut relationships = 0usize;

    for path in paths {
        let mut current = resolve_node(store, registry, &mut aliases, &path.start, &mut nodes)?;
        for (rel, end_pattern) in &path.segments {
            let end = resolve_node(store, registry, &mut aliases, end_pattern, &mut nodes)?;
            let properties = eval_properties(registry, &rel.properties)?;
            store.create_relationship(rel.rel_type.clone(), current, end, properties)?;
            relationships += 1;
            current = end;
        }
    }

    debug!(nodes, relationships, "create statement applied");
    Ok(StatementResult::Created {
        nodes,
        relationships,
    })
}

/// Resolve a node pattern inside a `CREATE`: a bare bound alias refers to the
/// existing node, anything else creates one.
fn resolve_node(
    store: &mut GraphStore,
    registry: &ProcedureRegistry,
    aliases: &mut IndexMap<String, NodeId>,
    pattern: &NodePattern,
    created: &mut usize,
) -> Result<NodeId> {
    if let Some(alias) = &pattern.alias {
        if let Some(id) = aliases.get(alias) {
            if !pattern.labels.is_empty() || !pattern.properties.is_empty() {
                return Err(GraphError::AliasRebound(alias.clone()));
            }
            return Ok(*id);
        }
    }
    let properties = eval_properties(registry, &pattern.properties)?;
    let id = store.create_node(pattern.labels.clone(), properties);
    *created += 1;
    if let Some(alias) = &pattern.alias {
        aliases.insert(alias.clone(), id);
    }
    Ok(id)
}

fn execute_match(
    store: &GraphStore,
    registry: &ProcedureRegistry,
    pattern: &NodePattern,
    ret: &ReturnClause,
) -> Result<StatementResult> {
    let filter = eval_properties(registry, &pattern.properties)?;
    let matched: Vec<Node> = store
        .match_nodes(&pattern.labels, &filter)
        .into_iter()
        .cloned()
        .collect();

    match ret {
        ReturnClause::Alias(alias) => {
            require_alias(pattern, alias)?;
            Ok(StatementResult::Rows { rows: matched })
        }
        ReturnClause::Aggregate {
            func,
            alias,
            property,
        } => {
            require_alias(pattern, alias)?;
            if func.eq_ignore_ascii_case("count") {
                return Ok(StatementResult::Value {
                    value: Value::Int(matched.len() as i64),
                });
            }
            let aggregation = registry
                .aggregation(func)
                .ok_or_else(|| GraphError::UnknownAggregation(func.clone()))?;
            let Some(property) = property else {
                return Err(GraphError::InvalidStatement(format!(
                    "aggregation `{func}` requires a property projection, e.g. {func}({alias}.prop)"
                )));
            };
            let column: Vec<Value> = matched
                .iter()
                .filter_map(|node| node.property(property).cloned())
                .collect();
            Ok(StatementResult::Value {
                value: aggregation.fold(&column)?,
            })
        }
    }
}

fn require_alias(pattern: &NodePattern, alias: &str) -> Result<()> {
    if pattern.alias.as_deref() == Some(alias) {
        Ok(())
    } else {
        Err(GraphError::UnknownAlias(alias.to_owned()))
    }
}

fn execute_call(
    store: &mut GraphStore,
    registry: &ProcedureRegistry,
    name: &str,
    args: &[Expr],
) -> Result<StatementResult> {
    let procedure = registry
        .procedure(name)
        .ok_or_else(|| GraphError::UnknownProcedure(name.to_owned()))?;
    let evaluated: Vec<Value> = args
        .iter()
        .map(|arg| eval_expr(registry, arg))
        .collect::<Result<_>>()?;
    let rows = procedure.invoke(store, &evaluated)?;
    debug!(procedure = name, rows = rows.len(), "procedure invoked");
    Ok(StatementResult::Call {
        name: name.to_owned(),
        rows,
    })
}

fn eval_properties(
    registry: &ProcedureRegistry,
    properties: &IndexMap<String, Expr>,
) -> Result<IndexMap<String, Value>> {
    properties
        .iter()
        .map(|(key, expr)| Ok((key.clone(), eval_expr(registry, expr)?)))
        .collect()
}

fn eval_expr(registry: &ProcedureRegistry, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::List(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| eval_expr(registry, item))
                .collect::<Result<_>>()?,
        )),
        Expr::FnCall { name, args } => {
            let function = registry
                .function(name)
                .ok_or_else(|| GraphError::UnknownFunction(name.clone()))?;
            let evaluated: Vec<Value> = args
                .iter()
                .map(|arg| eval_expr(registry, arg))
                .collect::<Result<_>>()?;
            function.evaluate(&evaluated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statements;
    use crate::procedures::{Procedure, UserAggregation, UserFunction};
    use std::sync::Arc;

    fn run(
        store: &mut GraphStore,
        registry: &ProcedureRegistry,
        text: &str,
    ) -> Result<Vec<StatementResult>> {
        let statements = parse_statements(text)?;
        execute_statements(store, registry, &statements)
    }

    #[test]
    fn create_binds_aliases_within_a_statement() {
        let mut store = GraphStore::new();
        let registry = ProcedureRegistry::new();
        let results = run(
            &mut store,
            &registry,
            "CREATE (a:Person {name: 'Ada'}), (b:Person {name: 'Bob'}), (a)-[:KNOWS]->(b)",
        )
        .unwrap();
        assert_eq!(
            results,
            vec![StatementResult::Created {
                nodes: 2,
                relationships: 1,
            }]
        );
        assert_eq!(store.relationship_count(), 1);
    }

    #[test]
    fn aliases_do_not_leak_across_statements() {
        let mut store = GraphStore::new();
        let registry = ProcedureRegistry::new();
        let err = run(
            &mut store,
            &registry,
            "CREATE (a:Person); CREATE (a)-[:KNOWS]->(a:Person)",
        )
        .unwrap_err();
        // The second statement re-creates `a`, then rejects the labelled
        // re-declaration of the bound alias.
        assert!(matches!(err, GraphError::AliasRebound(_)));
    }

    #[test]
    fn match_returns_filtered_rows() {
        let mut store = GraphStore::new();
        let registry = ProcedureRegistry::new();
        run(
            &mut store,
            &registry,
            "CREATE (:Person {name: 'Ada', age: 36}), (:Person {name: 'Bob', age: 41})",
        )
        .unwrap();
        let results = run(
            &mut store,
            &registry,
            "MATCH (n:Person {name: 'Ada'}) RETURN n",
        )
        .unwrap();
        let StatementResult::Rows { rows } = &results[0] else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].property("age"), Some(&Value::Int(36)));
    }

    #[test]
    fn count_is_built_in() {
        let mut store = GraphStore::new();
        let registry = ProcedureRegistry::new();
        run(&mut store, &registry, "CREATE (:A), (:A), (:B)").unwrap();
        let results = run(&mut store, &registry, "MATCH (n:A) RETURN count(n)").unwrap();
        assert_eq!(
            results,
            vec![StatementResult::Value {
                value: Value::Int(2)
            }]
        );
    }

    struct Sum;

    impl UserAggregation for Sum {
        fn name(&self) -> &str {
            "stats.sum"
        }

        fn fold(&self, values: &[Value]) -> Result<Value> {
            Ok(Value::Int(
                values.iter().filter_map(Value::as_int).sum::<i64>(),
            ))
        }
    }

    #[test]
    fn custom_aggregation_folds_property_column() {
        let mut store = GraphStore::new();
        let mut registry = ProcedureRegistry::new();
        registry.register_aggregation(Arc::new(Sum));
        run(
            &mut store,
            &registry,
            "CREATE (:P {age: 10}), (:P {age: 20}), (:P)",
        )
        .unwrap();
        let results = run(&mut store, &registry, "MATCH (n:P) RETURN stats.sum(n.age)").unwrap();
        assert_eq!(
            results,
            vec![StatementResult::Value {
                value: Value::Int(30)
            }]
        );
    }

    struct Upper;

    impl UserFunction for Upper {
        fn name(&self) -> &str {
            "text.upper"
        }

        fn evaluate(&self, args: &[Value]) -> Result<Value> {
            match args {
                [Value::Str(s)] => Ok(Value::Str(s.to_uppercase())),
                _ => Err(GraphError::InvalidStatement(
                    "text.upper takes one string".to_owned(),
                )),
            }
        }
    }

    #[test]
    fn functions_evaluate_inside_property_maps() {
        let mut store = GraphStore::new();
        let mut registry = ProcedureRegistry::new();
        registry.register_function(Arc::new(Upper));
        run(
            &mut store,
            &registry,
            "CREATE (:P {name: text.upper('ada')})",
        )
        .unwrap();
        let node = store.nodes().next().unwrap();
        assert_eq!(node.property("name"), Some(&Value::from("ADA")));
    }

    struct SeedPeople;

    impl Procedure for SeedPeople {
        fn name(&self) -> &str {
            "seed.people"
        }

        fn invoke(&self, store: &mut GraphStore, args: &[Value]) -> Result<Vec<Vec<Value>>> {
            for arg in args {
                let name = arg.as_str().ok_or_else(|| {
                    GraphError::InvalidStatement("seed.people takes strings".to_owned())
                })?;
                store.create_node(
                    vec!["Person".to_owned()],
                    indexmap::indexmap! {"name".to_owned() => Value::from(name)},
                );
            }
            Ok(vec![vec![Value::Int(args.len() as i64)]])
        }
    }

    #[test]
    fn call_invokes_registered_procedure() {
        let mut store = GraphStore::new();
        let mut registry = ProcedureRegistry::new();
        registry.register_procedure(Arc::new(SeedPeople));
        let results = run(&mut store, &registry, "CALL seed.people('ada', 'bob')").unwrap();
        assert_eq!(
            results,
            vec![StatementResult::Call {
                name: "seed.people".to_owned(),
                rows: vec![vec![Value::Int(2)]],
            }]
        );
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn call_to_unknown_procedure_fails() {
        let mut store = GraphStore::new();
        let registry = ProcedureRegistry::new();
        let err = run(&mut store, &registry, "CALL missing.proc()").unwrap_err();
        assert!(matches!(err, GraphError::UnknownProcedure(_)));
    }
}
