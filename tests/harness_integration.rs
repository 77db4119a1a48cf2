//! ---
//! lat_section: "05-testing-qa"
//! lat_subsection: "integration-tests"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "End-to-end harness suites exercising the full builder-to-HTTP path."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
//! Full-stack scenarios: a harness is configured through the fluent surface,
//! started, and then exercised over its embedded HTTP server the way a test
//! suite of a downstream project would.

use std::fs;
use std::sync::Arc;

use lattice_config::{
    ExtensionRequest, ExtensionResponse, UnmanagedExtension, SETTING_DB_NAME,
    SETTING_PERSIST_ON_SHUTDOWN,
};
use lattice_graph::{GraphService, GraphStore, Procedure, StatementResult, Value};
use lattice_harness::HarnessBuilder;
use tempfile::tempdir;

fn base_uri(harness: &lattice_harness::Harness) -> String {
    harness.http_uri().expect("embedded server should be running")
}

#[test]
fn http_execute_round_trip() {
    let harness = HarnessBuilder::new()
        .with_config(SETTING_DB_NAME, "movies")
        .with_fixture_statement("CREATE (:Movie {title: 'Heat'})")
        .build()
        .start()
        .unwrap();

    let client = reqwest::blocking::Client::new();
    let response: serde_json::Value = client
        .post(format!("{}/db/execute", base_uri(&harness)))
        .json(&serde_json::json!({
            "statements": [
                "CREATE (:Movie {title: 'Ronin'})",
                "MATCH (m:Movie) RETURN count(m)",
            ]
        }))
        .send()
        .unwrap()
        .json()
        .unwrap();

    assert_eq!(response["results"][0]["kind"], "created");
    assert_eq!(response["results"][0]["nodes"], 1);
    assert_eq!(response["results"][1]["value"], 2);

    // HTTP writes land in the same store the in-process handle sees.
    assert_eq!(harness.graph().node_count(), 2);

    let status: serde_json::Value = client
        .get(format!("{}/status", base_uri(&harness)))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(status["database"], "movies");
    assert_eq!(status["nodes"], 2);
}

struct NeighborLookup;

impl UnmanagedExtension for NeighborLookup {
    fn handle(&self, graph: &GraphService, request: ExtensionRequest) -> ExtensionResponse {
        match request.path.as_str() {
            "/count" => ExtensionResponse::ok(serde_json::json!({
                "nodes": graph.node_count(),
                "relationships": graph.relationship_count(),
            })),
            other => ExtensionResponse::not_found(format!("no route {other}")),
        }
    }
}

#[test]
fn unmanaged_extension_serves_below_its_mount() {
    let harness = HarnessBuilder::new()
        .with_fixture_statement("CREATE (:A)-[:KNOWS]->(:B)")
        .with_unmanaged_extension("/ext/graph", Arc::new(NeighborLookup))
        .build()
        .start()
        .unwrap();

    let client = reqwest::blocking::Client::new();
    let counts: serde_json::Value = client
        .get(format!("{}/ext/graph/count", base_uri(&harness)))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(counts["nodes"], 2);
    assert_eq!(counts["relationships"], 1);

    let missing = client
        .get(format!("{}/ext/graph/nope", base_uri(&harness)))
        .send()
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[test]
fn disabled_server_still_serves_in_process_queries() {
    let harness = HarnessBuilder::new()
        .with_disabled_server()
        .with_fixture_statement("CREATE (:Only)")
        .build()
        .start()
        .unwrap();

    assert!(harness.http_uri().is_none());
    assert!(harness.addr().is_none());
    let rows = harness.execute("MATCH (n:Only) RETURN count(n)").unwrap();
    assert_eq!(
        rows,
        vec![StatementResult::Value {
            value: Value::Int(1)
        }]
    );
}

struct TagAll;

impl Procedure for TagAll {
    fn name(&self) -> &str {
        "test.tag"
    }

    fn invoke(
        &self,
        store: &mut GraphStore,
        args: &[Value],
    ) -> lattice_graph::Result<Vec<Vec<Value>>> {
        let label = args
            .first()
            .and_then(Value::as_str)
            .unwrap_or("Tagged")
            .to_owned();
        store.create_node(vec![label], indexmap::IndexMap::new());
        Ok(Vec::new())
    }
}

#[test]
fn fixtures_of_all_kinds_apply_in_registration_order() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("seed.cyp"), "CREATE (:FromFile)").unwrap();

    let harness = HarnessBuilder::new()
        .with_disabled_server()
        .with_procedure(Arc::new(TagAll))
        .with_fixture(dir.path().join("seed.cyp"))
        .with_fixture_fn(|graph: &GraphService| {
            anyhow::ensure!(graph.node_count() == 1, "file fixture must run first");
            graph.execute("CREATE (:FromCallback)")?;
            Ok(())
        })
        .with_fixture_statement("CALL test.tag('FromProcedure')")
        .build()
        .start()
        .unwrap();

    assert_eq!(harness.graph().node_count(), 3);
    for label in ["FromFile", "FromCallback", "FromProcedure"] {
        let rows = harness
            .execute(&format!("MATCH (n:{label}) RETURN count(n)"))
            .unwrap();
        assert_eq!(
            rows,
            vec![StatementResult::Value {
                value: Value::Int(1)
            }]
        );
    }
}

#[test]
fn copy_from_carries_a_persisted_store_into_a_new_instance() {
    let base = tempdir().unwrap();
    let seeded = HarnessBuilder::new()
        .with_working_dir(base.path())
        .with_disabled_server()
        .with_fixture_statement("CREATE (:Keep {id: 1}), (:Keep {id: 2}), (:Keep {id: 3})")
        .build()
        .start()
        .unwrap();
    let source = seeded.working_dir().to_path_buf();
    seeded.shutdown().unwrap();

    let restored = HarnessBuilder::new()
        .with_disabled_server()
        .copy_from(&source)
        .with_fixture_statement("CREATE (:Fresh)")
        .build()
        .start()
        .unwrap();

    // Copied store first, then fixtures on top of it.
    assert_eq!(restored.graph().node_count(), 4);
}

#[test]
fn persist_on_shutdown_can_be_turned_off_through_settings() {
    let base = tempdir().unwrap();
    let harness = HarnessBuilder::new()
        .with_working_dir(base.path())
        .with_disabled_server()
        .with_config(SETTING_PERSIST_ON_SHUTDOWN, "false")
        .with_fixture_statement("CREATE (:Transient)")
        .build()
        .start()
        .unwrap();
    let working_dir = harness.working_dir().to_path_buf();
    harness.shutdown().unwrap();
    assert!(!working_dir.join("data/databases/graph/store.json").exists());
}
