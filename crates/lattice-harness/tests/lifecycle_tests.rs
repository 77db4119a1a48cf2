//! ---
//! lat_section: "04-harness-lifecycle"
//! lat_subsection: "integration-tests"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Lifecycle and fixture-replay tests for the harness crate."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::fs;
use std::sync::Arc;

use lattice_config::{ExtensionRequest, ExtensionResponse, UnmanagedExtension};
use lattice_graph::{GraphService, GraphStore, Procedure, Value};
use lattice_harness::HarnessBuilder;
use tempfile::tempdir;

#[test]
fn directory_fixtures_replay_in_file_name_order() {
    let fixtures = tempdir().unwrap();
    fs::write(
        fixtures.path().join("02-rel.cyp"),
        "MATCH (n:Person) RETURN count(n);\nCREATE (:Marker)",
    )
    .unwrap();
    fs::write(
        fixtures.path().join("01-people.cyp"),
        "CREATE (:Person {name: 'Ada'}), (:Person {name: 'Bob'})",
    )
    .unwrap();

    let harness = HarnessBuilder::new()
        .with_disabled_server()
        .with_fixture(fixtures.path())
        .build()
        .start()
        .unwrap();

    // 2 people from the first file plus the marker from the second.
    assert_eq!(harness.graph().node_count(), 3);
}

#[test]
fn inline_and_callback_fixtures_interleave_in_registration_order() {
    let harness = HarnessBuilder::new()
        .with_disabled_server()
        .with_fixture_statement("CREATE (:Step {n: 1})")
        .with_fixture_fn(|graph: &GraphService| {
            anyhow::ensure!(graph.node_count() == 1, "callback must run second");
            graph.execute("CREATE (:Step {n: 2})")?;
            Ok(())
        })
        .with_fixture_statement("CREATE (:Step {n: 3})")
        .build()
        .start()
        .unwrap();

    assert_eq!(harness.graph().node_count(), 3);
}

#[test]
fn copy_from_pre_populates_a_fresh_instance() {
    let base = tempdir().unwrap();

    // First run: seed and persist a store under a known working directory.
    let seeded = HarnessBuilder::new()
        .with_working_dir(base.path())
        .with_disabled_server()
        .with_fixture_statement("CREATE (:City {name: 'Oslo'}), (:City {name: 'Bergen'})")
        .build()
        .start()
        .unwrap();
    let source = seeded.working_dir().to_path_buf();
    seeded.shutdown().unwrap();

    // Second run: copy the persisted tree into a brand new instance.
    let restored = HarnessBuilder::new()
        .with_disabled_server()
        .copy_from(&source)
        .build()
        .start()
        .unwrap();

    assert_eq!(restored.graph().node_count(), 2);
    let rows = restored
        .execute("MATCH (n:City {name: 'Oslo'}) RETURN count(n)")
        .unwrap();
    assert_eq!(
        rows,
        vec![lattice_graph::StatementResult::Value {
            value: Value::Int(1)
        }]
    );
}

struct SeedCities;

impl Procedure for SeedCities {
    fn name(&self) -> &str {
        "seed.cities"
    }

    fn invoke(
        &self,
        store: &mut GraphStore,
        args: &[Value],
    ) -> lattice_graph::Result<Vec<Vec<Value>>> {
        for arg in args {
            if let Some(name) = arg.as_str() {
                store.create_node(
                    vec!["City".to_owned()],
                    indexmap::indexmap! {"name".to_owned() => Value::from(name)},
                );
            }
        }
        Ok(Vec::new())
    }
}

#[test]
fn procedures_registered_through_the_fluent_surface_are_callable() {
    let harness = HarnessBuilder::new()
        .with_disabled_server()
        .with_procedure(Arc::new(SeedCities))
        .with_fixture_statement("CALL seed.cities('Oslo', 'Bergen', 'Tromso')")
        .build()
        .start()
        .unwrap();

    assert_eq!(harness.graph().node_count(), 3);
    assert_eq!(
        harness.graph().procedure_names(),
        vec!["seed.cities".to_owned()]
    );
}

struct NullExtension;

impl UnmanagedExtension for NullExtension {
    fn handle(&self, _graph: &GraphService, _request: ExtensionRequest) -> ExtensionResponse {
        ExtensionResponse::not_found("no routes")
    }
}

#[test]
fn root_extension_mount_fails_at_start() {
    let err = HarnessBuilder::new()
        .with_unmanaged_extension("/", Arc::new(NullExtension))
        .build()
        .start()
        .unwrap_err();
    assert!(format!("{err:#}").contains("mount path `/`"));
}

#[test]
fn ephemeral_working_directory_is_removed_after_shutdown() {
    let harness = HarnessBuilder::new()
        .with_disabled_server()
        .build()
        .start()
        .unwrap();
    let working_dir = harness.working_dir().to_path_buf();
    assert!(working_dir.exists());
    harness.shutdown().unwrap();
    assert!(!working_dir.exists());
}

#[test]
fn user_working_directory_survives_shutdown() {
    let base = tempdir().unwrap();
    let harness = HarnessBuilder::new()
        .with_working_dir(base.path())
        .with_disabled_server()
        .build()
        .start()
        .unwrap();
    let working_dir = harness.working_dir().to_path_buf();
    harness.shutdown().unwrap();
    assert!(working_dir.exists());
}
