//! ---
//! lat_section: "01-graph-kernel"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "In-memory property-graph store and snapshot persistence."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::value::Value;
use crate::{GraphError, Result};

/// Current store snapshot envelope version.
pub const STORE_SNAPSHOT_VERSION: u16 = 1;

/// Node identifier, monotonic within a store.
pub type NodeId = u64;
/// Relationship identifier, monotonic within a store.
pub type RelId = u64;

/// A labelled node with a property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Store-assigned identifier.
    pub id: NodeId,
    /// Labels in declaration order.
    pub labels: Vec<String>,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

impl Node {
    /// True when the node carries the given label.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Look up a property value by key.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// A typed, directed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Store-assigned identifier.
    pub id: RelId,
    /// Relationship type.
    pub rel_type: String,
    /// Source node identifier.
    pub start: NodeId,
    /// Target node identifier.
    pub end: NodeId,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

/// In-memory property-graph store with insertion-ordered tables.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GraphStore {
    nodes: IndexMap<NodeId, Node>,
    relationships: IndexMap<RelId, Relationship>,
    next_node_id: NodeId,
    next_rel_id: RelId,
}

impl GraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node and return its assigned identifier.
    pub fn create_node(
        &mut self,
        labels: Vec<String>,
        properties: IndexMap<String, Value>,
    ) -> NodeId {
        self.next_node_id += 1;
        let id = self.next_node_id;
        self.nodes.insert(
            id,
            Node {
                id,
                labels,
                properties,
            },
        );
        id
    }

    /// Create a relationship between two existing nodes.
    pub fn create_relationship(
        &mut self,
        rel_type: impl Into<String>,
        start: NodeId,
        end: NodeId,
        properties: IndexMap<String, Value>,
    ) -> Result<RelId> {
        if !self.nodes.contains_key(&start) {
            return Err(GraphError::MissingNode(start));
        }
        if !self.nodes.contains_key(&end) {
            return Err(GraphError::MissingNode(end));
        }
        self.next_rel_id += 1;
        let id = self.next_rel_id;
        self.relationships.insert(
            id,
            Relationship {
                id,
                rel_type: rel_type.into(),
                start,
                end,
                properties,
            },
        );
        Ok(id)
    }

    /// Look up a node by identifier.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up a relationship by identifier.
    pub fn relationship(&self, id: RelId) -> Option<&Relationship> {
        self.relationships.get(&id)
    }

    /// Number of nodes in the store.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of relationships in the store.
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate relationships in insertion order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Nodes carrying every listed label and matching every property exactly.
    ///
    /// The returned references borrow only the store, so the label and
    /// property filters may be temporaries at the call site.
    pub fn match_nodes(&self, labels: &[String], properties: &IndexMap<String, Value>) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|node| {
                labels.iter().all(|label| node.has_label(label))
                    && properties
                        .iter()
                        .all(|(key, value)| node.property(key) == Some(value))
            })
            .collect()
    }

    /// Relationships of the given type attached to the given node.
    pub fn relationships_of(&self, node: NodeId, rel_type: &str) -> Vec<&Relationship> {
        self.relationships
            .values()
            .filter(|rel| rel.rel_type == rel_type && (rel.start == node || rel.end == node))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreSnapshotEnvelope {
    version: u16,
    created_at: DateTime<Utc>,
    hash: String,
    store: GraphStore,
}

/// Persist the store as a hash-verified JSON snapshot.
pub fn save_store(store: &GraphStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let envelope = StoreSnapshotEnvelope {
        version: STORE_SNAPSHOT_VERSION,
        created_at: Utc::now(),
        hash: compute_hash(store)?,
        store: store.clone(),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    let json = serde_json::to_vec_pretty(&envelope)?;
    writer.write_all(&json)?;
    writer.flush()?;
    debug!(path = %path.display(), nodes = store.node_count(), "store snapshot written");
    Ok(())
}

/// Load a snapshot from disk, verifying the payload hash.
pub fn load_store(path: &Path) -> Result<GraphStore> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let envelope: StoreSnapshotEnvelope = serde_json::from_slice(&bytes)?;
    let expected = compute_hash(&envelope.store)?;
    if envelope.hash != expected {
        return Err(GraphError::SnapshotHashMismatch);
    }
    Ok(envelope.store)
}

fn compute_hash(store: &GraphStore) -> Result<String> {
    let serialized = serde_json::to_vec(store)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized);
    Ok(hex::encode(hasher.finalize()))
}
