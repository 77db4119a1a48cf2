//! ---
//! lat_section: "02-harness-configuration"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Kernel extension and unmanaged HTTP extension seams."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::fmt;
use std::sync::Arc;

use lattice_graph::GraphService;
use serde::{Deserialize, Serialize};

/// A kernel extension initialized once during harness start, before fixtures
/// run. Typical implementations register procedures or seed internal state.
pub trait ExtensionFactory: Send + Sync {
    /// Extension name used in lifecycle logging.
    fn name(&self) -> &str;

    /// Initialize the extension against the running graph service.
    fn init(&self, graph: &GraphService) -> anyhow::Result<()>;
}

/// Request delivered to an unmanaged extension.
///
/// Kept framework-neutral so configuration does not depend on the HTTP
/// stack; the server crate adapts these from the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionRequest {
    /// HTTP method, uppercase.
    pub method: String,
    /// Path below the mount point, always starting with `/`.
    pub path: String,
    /// Parsed JSON body; `null` for bodyless requests.
    pub body: serde_json::Value,
}

/// Response produced by an unmanaged extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: serde_json::Value,
}

impl ExtensionResponse {
    /// A `200 OK` response with the given body.
    pub fn ok(body: serde_json::Value) -> Self {
        Self { status: 200, body }
    }

    /// A `404 Not Found` response with a message body.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            body: serde_json::json!({"message": message.into()}),
        }
    }
}

/// A user-supplied component mounted at an HTTP path on the embedded server.
pub trait UnmanagedExtension: Send + Sync {
    /// Handle one request routed below the extension's mount path.
    fn handle(&self, graph: &GraphService, request: ExtensionRequest) -> ExtensionResponse;
}

/// An unmanaged extension together with its mount path.
#[derive(Clone)]
pub struct UnmanagedMount {
    /// Mount path relative to the server root, e.g. `/ext/admin`.
    pub mount_path: String,
    /// The mounted extension.
    pub extension: Arc<dyn UnmanagedExtension>,
}

impl UnmanagedMount {
    /// Create a mount, normalizing the path to a single leading `/`.
    pub fn new(mount_path: impl Into<String>, extension: Arc<dyn UnmanagedExtension>) -> Self {
        let raw = mount_path.into();
        let trimmed = raw.trim_matches('/');
        Self {
            mount_path: format!("/{trimmed}"),
            extension,
        }
    }
}

impl fmt::Debug for UnmanagedMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnmanagedMount")
            .field("mount_path", &self.mount_path)
            .finish_non_exhaustive()
    }
}
