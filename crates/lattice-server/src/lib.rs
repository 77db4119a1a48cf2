//! ---
//! lat_section: "03-http-surface"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Embedded HTTP server exposing the graph and extension mounts."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
//! The optional HTTP surface of a running harness: a small JSON API over the
//! graph service plus one nested route per unmanaged extension mount. The
//! server runs on a dedicated thread owning its own runtime so the harness
//! stays usable from synchronous test code.
#![warn(missing_docs)]

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lattice_config::{ExtensionRequest, UnmanagedMount};
use lattice_graph::{GraphService, StatementResult};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state exposed to API handlers.
#[derive(Clone)]
struct ServerState {
    graph: GraphService,
    database_name: String,
    start: Instant,
}

/// State for one unmanaged extension mount.
#[derive(Clone)]
struct MountState {
    graph: GraphService,
    mount: UnmanagedMount,
}

/// Handle to the running embedded server.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Bound address, with the effective port when 0 was requested.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URI of the server.
    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the server and wait for the worker thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("server thread panicked during shutdown");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the embedded HTTP server for a graph service.
///
/// The listener is bound synchronously so the caller learns the effective
/// address before any test traffic is possible; the accept loop then runs on
/// a dedicated thread with a current-thread runtime.
pub fn spawn_server(
    graph: GraphService,
    database_name: impl Into<String>,
    addr: SocketAddr,
    mounts: &[UnmanagedMount],
) -> Result<ServerHandle> {
    let state = ServerState {
        graph: graph.clone(),
        database_name: database_name.into(),
        start: Instant::now(),
    };

    // Nesting panics on `/` or a repeated path, so reject both up front and
    // let the caller see an error instead.
    let mut mount_paths: Vec<&str> = Vec::new();
    for mount in mounts {
        if mount.mount_path == "/" {
            anyhow::bail!("unmanaged extension mount path `/` would shadow the API routes");
        }
        if mount_paths.contains(&mount.mount_path.as_str()) {
            anyhow::bail!(
                "duplicate unmanaged extension mount path `{}`",
                mount.mount_path
            );
        }
        mount_paths.push(&mount.mount_path);
    }

    let mut router = Router::new()
        .route("/status", get(get_status))
        .route("/db/execute", post(post_execute))
        .with_state(state);

    for mount in mounts {
        let mount_state = MountState {
            graph: graph.clone(),
            mount: mount.clone(),
        };
        let extension_router = Router::new()
            .fallback(handle_extension)
            .with_state(mount_state);
        router = router.nest(&mount.mount_path, extension_router);
        info!(mount = %mount.mount_path, "unmanaged extension mounted");
    }
    let router = router.layer(TraceLayer::new_for_http());

    let listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind harness server listener {addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to read bound server address")?;
    listener
        .set_nonblocking(true)
        .context("failed to configure server listener as non-blocking")?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let thread = thread::Builder::new()
        .name("lattice-server".to_owned())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!(error = %err, "failed to build server runtime");
                    return;
                }
            };
            runtime.block_on(async move {
                let tcp_listener = match TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(err) => {
                        error!(error = %err, "failed to adopt server listener");
                        return;
                    }
                };
                info!(address = %local_addr, "harness server listening");
                if let Err(err) = axum::serve(tcp_listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                    })
                    .await
                {
                    error!(address = %local_addr, error = %err, "harness server exited with error");
                }
            });
        })
        .context("failed to spawn server thread")?;

    Ok(ServerHandle {
        addr: local_addr,
        shutdown: Some(shutdown_tx),
        thread: Some(thread),
    })
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    database: String,
    uptime_seconds: u64,
    nodes: usize,
    relationships: usize,
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    statements: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ExecuteResponse {
    results: Vec<StatementResult>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

async fn get_status(State(state): State<ServerState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        database: state.database_name.clone(),
        uptime_seconds: state.start.elapsed().as_secs(),
        nodes: state.graph.node_count(),
        relationships: state.graph.relationship_count(),
    })
}

async fn post_execute(
    State(state): State<ServerState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let mut results = Vec::new();
    for statement in &request.statements {
        let mut batch = state
            .graph
            .execute(statement)
            .map_err(|err| ApiError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        results.append(&mut batch);
    }
    Ok(Json(ExecuteResponse { results }))
}

async fn handle_extension(
    State(state): State<MountState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let parsed_body = if body.is_empty() {
        serde_json::Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(err) => {
                return ApiError::new(
                    StatusCode::BAD_REQUEST,
                    format!("extension body is not valid JSON: {err}"),
                )
                .into_response()
            }
        }
    };

    let request = ExtensionRequest {
        method: method.as_str().to_owned(),
        path: uri.path().to_owned(),
        body: parsed_body,
    };
    let response = state.mount.extension.handle(&state.graph, request);
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}
