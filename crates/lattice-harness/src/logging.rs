//! ---
//! lat_section: "04-harness-lifecycle"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Tracing subscriber bootstrap for harness consumers."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

/// Initialize a baseline tracing subscriber suitable for test runs.
///
/// Safe to call from every test; later calls are no-ops once a global
/// subscriber is installed. `RUST_LOG` overrides the INFO default.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
