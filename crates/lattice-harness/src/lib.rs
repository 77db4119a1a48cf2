//! ---
//! lat_section: "04-harness-lifecycle"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Fluent harness builder and lifecycle orchestration."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
//! The Lattice harness: start an in-process graph database for a test,
//! pre-populated with fixtures and custom components, and tear it down with
//! the test.
//!
//! ```no_run
//! use lattice_harness::HarnessBuilder;
//!
//! let extension = HarnessBuilder::new()
//!     .with_config("db.name", "movies")
//!     .with_fixture_statement("CREATE (:Movie {title: 'Heat'})")
//!     .build();
//! let harness = extension.start().expect("harness starts");
//! assert_eq!(harness.graph().node_count(), 1);
//! ```
#![warn(missing_docs)]

pub mod builder;
pub mod extension;
pub mod handle;
pub mod logging;
pub mod workdir;

pub use builder::InProcessBuilder;
pub use extension::{HarnessBuilder, HarnessExtension};
pub use handle::Harness;
pub use logging::init as init_tracing;
