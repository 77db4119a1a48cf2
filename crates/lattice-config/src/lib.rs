//! ---
//! lat_section: "02-harness-configuration"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Configuration record and fixture model for the harness."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
//! Configuration surface of the Lattice harness: the accumulated
//! [`HarnessConfig`] record, the known-settings registry, the fixture model,
//! and the extension seams. Nothing here validates eagerly; the harness
//! builder resolves and validates the record at start time.
#![warn(missing_docs)]

/// Result alias used throughout the configuration crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Error type for configuration resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Wrapper for IO errors raised while expanding fixture directories.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Reported when the settings map carries a key the engine does not know.
    #[error("unknown setting key `{0}`")]
    UnknownSetting(String),
    /// Reported when a known setting holds an unparsable value.
    #[error("invalid value `{value}` for setting `{key}`: expected {expected}")]
    InvalidSetting {
        /// Offending setting key.
        key: String,
        /// Offending raw value.
        value: String,
        /// Description of the expected shape.
        expected: &'static str,
    },
    /// Reported when a fixture path does not exist at harness start.
    #[error("fixture path {0} does not exist")]
    MissingFixture(std::path::PathBuf),
}

pub mod extension;
pub mod fixture;
pub mod record;
pub mod settings;

pub use extension::{
    ExtensionFactory, ExtensionRequest, ExtensionResponse, UnmanagedExtension, UnmanagedMount,
};
pub use fixture::{cypher_files_in, Fixture, FixtureFn, CYPHER_FIXTURE_EXTENSION};
pub use record::HarnessConfig;
pub use settings::{
    EffectiveSettings, Settings, SETTING_DB_NAME, SETTING_HTTP_LISTEN,
    SETTING_PERSIST_ON_SHUTDOWN,
};
