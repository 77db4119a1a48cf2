//! ---
//! lat_section: "02-harness-configuration"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Accumulated harness configuration record."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use lattice_graph::{Procedure, UserAggregation, UserFunction};

use crate::extension::{ExtensionFactory, UnmanagedMount};
use crate::fixture::Fixture;
use crate::settings::Settings;

/// The configuration record accumulated by the fluent builder and consumed
/// by the harness at start.
///
/// The record itself performs no validation; every field is taken at face
/// value until the harness resolves it. Fixtures and component registrations
/// keep their registration order, settings are last-write-wins per key.
#[derive(Clone, Default)]
pub struct HarnessConfig {
    /// Directory the harness runs in; `None` selects an ephemeral temp dir.
    pub working_dir: Option<PathBuf>,
    /// Optional source directory whose store is copied in before start.
    pub copy_from: Option<PathBuf>,
    /// Raw engine settings.
    pub settings: Settings,
    /// Fixtures in registration order.
    pub fixtures: Vec<Fixture>,
    /// Procedure registrations in registration order.
    pub procedures: Vec<Arc<dyn Procedure>>,
    /// User function registrations in registration order.
    pub functions: Vec<Arc<dyn UserFunction>>,
    /// Aggregation registrations in registration order.
    pub aggregations: Vec<Arc<dyn UserAggregation>>,
    /// Kernel extension factories in registration order.
    pub extension_factories: Vec<Arc<dyn ExtensionFactory>>,
    /// Unmanaged HTTP extension mounts in registration order.
    pub unmanaged_mounts: Vec<UnmanagedMount>,
    /// True when the embedded HTTP server must not be started.
    pub server_disabled: bool,
}

impl HarnessConfig {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("working_dir", &self.working_dir)
            .field("copy_from", &self.copy_from)
            .field("settings", &self.settings)
            .field("fixtures", &self.fixtures.len())
            .field("procedures", &self.procedures.len())
            .field("functions", &self.functions.len())
            .field("aggregations", &self.aggregations.len())
            .field("extension_factories", &self.extension_factories.len())
            .field("unmanaged_mounts", &self.unmanaged_mounts)
            .field("server_disabled", &self.server_disabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SETTING_DB_NAME;

    #[test]
    fn record_starts_empty() {
        let config = HarnessConfig::new();
        assert!(config.working_dir.is_none());
        assert!(config.fixtures.is_empty());
        assert!(!config.server_disabled);
    }

    #[test]
    fn clone_shares_component_handles() {
        let mut config = HarnessConfig::new();
        config.settings.set(SETTING_DB_NAME, "movies");
        config.fixtures.push(Fixture::Inline("CREATE (:A)".into()));

        let clone = config.clone();
        assert_eq!(clone.settings.get(SETTING_DB_NAME), Some("movies"));
        assert_eq!(clone.fixtures.len(), 1);
    }
}
