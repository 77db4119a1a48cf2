//! ---
//! lat_section: "02-harness-configuration"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Known-settings registry with deferred validation."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use std::net::SocketAddr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// HTTP listen address for the embedded server. Port 0 requests an
/// ephemeral port, which is the default for test isolation.
pub const SETTING_HTTP_LISTEN: &str = "server.http.listen_address";
/// Logical database name; also names the snapshot directory on disk.
pub const SETTING_DB_NAME: &str = "db.name";
/// Whether the harness writes a store snapshot on shutdown.
pub const SETTING_PERSIST_ON_SHUTDOWN: &str = "db.persist_on_shutdown";

fn default_http_listen() -> SocketAddr {
    "127.0.0.1:0".parse().expect("valid default listen address")
}

fn default_database_name() -> String {
    "graph".to_owned()
}

fn default_persist_on_shutdown() -> bool {
    true
}

/// Raw key/value settings exactly as accumulated by the builder.
///
/// Insertion is last-write-wins per key and never fails; keys are only
/// checked when [`EffectiveSettings::resolve`] runs at harness start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    values: IndexMap<String, String>,
}

impl Settings {
    /// Create an empty settings map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value, overwriting any earlier value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw value for a key, when present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Iterate raw entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no key has been set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Typed view of [`Settings`] after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSettings {
    /// Listen address for the embedded HTTP server.
    pub http_listen: SocketAddr,
    /// Logical database name.
    pub database_name: String,
    /// Whether a snapshot is written when the harness shuts down.
    pub persist_on_shutdown: bool,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self {
            http_listen: default_http_listen(),
            database_name: default_database_name(),
            persist_on_shutdown: default_persist_on_shutdown(),
        }
    }
}

impl EffectiveSettings {
    /// Resolve raw settings into their typed form.
    ///
    /// Unknown keys and malformed values error here, not at the point the
    /// builder recorded them.
    pub fn resolve(settings: &Settings) -> Result<Self> {
        let mut effective = Self::default();
        for (key, value) in settings.iter() {
            match key {
                SETTING_HTTP_LISTEN => {
                    effective.http_listen =
                        value.parse().map_err(|_| ConfigError::InvalidSetting {
                            key: key.to_owned(),
                            value: value.to_owned(),
                            expected: "a socket address such as 127.0.0.1:0",
                        })?;
                }
                SETTING_DB_NAME => {
                    if value.is_empty()
                        || !value
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                    {
                        return Err(ConfigError::InvalidSetting {
                            key: key.to_owned(),
                            value: value.to_owned(),
                            expected: "a non-empty name of [a-zA-Z0-9_-] characters",
                        });
                    }
                    effective.database_name = value.to_owned();
                }
                SETTING_PERSIST_ON_SHUTDOWN => {
                    effective.persist_on_shutdown =
                        value.parse().map_err(|_| ConfigError::InvalidSetting {
                            key: key.to_owned(),
                            value: value.to_owned(),
                            expected: "`true` or `false`",
                        })?;
                }
                other => return Err(ConfigError::UnknownSetting(other.to_owned())),
            }
        }
        Ok(effective)
    }
}
