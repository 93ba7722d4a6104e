//! Interceptor bindings via `interpose.toml`
//!
//! A config file rebinds member markers without touching the contract
//! declaration. Members it does not mention keep the markers declared on the
//! contract.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use interpose_core::{ProxyError, ProxyResult};

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "interpose.toml";

/// Marker bindings loaded from `interpose.toml`.
///
/// # Example
///
/// ```toml
/// contract = "SlowService"
///
/// [members]
/// sleep_1s = ["caching", "logging"]
/// sleep_2s = ["logging"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterceptorConfig {
    /// Contract the bindings are written for; checked when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    /// Member name to marker names, outermost first.
    #[serde(default)]
    pub members: BTreeMap<String, Vec<String>>,
}

impl InterceptorConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Interceptor bindings
#
# Contract the bindings apply to (optional). When set, it must match the
# contract name or the factory refuses to start.
# contract = "SlowService"

# Marker names per member, outermost first. Members not listed here keep
# the markers declared on the contract.
[members]
# sleep_1s = ["caching", "logging"]
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the text is not valid TOML for this shape.
    pub fn from_toml_str(content: &str) -> ProxyResult<Self> {
        toml::from_str(content).map_err(|e| {
            ProxyError::configuration(format!("Failed to parse interceptor config: {}", e))
        })
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> ProxyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            ProxyError::configuration(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> ProxyResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ProxyError::configuration(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content).map_err(|e| {
            ProxyError::configuration(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Markers bound to `member`, if the config mentions it
    pub fn markers_for(&self, member: &str) -> Option<&[String]> {
        self.members.get(member).map(|markers| markers.as_slice())
    }

    /// Check the `contract` key against `name`
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the key is set to another contract.
    pub fn check_contract(&self, name: &str) -> ProxyResult<()> {
        match &self.contract {
            Some(expected) if expected != name => Err(ProxyError::configuration(format!(
                "interceptor config is for contract '{}', not '{}'",
                expected, name
            ))),
            _ => Ok(()),
        }
    }
}
