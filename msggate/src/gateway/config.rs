//! Configuration shape consumed from the external parser.
//!
//! The gateway core never reads configuration files itself; an external
//! layer parses whatever format it likes and delivers these two lists.
//! The types derive serde in both directions so that layer is one
//! `serde_json::from_str` away.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal module imports
// (none)

/// Link source meaning "every module".
pub const WILDCARD_SOURCE: &str = "*";

/// Declarative description of a gateway: modules first, then links.
///
/// # Example
///
/// ```rust
/// use msggate::gateway::{GatewayConfig, LinkEntry, ModuleEntry};
///
/// let config = GatewayConfig::new()
///     .with_module(ModuleEntry::new("sensor", "demo-loader"))
///     .with_module(ModuleEntry::new("printer", "demo-loader"))
///     .with_link(LinkEntry::new("sensor", "printer"));
///
/// assert_eq!(config.modules.len(), 2);
/// assert_eq!(config.links.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Modules to construct, in order
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,

    /// Links to wire once every module exists
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

impl GatewayConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module entry.
    pub fn with_module(mut self, entry: ModuleEntry) -> Self {
        self.modules.push(entry);
        self
    }

    /// Append a link entry.
    pub fn with_link(mut self, entry: LinkEntry) -> Self {
        self.links.push(entry);
        self
    }
}

/// One module to construct: its unique name, the loader that builds it, and
/// the two opaque payloads the loader consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Name unique within the gateway
    pub name: String,

    /// Name of a loader in the process-wide registry
    pub loader: String,

    /// Loader entrypoint payload (what to load)
    #[serde(default)]
    pub entrypoint: Value,

    /// Module-specific configuration payload
    #[serde(default)]
    pub configuration: Value,
}

impl ModuleEntry {
    /// Create an entry with empty payloads.
    pub fn new(name: impl Into<String>, loader: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loader: loader.into(),
            entrypoint: Value::Null,
            configuration: Value::Null,
        }
    }

    /// Set the loader entrypoint payload.
    pub fn with_entrypoint(mut self, entrypoint: Value) -> Self {
        self.entrypoint = entrypoint;
        self
    }

    /// Set the module configuration payload.
    pub fn with_configuration(mut self, configuration: Value) -> Self {
        self.configuration = configuration;
        self
    }
}

/// A directed subscription `source → sink`; `"*"` as source subscribes the
/// sink to every module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Producer name, or [`WILDCARD_SOURCE`]
    pub source: String,

    /// Consumer name
    pub sink: String,
}

impl LinkEntry {
    /// Create a link entry.
    pub fn new(source: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sink: sink.into(),
        }
    }

    /// Create a wildcard link delivering every module's output to `sink`.
    pub fn from_any(sink: impl Into<String>) -> Self {
        Self::new(WILDCARD_SOURCE, sink)
    }

    /// Whether this link's source is the wildcard.
    pub fn from_any_source(&self) -> bool {
        self.source == WILDCARD_SOURCE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wildcard_detection() {
        assert!(LinkEntry::from_any("sink").from_any_source());
        assert!(!LinkEntry::new("a", "b").from_any_source());
    }

    #[test]
    fn test_config_from_json() {
        let text = r#"{
            "modules": [
                {
                    "name": "sensor",
                    "loader": "native",
                    "entrypoint": { "path": "libsensor.so" },
                    "configuration": { "interval_ms": 500 }
                },
                { "name": "printer", "loader": "native" }
            ],
            "links": [
                { "source": "sensor", "sink": "printer" },
                { "source": "*", "sink": "printer" }
            ]
        }"#;

        let config: GatewayConfig = serde_json::from_str(text).unwrap();

        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.modules[0].name, "sensor");
        assert_eq!(config.modules[0].entrypoint, json!({"path": "libsensor.so"}));
        assert_eq!(config.modules[1].configuration, Value::Null);
        assert_eq!(config.links.len(), 2);
        assert!(config.links[1].from_any_source());
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let config: GatewayConfig = serde_json::from_str("{}").unwrap();
        assert!(config.modules.is_empty());
        assert!(config.links.is_empty());
    }

    #[test]
    fn test_builder_round_trip() {
        let config = GatewayConfig::new()
            .with_module(
                ModuleEntry::new("m", "l").with_configuration(json!({"k": 1})),
            )
            .with_link(LinkEntry::from_any("m"));

        let text = serde_json::to_string(&config).unwrap();
        let parsed: GatewayConfig = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed.modules[0].name, "m");
        assert_eq!(parsed.links[0], LinkEntry::from_any("m"));
    }
}
