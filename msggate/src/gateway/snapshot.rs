//! Defensive snapshots of the module graph.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
// (none)

/// One module in a [`ModuleList`] snapshot.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    name: String,
    sources: Option<Vec<String>>,
}

impl ModuleInfo {
    pub(crate) fn new(name: String, sources: Option<Vec<String>>) -> Self {
        Self { name, sources }
    }

    /// The module's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the modules this one is explicitly linked from.
    ///
    /// `None` means "from any source": the module is the sink of a wildcard
    /// link and receives every module's output, so enumerating sources
    /// would be meaningless.
    pub fn sources(&self) -> Option<&[String]> {
        self.sources.as_deref()
    }

    /// Whether the module is fed by a wildcard link.
    pub fn from_any_source(&self) -> bool {
        self.sources.is_none()
    }
}

/// Read-only copy of the module graph at one instant.
///
/// Returned by `Gateway::module_list` and delivered as the context of
/// `ModuleListChanged` events; it reflects the registry at the moment the
/// snapshot was taken, regardless of later mutations. The caller owns the
/// value; dropping it releases the copy.
#[derive(Debug, Clone)]
pub struct ModuleList {
    taken_at: DateTime<Utc>,
    modules: Vec<ModuleInfo>,
}

impl ModuleList {
    pub(crate) fn new(modules: Vec<ModuleInfo>) -> Self {
        Self {
            taken_at: Utc::now(),
            modules,
        }
    }

    /// When the snapshot was taken.
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// The snapshot's modules, in registration order.
    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }

    /// Number of modules in the snapshot.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Look up a module by name.
    pub fn get(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.iter().find(|info| info.name == name)
    }

    /// Check whether a module of that name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
