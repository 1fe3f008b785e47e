// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Unique identifier for a module registered on a gateway
///
/// Returned by `Gateway::add_module` and accepted by the handle-based
/// lifecycle operations (`start_module`, `remove_module`). The handle stays
/// valid until the module is removed; it is never reused.
///
/// # Performance
/// Uses UUID v4 for globally unique identifiers with excellent collision
/// resistance. Implements cheap cloning via Copy trait.
///
/// # Example
/// ```rust
/// use msggate::util::ModuleHandle;
///
/// let h1 = ModuleHandle::new();
/// let h2 = ModuleHandle::new();
/// assert_ne!(h1, h2); // Globally unique
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleHandle(Uuid);

impl ModuleHandle {
    /// Generate a new random ModuleHandle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a ModuleHandle from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ModuleHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
