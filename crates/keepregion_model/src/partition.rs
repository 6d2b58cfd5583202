//! Partition references.
//!
//! A partition is an independently loadable part of the simulated world.
//! Regions remember the partition they were declared in by name and, when the
//! host exposes one, by a stable identifier that survives renames.

use uuid::Uuid;

/// The partition a region belongs to.
///
/// Matching follows a fixed precedence: when both sides carry a stable
/// identifier the identifiers decide, otherwise the names are compared
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRef {
    name: String,
    id: Option<Uuid>,
}

impl PartitionRef {
    /// A partition known only by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    /// A partition known by name and stable identifier.
    #[must_use]
    pub fn identified(name: impl Into<String>, id: Uuid) -> Self {
        Self {
            name: name.into(),
            id: Some(id),
        }
    }

    /// Build from a name and an optional identifier.
    #[must_use]
    pub fn new(name: impl Into<String>, id: Option<Uuid>) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    /// Human-readable partition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable partition identifier, if known.
    #[must_use]
    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// Returns `true` if both references denote the same partition.
    #[must_use]
    pub fn matches(&self, other: &PartitionRef) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => names_equal(&self.name, &other.name),
        }
    }

    /// Returns `true` if this reference denotes the live partition with the
    /// given identifier and name.
    ///
    /// A reference carrying an identifier is only ever matched by identifier;
    /// the live name is consulted only for name-only references.
    #[must_use]
    pub fn is_partition(&self, live_id: Uuid, live_name: &str) -> bool {
        match self.id {
            Some(id) => id == live_id,
            None => names_equal(&self.name, live_name),
        }
    }
}

impl std::fmt::Display for PartitionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Case-insensitive name comparison, Unicode-aware.
fn names_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}
