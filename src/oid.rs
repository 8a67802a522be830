//! Namespaced object identifiers declared by LFS pointer files.

use std::fmt;

/// An opaque content identifier extracted from a pointer file.
///
/// The declared value carries a one-segment namespace prefix separated
/// by `:` (in practice always `sha256:`). The prefix is kept internally
/// and stripped for external reporting; no hash is ever recomputed, the
/// declared value is trusted as the identity of the object.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(String);

impl Oid {
    /// Wrap a declared identifier, prefix and all.
    pub fn new(raw: impl Into<String>) -> Self {
        Oid(raw.into())
    }

    /// The full namespaced value, e.g. `sha256:4d7a21...`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The value with its namespace prefix stripped, as written to
    /// manifests and used in store keys.
    pub fn bare(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, rest)) => rest,
            None => &self.0,
        }
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.0)
    }
}
