//! `ResolvedVersion` (spec.md §3): the output of version resolution.
//!
//! The version string is opaque to the rest of the system — it may be
//! semver, date-like, or arbitrary. Comparison for "latest" is delegated
//! to the source that produced the version list; once a `ResolvedVersion`
//! comes back from a source, it is authoritative.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVersion {
    pub version: String,
    pub source_description: String,
}

impl ResolvedVersion {
    pub fn new(version: impl Into<String>, source_description: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            source_description: source_description.into(),
        }
    }
}
