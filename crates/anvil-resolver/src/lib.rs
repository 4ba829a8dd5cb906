//! Version resolution (C4): turns a recipe's `[version]` block plus a
//! user-supplied constraint into a single concrete [`ResolvedVersion`],
//! backed by pluggable [`VersionSource`]s and a TTL'd on-disk cache.
//!
//! Grounded in `vx-version-fetcher` (fetcher trait + registry/github
//! implementations) and `vx-resolver::resolution_cache` (TTL cache
//! pattern), per SPEC_FULL.md's C4 mapping.

pub mod cache;
pub mod error;
pub mod resolved;
pub mod resolver;
pub mod source;
pub mod sources;

pub use cache::VersionCache;
pub use error::{ResolverError, Result};
pub use resolved::ResolvedVersion;
pub use resolver::{Resolver, DEV_SENTINEL_VERSION};
pub use source::{BoxedVersionSource, SourceRegistry, VersionList, VersionSource};
