//! Common utilities for civxml.
//!
//! This crate provides foundational types used across all civxml crates:
//!
//! - [`SearchPaths`] - Ordered search roots (mod first, then base game and expansions)
//! - [`Resolved`] - The physical file a logical name resolved to, and which root won
//! - [`FxHashMap`] - Fast hash map alias used for name lookups

mod error;
mod paths;

pub use error::{Error, Result};
pub use paths::{Resolved, SearchPaths};

/// Hash map using the Fx hasher.
///
/// Name tables (tags, enum names, schema types) are small string keys where
/// the default SipHash is needlessly slow.
pub type FxHashMap<K, V> =
    hashbrown::HashMap<K, V, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

/// Re-export hashbrown for callers that build their own maps.
pub use hashbrown;
