//! Search path resolution.
//!
//! Game data is layered: the active mod overrides the base game, which in
//! turn falls back to expansion content. A logical name such as
//! `Units/CIV4UnitInfos.xml` is resolved by trying each root in priority
//! order; the first root containing the file wins. Loaders that go through
//! [`SearchPaths::resolve_with`] skip a copy that fails to load and keep
//! looking in lower-priority roots.
//!
//! Root 0 is always the active mod. Only files resolved from root 0 belong to
//! the mod, and root 0 is the only place edits are ever written to.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Error, Result};

/// A logical file name resolved to a physical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Physical path of the file.
    pub path: PathBuf,
    /// Index of the search root that satisfied the lookup.
    pub root_index: usize,
}

impl Resolved {
    /// Whether the file was found in the active mod (root 0).
    #[inline]
    pub fn is_mod(&self) -> bool {
        self.root_index == 0
    }
}

/// Ordered list of search roots.
///
/// # Example
///
/// ```no_run
/// use civxml_common::SearchPaths;
///
/// let paths = SearchPaths::with_mod("Mods/MyMod/Assets/XML")
///     .with_root("Assets/XML");
///
/// let resolved = paths.resolve("Units/CIV4UnitInfos.xml")?;
/// println!("{} (mod: {})", resolved.path.display(), resolved.is_mod());
/// # Ok::<(), civxml_common::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchPaths {
    roots: Vec<PathBuf>,
}

impl SearchPaths {
    /// Create a search path list from roots in priority order.
    ///
    /// The first root is treated as the active mod.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a search path list whose only root is the active mod.
    pub fn with_mod(mod_root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![mod_root.into()],
        }
    }

    /// Append a lower-priority root (base game, then expansions).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// All roots in priority order.
    #[inline]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Get a root by index.
    #[inline]
    pub fn root(&self, index: usize) -> Option<&Path> {
        self.roots.get(index).map(PathBuf::as_path)
    }

    /// The active mod root.
    #[inline]
    pub fn mod_root(&self) -> Option<&Path> {
        self.root(0)
    }

    /// Number of roots.
    #[inline]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether no roots are configured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Resolve a logical name against the roots.
    ///
    /// Returns [`Error::NotFound`] listing every attempted path when no root
    /// contains the file. Callers decide whether that is fatal.
    pub fn resolve(&self, logical: &str) -> Result<Resolved> {
        if self.roots.is_empty() {
            return Err(Error::NoRoots);
        }

        let mut tried = Vec::with_capacity(self.roots.len());
        for (root_index, root) in self.roots.iter().enumerate() {
            let candidate = root.join(logical);
            if candidate.is_file() {
                debug!(logical, root_index, path = %candidate.display(), "resolved file");
                return Ok(Resolved {
                    path: candidate,
                    root_index,
                });
            }
            tried.push(candidate);
        }

        warn!(logical, "file not found in any search root");
        Err(Error::NotFound {
            name: logical.to_string(),
            tried,
        })
    }

    /// Resolve a logical name to the first candidate `load` accepts.
    ///
    /// A candidate that exists but fails to load is skipped with a warning
    /// and the next root is tried, so a malformed mod copy falls back to the
    /// base game. When every existing candidate fails, the last load error is
    /// returned; when none exists, [`Error::NotFound`].
    pub fn resolve_with<T, E, F>(
        &self,
        logical: &str,
        mut load: F,
    ) -> std::result::Result<(Resolved, T), E>
    where
        F: FnMut(&Path) -> std::result::Result<T, E>,
        E: From<Error> + std::fmt::Display,
    {
        if self.roots.is_empty() {
            return Err(Error::NoRoots.into());
        }

        let mut tried = Vec::with_capacity(self.roots.len());
        let mut last_error = None;
        for (root_index, root) in self.roots.iter().enumerate() {
            let candidate = root.join(logical);
            if candidate.is_file() {
                match load(&candidate) {
                    Ok(value) => {
                        debug!(logical, root_index, path = %candidate.display(), "resolved file");
                        let resolved = Resolved {
                            path: candidate,
                            root_index,
                        };
                        return Ok((resolved, value));
                    }
                    Err(e) => {
                        warn!(logical, root_index, path = %candidate.display(), error = %e, "skipping unloadable file");
                        last_error = Some(e);
                    }
                }
            }
            tried.push(candidate);
        }

        if let Some(e) = last_error {
            return Err(e);
        }
        warn!(logical, "file not found in any search root");
        Err(Error::NotFound {
            name: logical.to_string(),
            tried,
        }
        .into())
    }

    /// Resolve a file the caller cannot do without.
    ///
    /// A miss is escalated to [`Error::MissingRequiredFile`] naming the
    /// logical file.
    pub fn resolve_required(&self, logical: &str) -> Result<Resolved> {
        match self.resolve(logical) {
            Err(Error::NotFound { name, .. }) => Err(Error::MissingRequiredFile { name }),
            other => other,
        }
    }

    /// Path a logical file is written to.
    ///
    /// Edits always land in the mod root, never in base game content.
    pub fn write_path(&self, logical: &str) -> Result<PathBuf> {
        self.mod_root()
            .map(|root| root.join(logical))
            .ok_or(Error::NoRoots)
    }
}
