//! Parsed document cache for one load pass.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use civxml_common::{FxHashMap, Resolved, SearchPaths};
use civxml_dom::XmlDocument;
use tracing::debug;

use crate::{Error, Result};

#[derive(Debug)]
struct CachedDocument {
    doc: Arc<XmlDocument>,
    resolved: Resolved,
}

/// Cache of parsed documents keyed by logical file name.
///
/// Many record readers touch the same files during a load pass, so each
/// document is parsed once and shared. [`clear`](Self::clear) drops every
/// document and advances the cache generation; handles obtained earlier
/// then report [`Error::StaleDocument`] instead of silently reading
/// released data.
///
/// # Example
///
/// ```no_run
/// use civxml_common::SearchPaths;
/// use civxml_reader::DocumentCache;
///
/// let mut cache = DocumentCache::new(SearchPaths::with_mod("Mods/MyMod/Assets/XML"));
/// let handle = cache.get_or_load("Units/CIV4UnitInfos.xml")?;
/// let doc = handle.document()?;
/// println!("root: {:?}", doc.root_element().and_then(|r| doc.name(r)));
///
/// cache.clear();
/// assert!(handle.document().is_err());
/// # Ok::<(), civxml_reader::Error>(())
/// ```
#[derive(Debug)]
pub struct DocumentCache {
    paths: SearchPaths,
    docs: FxHashMap<String, CachedDocument>,
    generation: Arc<AtomicU64>,
}

impl DocumentCache {
    /// Create an empty cache resolving files through `paths`.
    pub fn new(paths: SearchPaths) -> Self {
        Self {
            paths,
            docs: FxHashMap::default(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The search paths used for resolution.
    #[inline]
    pub fn paths(&self) -> &SearchPaths {
        &self.paths
    }

    /// Fetch a cached document, loading and parsing it on first use.
    pub fn get_or_load(&mut self, logical: &str) -> Result<DocumentHandle> {
        if let Some(cached) = self.docs.get(logical) {
            debug!(logical, "document cache hit");
            return Ok(self.handle(logical, cached));
        }

        let (resolved, doc) = self
            .paths
            .resolve_with(logical, |path| XmlDocument::open(path).map_err(Error::from))?;
        debug!(logical, root_index = resolved.root_index, "document cached");

        let cached = CachedDocument {
            doc: Arc::new(doc),
            resolved,
        };
        let handle = self.handle(logical, &cached);
        self.docs.insert(logical.to_string(), cached);
        Ok(handle)
    }

    fn handle(&self, logical: &str, cached: &CachedDocument) -> DocumentHandle {
        DocumentHandle {
            name: Arc::from(logical),
            doc: Arc::clone(&cached.doc),
            resolved: cached.resolved.clone(),
            generation: self.generation(),
            current: Arc::clone(&self.generation),
        }
    }

    /// Drop every cached document.
    ///
    /// All handles issued before this call become stale.
    pub fn clear(&mut self) {
        let dropped = self.docs.len();
        self.docs.clear();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(dropped, generation, "document cache cleared");
    }

    /// Whether a document is currently cached.
    pub fn contains(&self, logical: &str) -> bool {
        self.docs.contains_key(logical)
    }

    /// Number of cached documents.
    #[inline]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Current cache generation. Starts at 0 and increases on every clear.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Shared reference to a cached document.
///
/// The handle keeps the parsed document alive, but access goes through
/// [`document`](Self::document), which fails once the owning cache has been
/// cleared.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    name: Arc<str>,
    doc: Arc<XmlDocument>,
    resolved: Resolved,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl DocumentHandle {
    /// The document, if the cache has not been cleared since it was loaded.
    pub fn document(&self) -> Result<&XmlDocument> {
        self.check()?;
        Ok(&self.doc)
    }

    /// Fail with [`Error::StaleDocument`] if the cache was cleared.
    pub fn check(&self) -> Result<()> {
        let current = self.current.load(Ordering::SeqCst);
        if current != self.generation {
            return Err(Error::StaleDocument {
                name: self.name.to_string(),
                loaded: self.generation,
                current,
            });
        }
        Ok(())
    }

    /// Whether the owning cache has been cleared since this handle was issued.
    pub fn is_stale(&self) -> bool {
        self.check().is_err()
    }

    /// Logical file name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical path the document was read from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.resolved.path
    }

    /// Index of the search root the document was found in.
    #[inline]
    pub fn root_index(&self) -> usize {
        self.resolved.root_index
    }

    /// Whether the document came from the active mod.
    #[inline]
    pub fn is_mod(&self) -> bool {
        self.resolved.is_mod()
    }

    /// Cache generation the document was loaded under.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
