//! Explicit state of one data load pass.

use civxml_common::SearchPaths;
use tracing::{debug, info};

use crate::{
    Alerts, DocumentCache, Error, FileReader, FileSpec, LoadStage, Result, TextLookup, TextStage,
    XmlAlert,
};

/// Owns the document cache, the alert sink and the current load stage.
///
/// A load pass walks the stages in order: enum tables are built in
/// [`LoadStage::Types`], text tables loaded before [`LoadStage::Text`] (the
/// only stage in which text keys can be checked), then the remaining
/// records. [`finish`](Self::finish) returns every alert raised during the
/// pass so they can be shown together.
///
/// # Example
///
/// ```no_run
/// use std::collections::HashMap;
///
/// use civxml_common::SearchPaths;
/// use civxml_reader::{FileSpec, LoadContext, LoadStage};
///
/// let mut ctx = LoadContext::new(SearchPaths::with_mod("Mods/MyMod/Assets/XML").with_root("Assets/XML"));
/// let texts: HashMap<String, String> = HashMap::new();
///
/// ctx.enter_stage(LoadStage::Text);
/// let reader = ctx.open(&FileSpec::new("Units/CIV4UnitInfos.xml"))?;
/// let stage = ctx.text_stage(&texts)?;
/// for unit in reader.records()? {
///     let unit = unit?;
///     let record = unit.record()?;
///     let description = record.read_text_key("Description", &stage, true);
///     println!("{} {:?}", unit.type_name(), description);
/// }
///
/// for alert in ctx.finish() {
///     eprintln!("{alert}");
/// }
/// # Ok::<(), civxml_reader::Error>(())
/// ```
#[derive(Debug)]
pub struct LoadContext {
    cache: DocumentCache,
    alerts: Alerts,
    stage: LoadStage,
}

impl LoadContext {
    /// Start a load pass over `paths`.
    pub fn new(paths: SearchPaths) -> Self {
        Self {
            cache: DocumentCache::new(paths),
            alerts: Alerts::new(),
            stage: LoadStage::Setup,
        }
    }

    /// The document cache.
    #[inline]
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Mutable access to the document cache.
    #[inline]
    pub fn cache_mut(&mut self) -> &mut DocumentCache {
        &mut self.cache
    }

    /// The alert sink shared by every reader of this pass.
    #[inline]
    pub fn alerts(&self) -> &Alerts {
        &self.alerts
    }

    /// Current stage.
    #[inline]
    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    /// Move to another stage.
    pub fn enter_stage(&mut self, stage: LoadStage) {
        if stage < self.stage {
            debug!(from = ?self.stage, to = ?stage, "load stage moved backwards");
        }
        debug!(?stage, "entering load stage");
        self.stage = stage;
    }

    /// Open a data file through the cache.
    pub fn open(&mut self, spec: &FileSpec) -> Result<FileReader> {
        FileReader::open(&mut self.cache, spec, &self.alerts)
    }

    /// Token permitting text key checks against `lookup`.
    ///
    /// Fails with [`Error::WrongStage`] outside [`LoadStage::Text`].
    pub fn text_stage<'t>(&self, lookup: &'t dyn TextLookup) -> Result<TextStage<'t>> {
        if self.stage != LoadStage::Text {
            return Err(Error::WrongStage {
                expected: LoadStage::Text,
                actual: self.stage,
            });
        }
        Ok(TextStage::new(lookup))
    }

    /// Drop every cached document. Readers opened earlier become stale.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// End the pass, returning all collected alerts.
    pub fn finish(mut self) -> Vec<XmlAlert> {
        self.stage = LoadStage::Finished;
        let alerts = self.alerts.take();
        info!(
            alerts = alerts.len(),
            documents = self.cache.len(),
            "load pass finished"
        );
        alerts
    }
}
