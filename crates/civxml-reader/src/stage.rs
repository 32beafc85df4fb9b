//! Load stages and the text stage token.

use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Phases of a data load pass, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadStage {
    /// Nothing loaded yet.
    Setup,
    /// Enum name tables are being built.
    Types,
    /// Text tables are loaded; text keys may be resolved.
    Text,
    /// Remaining record data.
    Infos,
    /// Load pass complete.
    Finished,
}

/// Source of localized text for key validation.
pub trait TextLookup {
    /// The text for a key, or `None` if the key is unknown.
    fn text(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Whether the active language displays raw keys instead of text.
    ///
    /// Key validation is skipped in that mode.
    fn shows_tags(&self) -> bool {
        false
    }
}

impl<S: BuildHasher> TextLookup for HashMap<String, String, S> {
    fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl<S: BuildHasher> TextLookup for civxml_common::hashbrown::HashMap<String, String, S> {
    fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|s| Cow::Borrowed(s.as_str()))
    }
}

/// Proof that the load is in [`LoadStage::Text`].
///
/// Only [`LoadContext::text_stage`](crate::LoadContext::text_stage) creates
/// one, so reading text keys outside the text stage does not compile
/// without first getting past that check.
#[derive(Clone, Copy)]
pub struct TextStage<'t> {
    lookup: &'t dyn TextLookup,
}

impl<'t> TextStage<'t> {
    pub(crate) fn new(lookup: &'t dyn TextLookup) -> Self {
        Self { lookup }
    }

    /// Resolve a key.
    pub fn text(&self, key: &str) -> Option<Cow<'t, str>> {
        let lookup: &'t dyn TextLookup = self.lookup;
        lookup.text(key)
    }

    /// Whether keys are shown raw.
    pub fn shows_tags(&self) -> bool {
        self.lookup.shows_tags()
    }
}

impl std::fmt::Debug for TextStage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStage")
            .field("shows_tags", &self.shows_tags())
            .finish()
    }
}
