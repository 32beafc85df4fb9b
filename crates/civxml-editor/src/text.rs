//! Localized text tables.
//!
//! A text file holds `TEXT` entries below a `Civ4GameText` root:
//!
//! ```xml
//! <Civ4GameText xmlns="http://www.firaxis.com">
//!     <TEXT>
//!         <Tag>TXT_KEY_UNIT_WARRIOR</Tag>
//!         <English>Warrior:Warriors</English>
//!         <French>Guerrier</French>
//!     </TEXT>
//!     <TEXT>
//!         <Tag>TXT_KEY_CIV_FOO_ADJECTIVE</Tag>
//!         <English>
//!             <Text>Foo:Foos:Fooa:Fooas</Text>
//!             <Gender>Male:Male:Female:Female</Gender>
//!             <Plural>0:1:0:1</Plural>
//!         </English>
//!     </TEXT>
//! </Civ4GameText>
//! ```
//!
//! Variant lists are separated by `:`, which therefore cannot appear inside
//! a single variant.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use civxml_common::FxHashMap;
use civxml_dom::{NodeId, XmlDocument};
use civxml_reader::TextLookup;
use tracing::debug;

use crate::{Error, Languages, Result};

/// Root element of a text file.
pub const TEXT_ROOT: &str = "Civ4GameText";
const TEXT_NAMESPACE: &str = "http://www.firaxis.com";
const AUTO_PREFIX: &str = "XML_AUTO_";
const PLACEHOLDER: &str = "To be overwritten";

/// Separator between the variants of one string.
pub const TOKEN_SEPARATOR: char = ':';

pub(crate) const MALE: &str = "Male";
pub(crate) const FEMALE: &str = "Female";
pub(crate) const SINGULAR: &str = "0";
pub(crate) const PLURAL: &str = "1";

/// Split a variant list. A trailing separator adds no empty variant.
pub(crate) fn split_tokens(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut tokens: Vec<&str> = text.split(TOKEN_SEPARATOR).collect();
    if tokens.last() == Some(&"") {
        tokens.pop();
    }
    tokens
}

/// One text file, indexed by tag.
///
/// A file in vanilla content, or one the game generates
/// (`XML_AUTO_*.xml`), never loses entries through
/// [`delete_element`](Self::delete_element).
#[derive(Debug)]
pub struct TextFileStorage {
    path: PathBuf,
    vanilla: bool,
    auto_generated: bool,
    doc: XmlDocument,
    tags: Vec<String>,
    index: FxHashMap<String, NodeId>,
}

impl TextFileStorage {
    /// Open a text file, starting a new one if it does not exist.
    pub fn open(path: impl Into<PathBuf>, vanilla: bool) -> Result<Self> {
        let path = path.into();
        let doc = match XmlDocument::open(&path) {
            Ok(doc) => doc,
            Err(civxml_dom::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "starting new text file");
                new_text_document()?
            }
            Err(e) => return Err(e.into()),
        };

        let is_text = doc
            .root_element()
            .is_some_and(|root| doc.name(root) == Some(TEXT_ROOT));
        if !is_text {
            return Err(Error::MalformedTextFile {
                path: path.display().to_string(),
            });
        }

        let auto_generated = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(AUTO_PREFIX))
            .is_some_and(|rest| !rest.is_empty());

        let mut storage = Self {
            path,
            vanilla,
            auto_generated,
            doc,
            tags: Vec::new(),
            index: FxHashMap::default(),
        };
        storage.init_cache();
        Ok(storage)
    }

    /// Rebuild the tag index. Entries without a tag are skipped.
    pub fn init_cache(&mut self) {
        self.tags.clear();
        self.index.clear();
        let Some(root) = self.doc.root_element() else {
            return;
        };
        for text in self.doc.child_elements(root, Some("TEXT")) {
            let tag = self
                .doc
                .first_child_element(text, Some("Tag"))
                .and_then(|t| self.doc.text(t))
                .filter(|t| !t.is_empty());
            if let Some(tag) = tag {
                if !self.index.contains_key(tag) {
                    self.index.insert(tag.to_string(), text);
                    self.tags.push(tag.to_string());
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn is_vanilla(&self) -> bool {
        self.vanilla
    }

    #[inline]
    pub fn is_auto_generated(&self) -> bool {
        self.auto_generated
    }

    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    pub(crate) fn document_mut(&mut self) -> &mut XmlDocument {
        &mut self.doc
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tag at a position in document order.
    pub fn tag(&self, index: usize) -> Option<&str> {
        self.tags.get(index).map(String::as_str)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The `TEXT` element of a tag.
    pub fn element(&self, tag: &str) -> Option<NodeId> {
        self.index.get(tag).copied()
    }

    /// The `English` element of a tag.
    pub fn english(&self, tag: &str) -> Option<NodeId> {
        let text = self.element(tag)?;
        self.doc.first_child_element(text, Some("English"))
    }

    /// English text of a tag as a selectable string.
    pub fn text_string(&self, tag: &str) -> Option<TextString<'_>> {
        Some(TextString::new(&self.doc, self.english(tag)?))
    }

    /// Create an entry for `tag` and return its `English` element.
    ///
    /// The entry is inserted before the first entry whose tag does not sort
    /// before `tag`, so a sorted file stays sorted. An existing entry is
    /// returned unchanged.
    pub fn create_element(&mut self, tag: &str, languages: &Languages) -> Result<NodeId> {
        if let Some(english) = self.english(tag) {
            return Ok(english);
        }
        let root = self.doc.root_element().ok_or(civxml_dom::Error::MissingRoot)?;
        let doc = &mut self.doc;

        let text = doc.create_element("TEXT");
        let tag_element = doc.create_element("Tag");
        doc.set_text(tag_element, tag)?;
        doc.append_child(text, tag_element)?;
        let english = doc.create_element("English");
        doc.set_text(english, PLACEHOLDER)?;
        doc.append_child(text, english)?;
        for language in &languages.list {
            let element = doc.create_element(language);
            doc.set_text(element, &languages.default_string)?;
            doc.append_child(text, element)?;
        }

        let before = doc.child_elements(root, Some("TEXT")).find(|&sibling| {
            let key = doc
                .first_child_element(sibling, Some("Tag"))
                .and_then(|t| doc.text(t));
            !matches!(key, Some(key) if key < tag)
        });
        match before {
            Some(before) => doc.insert_before(before, text)?,
            None => doc.append_child(root, text)?,
        }

        debug!(tag, path = %self.path.display(), "created text entry");
        self.init_cache();
        Ok(english)
    }

    /// Delete the entry of `tag` and save.
    ///
    /// Does nothing for vanilla or generated files. Returns whether an entry
    /// was removed.
    pub fn delete_element(&mut self, tag: &str) -> Result<bool> {
        if self.vanilla || self.auto_generated {
            debug!(tag, path = %self.path.display(), "not deleting from a protected text file");
            return Ok(false);
        }
        let Some(text) = self.element(tag) else {
            return Ok(false);
        };
        self.doc.remove(text)?;
        self.init_cache();
        self.save()?;
        Ok(true)
    }

    /// Write the file back to its path.
    pub fn save(&self) -> Result<()> {
        if self.vanilla {
            return Err(Error::ReadOnlyFile {
                path: self.path.display().to_string(),
            });
        }
        self.doc.save(&self.path)?;
        Ok(())
    }
}

fn new_text_document() -> Result<XmlDocument> {
    let mut doc = XmlDocument::with_declaration("1.0", Some("ISO-8859-1"));
    let root = doc.create_element(TEXT_ROOT);
    doc.set_attribute(root, "xmlns", TEXT_NAMESPACE)?;
    let document = doc.document_node();
    doc.append_child(document, root)?;
    Ok(doc)
}

impl TextLookup for TextFileStorage {
    fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.text_string(key)
            .map(|text| Cow::Owned(text.get_text(true, false)))
    }
}

/// The `English` element of an entry, with variant selection.
#[derive(Debug, Clone, Copy)]
pub struct TextString<'a> {
    doc: &'a XmlDocument,
    element: NodeId,
}

impl<'a> TextString<'a> {
    /// Number of gender and plurality combinations.
    pub const NUM_VARIANTS: usize = 4;

    pub fn new(doc: &'a XmlDocument, element: NodeId) -> Self {
        Self { doc, element }
    }

    #[inline]
    pub fn element(&self) -> NodeId {
        self.element
    }

    fn child_text(&self, name: &str) -> Option<&'a str> {
        let child = self.doc.first_child_element(self.element, Some(name))?;
        Some(self.doc.text(child).unwrap_or_default())
    }

    /// The variant for a gender and plurality, or `""`.
    ///
    /// With `Text`, `Gender` and `Plural` children the first position whose
    /// gender and plural tokens match is used. A `Gender` or `Plural` list
    /// shorter than `Text` repeats its first token for missing positions.
    /// Without them the element's own text is a singular/plural list and
    /// gender is ignored; a missing plural gives `""`.
    pub fn get_text(&self, male: bool, plural: bool) -> String {
        let Some(text) = self.child_text("Text") else {
            let own = split_tokens(self.doc.text(self.element).unwrap_or_default());
            let index = usize::from(plural);
            return own.get(index).map(|s| s.to_string()).unwrap_or_default();
        };

        let texts = split_tokens(text);
        let genders = split_tokens(self.child_text("Gender").unwrap_or_default());
        let plurals = split_tokens(self.child_text("Plural").unwrap_or_default());
        let gender = if male { MALE } else { FEMALE };
        let plurality = if plural { PLURAL } else { SINGULAR };

        let token_at = |list: &[&'a str], i: usize| -> &'a str {
            list.get(i).or_else(|| list.first()).copied().unwrap_or_default()
        };

        texts
            .iter()
            .enumerate()
            .find(|&(i, _)| token_at(&genders, i) == gender && token_at(&plurals, i) == plurality)
            .map(|(_, s)| s.to_string())
            .unwrap_or_default()
    }

    /// `(male, plural)` of a variant index.
    pub fn text_from_index(index: usize) -> Option<(bool, bool)> {
        match index {
            0 => Some((true, false)),
            1 => Some((true, true)),
            2 => Some((false, false)),
            3 => Some((false, true)),
            _ => None,
        }
    }

    /// Display name of a variant index.
    pub fn name_from_index(index: usize) -> Option<&'static str> {
        match index {
            0 => Some("Male Singular (use this if gender/plural doesn't apply)"),
            1 => Some("Male Plural (use this if gender doesn't matter)"),
            2 => Some("Female Singular"),
            3 => Some("Female Plural"),
            _ => None,
        }
    }

    /// Variant by index.
    pub fn get_text_by_index(&self, index: usize) -> String {
        Self::text_from_index(index)
            .map(|(male, plural)| self.get_text(male, plural))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english(xml: &str) -> (XmlDocument, NodeId) {
        let doc = XmlDocument::parse(xml).unwrap();
        let root = doc.root_element().unwrap();
        (doc, root)
    }

    fn languages() -> Languages {
        Languages {
            list: vec!["French".to_string(), "German".to_string()],
            default_string: "-".to_string(),
        }
    }

    #[test]
    fn test_split_tokens() {
        assert!(split_tokens("").is_empty());
        assert_eq!(split_tokens("a"), ["a"]);
        assert_eq!(split_tokens("a:b:"), ["a", "b"]);
        assert_eq!(split_tokens("a::b"), ["a", "", "b"]);
    }

    #[test]
    fn test_get_text_variants() {
        let (doc, element) = english(
            "<English><Text>Man:Men</Text><Gender>Male</Gender><Plural>0:1</Plural></English>",
        );
        let text = TextString::new(&doc, element);
        assert_eq!(text.get_text(true, false), "Man");
        assert_eq!(text.get_text(true, true), "Men");
        assert_eq!(text.get_text(false, false), "");
    }

    #[test]
    fn test_get_text_full_table() {
        let (doc, element) = english(
            "<English><Text>Foo:Foos:Fooa:Fooas</Text><Gender>Male:Male:Female:Female</Gender><Plural>0:1:0:1</Plural></English>",
        );
        let text = TextString::new(&doc, element);
        let all: Vec<String> = (0..TextString::NUM_VARIANTS)
            .map(|i| text.get_text_by_index(i))
            .collect();
        assert_eq!(all, ["Foo", "Foos", "Fooa", "Fooas"]);
        assert_eq!(text.get_text_by_index(4), "");
    }

    #[test]
    fn test_get_text_missing_plural_list() {
        let (doc, element) = english("<English><Text>Man:Men</Text><Gender>Male</Gender></English>");
        let text = TextString::new(&doc, element);
        assert_eq!(text.get_text(true, false), "");
    }

    #[test]
    fn test_get_text_plain() {
        let (doc, element) = english("<English>Warrior:Warriors</English>");
        let text = TextString::new(&doc, element);
        assert_eq!(text.get_text(true, false), "Warrior");
        assert_eq!(text.get_text(true, true), "Warriors");
        assert_eq!(text.get_text(false, true), "Warriors");

        let (doc, element) = english("<English>Hello</English>");
        let text = TextString::new(&doc, element);
        assert_eq!(text.get_text(true, false), "Hello");
        assert_eq!(text.get_text(false, false), "Hello");
        assert_eq!(text.get_text(true, true), "");
        assert_eq!(text.get_text_by_index(3), "");

        let (doc, element) = english("<English/>");
        assert_eq!(TextString::new(&doc, element).get_text(true, false), "");
    }

    #[test]
    fn test_variant_indices() {
        assert_eq!(TextString::text_from_index(0), Some((true, false)));
        assert_eq!(TextString::text_from_index(3), Some((false, true)));
        assert_eq!(TextString::text_from_index(4), None);
        assert_eq!(TextString::name_from_index(2), Some("Female Singular"));
        assert_eq!(TextString::name_from_index(9), None);
    }

    #[test]
    fn test_open_missing_creates_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Text/XML_AUTO_UnitInfo.xml");
        let storage = TextFileStorage::open(&path, false).unwrap();
        assert!(storage.is_auto_generated());
        assert!(storage.is_empty());

        let doc = storage.document();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.name(root), Some(TEXT_ROOT));
        assert_eq!(doc.attribute(root, "xmlns"), Some(TEXT_NAMESPACE));
        assert_eq!(doc.declaration().unwrap().encoding.as_deref(), Some("ISO-8859-1"));

        let plain = TextFileStorage::open(dir.path().join("Text/MyText.xml"), false).unwrap();
        assert!(!plain.is_auto_generated());
        let bare = TextFileStorage::open(dir.path().join("XML_AUTO_"), false).unwrap();
        assert!(!bare.is_auto_generated());
    }

    #[test]
    fn test_open_rejects_other_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Text.xml");
        std::fs::write(&path, "<Civ4UnitInfos/>").unwrap();
        assert!(matches!(
            TextFileStorage::open(&path, false),
            Err(Error::MalformedTextFile { .. })
        ));
    }

    #[test]
    fn test_create_element_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Text/MyText.xml");
        let mut storage = TextFileStorage::open(&path, false).unwrap();

        for tag in ["TXT_KEY_B", "TXT_KEY_D", "TXT_KEY_A", "TXT_KEY_C"] {
            storage.create_element(tag, &languages()).unwrap();
        }
        assert_eq!(storage.tags(), ["TXT_KEY_A", "TXT_KEY_B", "TXT_KEY_C", "TXT_KEY_D"]);

        let english = storage.english("TXT_KEY_C").unwrap();
        let again = storage.create_element("TXT_KEY_C", &languages()).unwrap();
        assert_eq!(english, again);
        assert_eq!(storage.len(), 4);

        let doc = storage.document();
        assert_eq!(doc.text(english), Some(PLACEHOLDER));
        let text = storage.element("TXT_KEY_C").unwrap();
        let children: Vec<&str> = doc.child_elements(text, None).filter_map(|e| doc.name(e)).collect();
        assert_eq!(children, ["Tag", "English", "French", "German"]);
        let french = doc.first_child_element(text, Some("French")).unwrap();
        assert_eq!(doc.text(french), Some("-"));
    }

    #[test]
    fn test_create_then_lookup_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Text/MyText.xml");
        let mut storage = TextFileStorage::open(&path, false).unwrap();

        let english = storage.create_element("TXT_KEY_TEST", &Languages::default()).unwrap();
        storage.document_mut().set_text(english, "Hello").unwrap();
        storage.save().unwrap();
        assert_eq!(storage.text("TXT_KEY_TEST").as_deref(), Some("Hello"));
        assert_eq!(storage.text("TXT_KEY_OTHER"), None);

        let reopened = TextFileStorage::open(&path, false).unwrap();
        assert_eq!(reopened.text_string("TXT_KEY_TEST").unwrap().get_text(true, false), "Hello");

        assert!(storage.delete_element("TXT_KEY_TEST").unwrap());
        assert!(storage.element("TXT_KEY_TEST").is_none());
        assert!(!storage.delete_element("TXT_KEY_TEST").unwrap());
        let reopened = TextFileStorage::open(&path, false).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_delete_on_vanilla_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Text/CIV4GameText.xml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "<Civ4GameText><TEXT><Tag>TXT_KEY_TEST</Tag><English>Hello</English></TEXT></Civ4GameText>",
        )
        .unwrap();

        let mut storage = TextFileStorage::open(&path, true).unwrap();
        assert!(!storage.delete_element("TXT_KEY_TEST").unwrap());
        assert_eq!(storage.tag(0), Some("TXT_KEY_TEST"));
        assert_eq!(storage.text("TXT_KEY_TEST").as_deref(), Some("Hello"));
        assert!(matches!(storage.save(), Err(Error::ReadOnlyFile { .. })));
    }

    #[test]
    fn test_delete_on_generated_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("XML_AUTO_UnitInfo.xml");
        let mut storage = TextFileStorage::open(&path, false).unwrap();
        storage.create_element("TXT_KEY_TEST", &Languages::default()).unwrap();
        assert!(!storage.delete_element("TXT_KEY_TEST").unwrap());
        assert_eq!(storage.len(), 1);
    }
}
