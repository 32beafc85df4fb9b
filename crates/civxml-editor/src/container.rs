//! One data file as the editor sees it.

use civxml_common::{FxHashMap, SearchPaths};
use civxml_dom::{NodeId, XmlDocument};
use civxml_reader::{find_first_record, sibling_path, Schema, TYPE_TAG};
use tracing::{debug, warn};

use crate::{Error, FileDescription, Result};

const SCHEMA_PREFIX: &str = "x-schema:";

#[derive(Debug)]
struct BackingFile {
    logical: String,
    doc: XmlDocument,
}

/// Documents touched by a type rename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeRename {
    /// Documents rewritten with the new name.
    pub written: usize,
    /// Documents holding references that were left alone because they are
    /// outside the mod.
    pub skipped: usize,
}

impl TypeRename {
    /// Whether any document was rewritten.
    #[inline]
    pub fn changed(&self) -> bool {
        self.written > 0
    }
}

impl std::ops::AddAssign for TypeRename {
    fn add_assign(&mut self, other: Self) {
        self.written += other.written;
        self.skipped += other.skipped;
    }
}

/// The documents, schema and record index of one described file.
///
/// A container owns one or more backing documents. Document 0 is the file
/// named by the [`FileDescription`]; further documents can be added with
/// [`add_document`](Self::add_document). A combo container owns no
/// documents, its tags are the tags of its member files.
///
/// Tags are kept sorted and distinct. The common prefix is the longest
/// string shared by the first and last tag, and empty unless there are at
/// least two tags.
///
/// # Example
///
/// ```no_run
/// use civxml_common::SearchPaths;
/// use civxml_editor::{FileContainer, FileDescription};
///
/// let paths = SearchPaths::with_mod("Mods/MyMod/Assets/XML").with_root("Assets/XML");
/// let desc = FileDescription::single("UnitInfo", "Units", "CIV4UnitInfos", "Civ4UnitInfos");
/// let mut units = FileContainer::load(desc, &paths)?;
///
/// println!("prefix {:?}", units.prefix());
/// for i in 0..units.num_tags() {
///     println!("{}", units.tag(i, true).unwrap_or_default());
/// }
/// units.rename_type("UNIT_WARRIOR", "UNIT_BRAVE")?;
/// # Ok::<(), civxml_editor::Error>(())
/// ```
#[derive(Debug)]
pub struct FileContainer {
    description: FileDescription,
    paths: SearchPaths,
    files: Vec<BackingFile>,
    is_in_mod: bool,
    schema_path: Option<String>,
    schema: Option<Schema>,
    tags: Vec<String>,
    tag_index: FxHashMap<String, usize>,
    element_index: FxHashMap<String, (usize, NodeId)>,
    prefix: String,
}

impl FileContainer {
    /// Load the file a description names.
    pub fn load(description: FileDescription, paths: &SearchPaths) -> Result<Self> {
        if description.is_combo() {
            Ok(Self::load_combo(description, paths))
        } else {
            Self::load_single(description, paths)
        }
    }

    fn empty(description: FileDescription, paths: &SearchPaths) -> Self {
        Self {
            description,
            paths: paths.clone(),
            files: Vec::new(),
            is_in_mod: false,
            schema_path: None,
            schema: None,
            tags: Vec::new(),
            tag_index: FxHashMap::default(),
            element_index: FxHashMap::default(),
            prefix: String::new(),
        }
    }

    /// Open `<Dir>/<Name>.xml` and the schema its root element references.
    pub fn load_single(description: FileDescription, paths: &SearchPaths) -> Result<Self> {
        let Some(logical) = description.logical_path() else {
            return Err(Error::IncompleteDescription {
                tag: Some(description.tag),
                field: "Name",
            });
        };

        let (resolved, doc) =
            paths.resolve_with(&logical, |path| XmlDocument::open(path).map_err(Error::from))?;
        let root = doc.root_element().ok_or(civxml_dom::Error::MissingRoot)?;

        let Some(schema_name) = doc
            .attribute(root, "xmlns")
            .and_then(|ns| ns.strip_prefix(SCHEMA_PREFIX))
        else {
            return Err(Error::MissingSchema { file: logical });
        };
        let schema_path = sibling_path(&logical, schema_name);
        let schema_doc = XmlDocument::open(paths.resolve(&schema_path)?.path)?;

        let mut container = Self::empty(description, paths);
        container.is_in_mod = resolved.is_mod();
        container.schema = Some(Schema::from_document(&schema_doc));
        container.schema_path = Some(schema_path);
        container.files.push(BackingFile { logical, doc });
        container.set_all_tags();

        debug!(
            tag = %container.description.tag,
            tags = container.tags.len(),
            in_mod = container.is_in_mod,
            "loaded file container"
        );
        Ok(container)
    }

    /// Build a combo container from its member tags.
    pub fn load_combo(description: FileDescription, paths: &SearchPaths) -> Self {
        let mut tags = description.sub_files.clone().unwrap_or_default();
        let mut container = Self::empty(description, paths);
        tags.sort();
        tags.dedup();
        container.tags = tags;
        container.post_set_tags();
        container
    }

    /// Load another backing document, returning its slot.
    pub fn add_document(&mut self, logical: &str) -> Result<usize> {
        let (_, doc) = self
            .paths
            .resolve_with(logical, |path| XmlDocument::open(path).map_err(Error::from))?;
        self.files.push(BackingFile {
            logical: logical.to_string(),
            doc,
        });
        self.set_all_tags();
        Ok(self.files.len() - 1)
    }

    /// Rebuild the tag list and element index from the documents.
    pub fn set_all_tags(&mut self) {
        if self.is_combo() {
            return;
        }
        self.tags.clear();
        self.element_index.clear();

        let tag = self.description.tag.clone();
        let sub_type = self.description.sub_type.clone();
        let mut found = Vec::new();
        for (slot, file) in self.files.iter().enumerate() {
            let Some(root) = file.doc.root_element() else {
                continue;
            };
            if let Some(first) = find_first_record(&file.doc, root, Some(&tag)) {
                collect_tags(
                    &file.doc,
                    first,
                    &tag,
                    sub_type.as_deref(),
                    &mut |name: &str, element: NodeId| {
                        found.push((name.to_string(), slot, element));
                    },
                );
            }
        }

        for (name, slot, element) in found {
            if self.element_index.contains_key(&name) {
                warn!(file = %self.description.tag, tag = %name, "duplicate type, keeping the first");
                continue;
            }
            self.element_index.insert(name.clone(), (slot, element));
            self.tags.push(name);
        }
        self.tags.sort();
        self.post_set_tags();
    }

    fn post_set_tags(&mut self) {
        self.tag_index = self
            .tags
            .iter()
            .enumerate()
            .map(|(i, tag)| (tag.clone(), i))
            .collect();
        self.prefix = match (self.tags.first(), self.tags.last()) {
            (Some(first), Some(last)) if self.tags.len() > 1 => common_prefix(first, last),
            _ => String::new(),
        };
    }

    /// The description this container was built from.
    #[inline]
    pub fn description(&self) -> &FileDescription {
        &self.description
    }

    /// Record tag of the file.
    #[inline]
    pub fn file_tag(&self) -> &str {
        &self.description.tag
    }

    #[inline]
    pub fn is_combo(&self) -> bool {
        self.description.is_combo()
    }

    /// Whether document 0 was found in the mod root.
    #[inline]
    pub fn is_in_mod(&self) -> bool {
        self.is_in_mod
    }

    /// Whether a backing document may be written.
    pub fn is_writable(&self, slot: usize) -> bool {
        slot < self.files.len() && (slot != 0 || self.is_in_mod)
    }

    /// Logical name of the schema next to the data file.
    pub fn schema_path(&self) -> Option<&str> {
        self.schema_path.as_deref()
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Shared prefix of the sorted tags.
    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    pub fn num_tags(&self) -> usize {
        self.tags.len()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Tag at a sorted position, optionally without the common prefix.
    pub fn tag(&self, index: usize, skip_prefix: bool) -> Option<&str> {
        let tag = self.tags.get(index)?;
        if skip_prefix {
            Some(tag.strip_prefix(self.prefix.as_str()).unwrap_or(tag))
        } else {
            Some(tag)
        }
    }

    /// Sorted position of a tag.
    pub fn tag_index(&self, tag: &str) -> Option<usize> {
        self.tag_index.get(tag).copied()
    }

    /// Backing document slot and record element of a tag.
    pub fn element(&self, tag: &str) -> Option<(usize, NodeId)> {
        self.element_index.get(tag).copied()
    }

    #[inline]
    pub fn num_documents(&self) -> usize {
        self.files.len()
    }

    pub fn document(&self, slot: usize) -> Option<&XmlDocument> {
        self.files.get(slot).map(|f| &f.doc)
    }

    pub(crate) fn document_mut(&mut self, slot: usize) -> Option<&mut XmlDocument> {
        self.files.get_mut(slot).map(|f| &mut f.doc)
    }

    /// Logical name of a backing document.
    pub fn logical_path(&self, slot: usize) -> Option<&str> {
        self.files.get(slot).map(|f| f.logical.as_str())
    }

    /// Element holding the records of a backing document.
    ///
    /// The parent of the first record, or `<Root>/<Tag>s` when the list is
    /// empty.
    pub fn list_element(&self, slot: usize) -> Option<NodeId> {
        let doc = self.document(slot)?;
        let root = doc.root_element()?;
        if let Some(first) = find_first_record(doc, root, Some(&self.description.tag)) {
            return doc.parent(first);
        }
        let list_name = format!("{}s", self.description.tag);
        doc.first_child_element(root, Some(&list_name))
    }

    /// Replace every leaf element whose text is `old` with `new`.
    ///
    /// Only documents that changed are written. A document outside the mod
    /// is left untouched and counted as skipped.
    pub fn rename_type(&mut self, old: &str, new: &str) -> Result<TypeRename> {
        let mut outcome = TypeRename::default();
        for slot in 0..self.files.len() {
            let doc = &self.files[slot].doc;
            let hits: Vec<NodeId> = doc
                .descendants(NodeId::DOCUMENT)
                .filter(|&node| {
                    doc.is_element(node)
                        && doc.first_child_element(node, None).is_none()
                        && doc.text(node) == Some(old)
                })
                .collect();
            if hits.is_empty() {
                continue;
            }
            if !self.is_writable(slot) {
                warn!(
                    file = %self.files[slot].logical,
                    old,
                    new,
                    references = hits.len(),
                    "not renaming references in a file outside the mod"
                );
                outcome.skipped += 1;
                continue;
            }

            let doc = &mut self.files[slot].doc;
            for node in hits {
                doc.set_text(node, new)?;
            }
            self.write_file(slot)?;
            outcome.written += 1;
        }
        if outcome.changed() {
            debug!(file = %self.description.tag, old, new, "renamed type references");
            self.set_all_tags();
        }
        Ok(outcome)
    }

    /// Write a backing document to the mod root.
    ///
    /// Document 0 is refused with [`Error::ReadOnlyFile`] unless it came
    /// from the mod.
    pub fn write_file(&self, slot: usize) -> Result<()> {
        let file = self.files.get(slot).ok_or_else(|| Error::UnknownDocument {
            file: self.description.tag.clone(),
            index: slot,
        })?;
        if !self.is_writable(slot) {
            warn!(file = %file.logical, "refusing to write a file outside the mod");
            return Err(Error::ReadOnlyFile {
                path: file.logical.clone(),
            });
        }
        let path = self.paths.write_path(&file.logical)?;
        file.doc.save(&path)?;
        debug!(file = %file.logical, path = %path.display(), "wrote data file");
        Ok(())
    }

    /// Write every writable backing document. Returns how many were written.
    pub fn write_all_files(&self) -> Result<usize> {
        let mut written = 0;
        for slot in 0..self.files.len() {
            if !self.is_writable(slot) {
                continue;
            }
            self.write_file(slot)?;
            written += 1;
        }
        Ok(written)
    }

    /// Write document 0 into the mod root, making it editable.
    pub fn copy_to_mod(&mut self) -> Result<()> {
        if self.is_in_mod || self.files.is_empty() {
            return Ok(());
        }
        self.is_in_mod = true;
        if let Err(e) = self.write_file(0) {
            self.is_in_mod = false;
            return Err(e);
        }
        Ok(())
    }
}

/// Walk the records named `tag` starting at `first`, descending into
/// `sub_type` groups.
fn collect_tags(
    doc: &XmlDocument,
    first: NodeId,
    tag: &str,
    sub_type: Option<&str>,
    found: &mut dyn FnMut(&str, NodeId),
) {
    let mut cursor = Some(first);
    while let Some(element) = cursor {
        if let Some(name) = doc
            .first_child_element(element, Some(TYPE_TAG))
            .and_then(|t| doc.text(t))
        {
            found(name, element);
        }
        if let Some(group) = sub_type.and_then(|s| doc.first_child_element(element, Some(s))) {
            if let Some(nested) = doc.first_child_element(group, None) {
                collect_tags(doc, nested, tag, sub_type, found);
            }
        }
        cursor = doc.next_sibling_element(element, Some(tag));
    }
}

fn common_prefix(a: &str, b: &str) -> String {
    let len: usize = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(c, _)| c.len_utf8())
        .sum();
    a[..len].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        editor_mod, unit_class_description, unit_description, vanilla_only, write_files,
        UNIT_SCHEMA,
    };

    #[test]
    fn test_tags_sorted_with_prefix() {
        let dir = editor_mod();
        let paths = SearchPaths::with_mod(dir.path());
        let units = FileContainer::load(unit_description(), &paths).unwrap();

        assert_eq!(units.tags(), ["UNIT_ARCHER", "UNIT_WARRIOR", "UNIT_ZEBRA"]);
        assert_eq!(units.prefix(), "UNIT_");
        assert_eq!(units.tag(1, true), Some("WARRIOR"));
        assert_eq!(units.tag(1, false), Some("UNIT_WARRIOR"));
        assert_eq!(units.tag(3, false), None);
        assert_eq!(units.tag_index("UNIT_ZEBRA"), Some(2));
        assert!(units.is_in_mod());
        assert_eq!(units.schema_path(), Some("Units/CIV4UnitSchema.xml"));
        assert!(units.schema().unwrap().element_type("UnitInfo").is_some());

        let (slot, element) = units.element("UNIT_ARCHER").unwrap();
        assert_eq!(slot, 0);
        assert_eq!(units.document(0).unwrap().name(element), Some("UnitInfo"));
    }

    #[test]
    fn test_single_tag_has_no_prefix() {
        let dir = tempfile::tempdir().unwrap();
        write_files(
            dir.path(),
            &[
                ("Units/CIV4UnitSchema.xml", UNIT_SCHEMA),
                (
                    "Units/CIV4UnitInfos.xml",
                    r#"<Civ4UnitInfos xmlns="x-schema:CIV4UnitSchema.xml"><UnitInfos><UnitInfo><Type>UNIT_WARRIOR</Type></UnitInfo></UnitInfos></Civ4UnitInfos>"#,
                ),
            ],
        );
        let units = FileContainer::load(unit_description(), &SearchPaths::with_mod(dir.path())).unwrap();
        assert_eq!(units.tags(), ["UNIT_WARRIOR"]);
        assert_eq!(units.prefix(), "");
        assert_eq!(units.tag(0, true), Some("UNIT_WARRIOR"));
    }

    #[test]
    fn test_sub_type_groups_are_scanned() {
        let dir = tempfile::tempdir().unwrap();
        write_files(
            dir.path(),
            &[
                ("Units/CIV4UnitSchema.xml", UNIT_SCHEMA),
                (
                    "Units/CIV4UnitInfos.xml",
                    r#"<Civ4UnitInfos xmlns="x-schema:CIV4UnitSchema.xml">
                        <UnitInfos>
                            <UnitInfo>
                                <Type>UNIT_B</Type>
                                <Upgrades>
                                    <UnitInfo><Type>UNIT_C</Type></UnitInfo>
                                    <UnitInfo><Type>UNIT_A</Type></UnitInfo>
                                </Upgrades>
                            </UnitInfo>
                            <UnitInfo><Type>UNIT_B</Type></UnitInfo>
                        </UnitInfos>
                    </Civ4UnitInfos>"#,
                ),
            ],
        );
        let desc = unit_description().with_sub_type("Upgrades");
        let units = FileContainer::load(desc, &SearchPaths::with_mod(dir.path())).unwrap();
        assert_eq!(units.tags(), ["UNIT_A", "UNIT_B", "UNIT_C"]);
        assert_eq!(units.prefix(), "UNIT_");

        // First occurrence wins.
        let doc = units.document(0).unwrap();
        let (_, b) = units.element("UNIT_B").unwrap();
        assert!(doc.first_child_element(b, Some("Upgrades")).is_some());
    }

    #[test]
    fn test_missing_schema_reference() {
        let dir = tempfile::tempdir().unwrap();
        write_files(
            dir.path(),
            &[(
                "Units/CIV4UnitInfos.xml",
                "<Civ4UnitInfos><UnitInfos/></Civ4UnitInfos>",
            )],
        );
        let result = FileContainer::load(unit_description(), &SearchPaths::with_mod(dir.path()));
        assert!(matches!(result, Err(Error::MissingSchema { file }) if file == "Units/CIV4UnitInfos.xml"));
    }

    #[test]
    fn test_combo_tags() {
        let desc = FileDescription::combo("InfoClass", "Misc", ["UnitInfo", "BuildingInfo", "UnitInfo"]);
        let combo = FileContainer::load(desc, &SearchPaths::default()).unwrap();
        assert!(combo.is_combo());
        assert_eq!(combo.tags(), ["BuildingInfo", "UnitInfo"]);
        assert_eq!(combo.num_documents(), 0);
        assert_eq!(combo.write_all_files().unwrap(), 0);
    }

    #[test]
    fn test_list_element() {
        let dir = tempfile::tempdir().unwrap();
        write_files(
            dir.path(),
            &[
                ("Units/CIV4UnitSchema.xml", UNIT_SCHEMA),
                (
                    "Units/CIV4UnitInfos.xml",
                    r#"<Civ4UnitInfos xmlns="x-schema:CIV4UnitSchema.xml"><UnitInfos/></Civ4UnitInfos>"#,
                ),
            ],
        );
        let units = FileContainer::load(unit_description(), &SearchPaths::with_mod(dir.path())).unwrap();
        assert_eq!(units.num_tags(), 0);
        let list = units.list_element(0).unwrap();
        assert_eq!(units.document(0).unwrap().name(list), Some("UnitInfos"));

        let dir = editor_mod();
        let units = FileContainer::load(unit_description(), &SearchPaths::with_mod(dir.path())).unwrap();
        let list = units.list_element(0).unwrap();
        assert_eq!(units.document(0).unwrap().name(list), Some("UnitInfos"));
    }

    #[test]
    fn test_write_round_trip() {
        let dir = editor_mod();
        let paths = SearchPaths::with_mod(dir.path());
        let mut units = FileContainer::load(unit_description(), &paths).unwrap();

        let (slot, element) = units.element("UNIT_ZEBRA").unwrap();
        let doc = units.document_mut(slot).unwrap();
        let cost = doc.first_child_element(element, Some("iCost")).unwrap();
        doc.set_text(cost, "7").unwrap();
        units.write_file(slot).unwrap();
        assert!(matches!(units.write_file(4), Err(Error::UnknownDocument { index: 4, .. })));

        let reloaded = FileContainer::load(unit_description(), &paths).unwrap();
        assert_eq!(reloaded.tags(), units.tags());
        let (_, element) = reloaded.element("UNIT_ZEBRA").unwrap();
        let doc = reloaded.document(0).unwrap();
        let cost = doc.first_child_element(element, Some("iCost")).unwrap();
        assert_eq!(doc.text(cost), Some("7"));
    }

    #[test]
    fn test_rename_type_writes_only_on_change() {
        let dir = editor_mod();
        let paths = SearchPaths::with_mod(dir.path());
        let mut classes = FileContainer::load(unit_class_description(), &paths).unwrap();

        assert!(classes.rename_type("UNIT_WARRIOR", "UNIT_BRAVE").unwrap().changed());
        let reloaded = FileContainer::load(unit_class_description(), &paths).unwrap();
        let doc = reloaded.document(0).unwrap();
        let defaults: Vec<&str> = doc
            .descendants(NodeId::DOCUMENT)
            .filter(|&n| doc.name(n) == Some("DefaultUnit"))
            .filter_map(|n| doc.text(n))
            .collect();
        assert_eq!(defaults, ["UNIT_BRAVE", "UNIT_ARCHER"]);

        let file = dir.path().join("Units/CIV4UnitClassInfos.xml");
        std::fs::remove_file(&file).unwrap();
        assert_eq!(classes.rename_type("UNIT_WARRIOR", "UNIT_BRAVE").unwrap(), TypeRename::default());
        assert!(!file.exists());
    }

    #[test]
    fn test_rename_type_updates_own_tags() {
        let dir = editor_mod();
        let mut units = FileContainer::load(unit_description(), &SearchPaths::with_mod(dir.path())).unwrap();
        assert!(units.rename_type("UNIT_ARCHER", "UNIT_BOWMAN").unwrap().changed());
        assert_eq!(units.tags(), ["UNIT_BOWMAN", "UNIT_WARRIOR", "UNIT_ZEBRA"]);
    }

    #[test]
    fn test_vanilla_file_is_read_only() {
        let (modd, _vanilla, paths) = vanilla_only();
        let mut units = FileContainer::load(unit_description(), &paths).unwrap();
        assert!(!units.is_in_mod());
        assert!(!units.is_writable(0));

        assert!(matches!(units.write_file(0), Err(Error::ReadOnlyFile { .. })));
        assert_eq!(units.write_all_files().unwrap(), 0);
        assert_eq!(
            units.rename_type("UNIT_WARRIOR", "UNIT_BRAVE").unwrap(),
            TypeRename { written: 0, skipped: 1 }
        );
        assert_eq!(units.tags()[1], "UNIT_WARRIOR");
        assert!(!modd.path().join("Units/CIV4UnitInfos.xml").exists());

        units.copy_to_mod().unwrap();
        assert!(units.is_in_mod());
        assert!(modd.path().join("Units/CIV4UnitInfos.xml").exists());
        assert_eq!(
            units.rename_type("UNIT_WARRIOR", "UNIT_BRAVE").unwrap(),
            TypeRename { written: 1, skipped: 0 }
        );
    }

    #[test]
    fn test_add_document() {
        let dir = editor_mod();
        write_files(
            dir.path(),
            &[(
                "Units/CIV4UnitInfosExtra.xml",
                r#"<Civ4UnitInfos><UnitInfos><UnitInfo><Type>UNIT_AXEMAN</Type></UnitInfo><UnitInfo><Type>UNIT_ARCHER</Type></UnitInfo></UnitInfos></Civ4UnitInfos>"#,
            )],
        );
        let mut units = FileContainer::load(unit_description(), &SearchPaths::with_mod(dir.path())).unwrap();
        let slot = units.add_document("Units/CIV4UnitInfosExtra.xml").unwrap();
        assert_eq!(slot, 1);
        assert_eq!(
            units.tags(),
            ["UNIT_ARCHER", "UNIT_AXEMAN", "UNIT_WARRIOR", "UNIT_ZEBRA"]
        );
        assert_eq!(units.element("UNIT_ARCHER").unwrap().0, 0);
        assert_eq!(units.element("UNIT_AXEMAN").unwrap().0, 1);
        assert_eq!(units.write_all_files().unwrap(), 2);
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix("UNIT_ARCHER", "UNIT_ZEBRA"), "UNIT_");
        assert_eq!(common_prefix("abc", "abc"), "abc");
        assert_eq!(common_prefix("éa", "éb"), "é");
        assert_eq!(common_prefix("a", "b"), "");
    }
}
