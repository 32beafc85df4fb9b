//! The editor: every described file, one of them active.

use civxml_common::{FxHashMap, SearchPaths};
use civxml_dom::{NodeId, XmlDocument};
use civxml_reader::{Schema, NONE_TEXT};
use tracing::{debug, info, warn};

use crate::normalize::normalize_to_schema;
use crate::object::ObjectArena;
use crate::settings::TagInfo;
use crate::{EditorSettings, Error, FileContainer, Result, TextFileStorage, TypeRename};

const MAX_BUTTON_DEPTH: usize = 16;

/// Schema-driven editor over the files of a mod.
///
/// Files are identified by index in tag order. One file is active at a
/// time: its schema drives the object cursors (see
/// [`root_object`](Self::root_object)) and its generated text file
/// (`Text/XML_AUTO_<tag>.xml` in the mod) receives new text keys.
///
/// Switching the active file invalidates every [`ObjectId`](crate::ObjectId)
/// handed out before.
///
/// # Example
///
/// ```no_run
/// use civxml_common::SearchPaths;
/// use civxml_editor::XmlEditor;
///
/// let paths = SearchPaths::with_mod("Mods/MyMod/Assets/XML").with_root("Assets/XML");
/// let mut editor = XmlEditor::new(paths)?;
///
/// let units = editor.file_index("UnitInfo").unwrap();
/// editor.set_active_file(units)?;
///
/// let warrior = editor.record_object("UNIT_WARRIOR")?.unwrap();
/// let mut field = editor.first_child(warrior)?;
/// while let Some(id) = field {
///     println!("{} = {:?}", editor.name(id)?, editor.value(id)?);
///     field = editor.next(id)?;
/// }
/// # Ok::<(), civxml_editor::Error>(())
/// ```
#[derive(Debug)]
pub struct XmlEditor {
    paths: SearchPaths,
    settings: EditorSettings,
    containers: Vec<FileContainer>,
    container_index: FxHashMap<String, usize>,
    dirs: Vec<String>,
    active: Option<usize>,
    pub(crate) schema: Schema,
    pub(crate) text_file: Option<TextFileStorage>,
    pub(crate) objects: ObjectArena,
}

impl XmlEditor {
    /// Read the editor settings and load every listed file.
    pub fn new(paths: SearchPaths) -> Result<Self> {
        let settings = EditorSettings::open(&paths)?;
        Ok(Self::with_settings(paths, settings))
    }

    /// Load the files listed in `settings`.
    ///
    /// A file that fails to load is skipped with a warning.
    pub fn with_settings(paths: SearchPaths, settings: EditorSettings) -> Self {
        let mut containers = Vec::with_capacity(settings.files().len());
        for description in settings.files() {
            match FileContainer::load(description.clone(), &paths) {
                Ok(container) => containers.push(container),
                Err(e) => warn!(file = %description.tag, error = %e, "skipping file"),
            }
        }
        containers.sort_by(|a, b| a.file_tag().cmp(b.file_tag()));

        let container_index = containers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.file_tag().to_string(), i))
            .collect();
        let mut dirs: Vec<String> = containers
            .iter()
            .map(|c| c.description().dir.clone())
            .collect();
        dirs.sort();
        dirs.dedup();

        info!(files = containers.len(), "editor ready");
        Self {
            paths,
            settings,
            containers,
            container_index,
            dirs,
            active: None,
            schema: Schema::default(),
            text_file: None,
            objects: ObjectArena::default(),
        }
    }

    pub fn paths(&self) -> &SearchPaths {
        &self.paths
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut EditorSettings {
        &mut self.settings
    }

    // ---- files -------------------------------------------------------------

    #[inline]
    pub fn num_files(&self) -> usize {
        self.containers.len()
    }

    /// Index of the file with a record tag.
    pub fn file_index(&self, tag: &str) -> Option<usize> {
        self.container_index.get(tag).copied()
    }

    pub fn container(&self, file: usize) -> Option<&FileContainer> {
        self.containers.get(file)
    }

    pub fn container_by_tag(&self, tag: &str) -> Option<&FileContainer> {
        self.container(self.file_index(tag)?)
    }

    pub fn containers(&self) -> &[FileContainer] {
        &self.containers
    }

    pub fn file_tag(&self, file: usize) -> Option<&str> {
        self.container(file).map(FileContainer::file_tag)
    }

    pub fn file_dir(&self, file: usize) -> Option<&str> {
        self.container(file).map(|c| c.description().dir.as_str())
    }

    pub fn file_prefix(&self, file: usize) -> Option<&str> {
        self.container(file).map(FileContainer::prefix)
    }

    /// Distinct directories of all files, sorted.
    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }

    pub fn num_types(&self, file: usize) -> usize {
        self.container(file).map_or(0, FileContainer::num_tags)
    }

    /// Type name at a sorted position. `-1` is `NONE`.
    pub fn type_at(&self, file: usize, index: i32) -> Option<&str> {
        if index == -1 {
            return Some(NONE_TEXT);
        }
        let index = usize::try_from(index).ok()?;
        self.container(file)?.tag(index, false)
    }

    /// Type name at a sorted position without the file's common prefix.
    pub fn type_no_prefix(&self, file: usize, index: i32) -> Option<&str> {
        if index == -1 {
            return Some(NONE_TEXT);
        }
        let index = usize::try_from(index).ok()?;
        self.container(file)?.tag(index, true)
    }

    pub fn is_combo(&self, file: usize) -> bool {
        self.container(file).is_some_and(FileContainer::is_combo)
    }

    /// Index of the `member`-th file of a combo file.
    pub fn combo_file(&self, file: usize, member: usize) -> Option<usize> {
        let combo = self.container(file)?;
        self.file_index(combo.tag(member, false)?)
    }

    /// Position of the combo member that defines `value`.
    pub fn combo_file_index(&self, file: usize, value: &str) -> Option<usize> {
        let combo = self.container(file)?;
        combo.tags().iter().position(|tag| {
            self.container_by_tag(tag)
                .is_some_and(|member| member.element(value).is_some())
        })
    }

    // ---- active file -------------------------------------------------------

    /// Make a file active, loading its schema and generated text file.
    pub fn set_active_file(&mut self, file: usize) -> Result<()> {
        let container = self
            .containers
            .get(file)
            .ok_or_else(|| Error::UnknownFile(file.to_string()))?;
        let text_path = self
            .paths
            .write_path(&format!("Text/XML_AUTO_{}.xml", container.file_tag()))?;
        let text_file = TextFileStorage::open(text_path, false)?;

        self.schema = container.schema().cloned().unwrap_or_default();
        self.text_file = Some(text_file);
        self.active = Some(file);
        self.objects.reset();
        debug!(file = %container.file_tag(), "active file changed");
        Ok(())
    }

    #[inline]
    pub fn active_file(&self) -> Option<usize> {
        self.active
    }

    pub fn active_container(&self) -> Result<&FileContainer> {
        let active = self.active.ok_or(Error::NoActiveFile)?;
        self.containers
            .get(active)
            .ok_or_else(|| Error::UnknownFile(active.to_string()))
    }

    pub(crate) fn active_container_mut(&mut self) -> Result<&mut FileContainer> {
        let active = self.active.ok_or(Error::NoActiveFile)?;
        self.containers
            .get_mut(active)
            .ok_or_else(|| Error::UnknownFile(active.to_string()))
    }

    pub(crate) fn container_mut(&mut self, file: usize) -> Result<&mut FileContainer> {
        self.containers
            .get_mut(file)
            .ok_or_else(|| Error::UnknownFile(file.to_string()))
    }

    pub(crate) fn active_document(&self, slot: usize) -> Result<&XmlDocument> {
        let container = self.active_container()?;
        container.document(slot).ok_or_else(|| Error::UnknownDocument {
            file: container.file_tag().to_string(),
            index: slot,
        })
    }

    pub(crate) fn active_document_mut(&mut self, slot: usize) -> Result<&mut XmlDocument> {
        let container = self.active_container_mut()?;
        let file = container.file_tag().to_string();
        container
            .document_mut(slot)
            .ok_or(Error::UnknownDocument { file, index: slot })
    }

    /// Schema of the active file.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Generated text file of the active file.
    pub fn text_file(&self) -> Option<&TextFileStorage> {
        self.text_file.as_ref()
    }

    pub fn text_file_mut(&mut self) -> Option<&mut TextFileStorage> {
        self.text_file.as_mut()
    }

    /// Editor hint for a tag, with overrides for the active file.
    pub fn info(&self, tag: &str, setting: &str) -> Option<&str> {
        let file_tag = self
            .active
            .and_then(|i| self.containers.get(i))
            .map(FileContainer::file_tag);
        self.settings.info(tag, setting, file_tag)
    }

    /// All editor hints for a tag.
    pub fn tag_info(&self, tag: &str) -> TagInfo {
        let file_tag = self
            .active
            .and_then(|i| self.containers.get(i))
            .map(FileContainer::file_tag);
        self.settings.tag_info(tag, file_tag)
    }

    // ---- writing -----------------------------------------------------------

    /// Fail with [`Error::ReadOnlyFile`] unless a document of the active
    /// file may be modified.
    pub fn ensure_writable(&self, slot: usize) -> Result<()> {
        let container = self.active_container()?;
        if container.is_writable(slot) {
            return Ok(());
        }
        warn!(file = %container.file_tag(), slot, "refusing to modify a file outside the mod");
        Err(Error::ReadOnlyFile {
            path: container
                .logical_path(slot)
                .unwrap_or_else(|| container.file_tag())
                .to_string(),
        })
    }

    pub(crate) fn write_slot(&self, slot: usize) -> Result<()> {
        self.active_container()?.write_file(slot)
    }

    /// Write the main document of the active file.
    pub fn write_active_file(&self) -> Result<()> {
        self.write_slot(0)
    }

    /// Write every writable document of every file.
    pub fn write_all_files(&self) -> Result<usize> {
        let mut written = 0;
        for container in &self.containers {
            written += container.write_all_files()?;
        }
        Ok(written)
    }

    /// Copy the active file into the mod so it can be edited.
    pub fn copy_active_file_to_mod(&mut self) -> Result<()> {
        self.active_container_mut()?.copy_to_mod()
    }

    /// Re-index after a type change, then rename references everywhere.
    ///
    /// With both names present and different, every leaf whose text is
    /// `old` is changed to `new` in every file of the mod. Files outside the
    /// mod that hold references are counted as skipped.
    pub fn set_types(&mut self, old: Option<&str>, new: Option<&str>) -> Result<TypeRename> {
        if let Ok(container) = self.active_container_mut() {
            container.set_all_tags();
        }
        let (Some(old), Some(new)) = (old, new) else {
            return Ok(TypeRename::default());
        };
        if old.is_empty() || new.is_empty() || old == new {
            return Ok(TypeRename::default());
        }
        let mut total = TypeRename::default();
        for container in &mut self.containers {
            total += container.rename_type(old, new)?;
        }
        if total.skipped > 0 {
            warn!(old, new, files = total.skipped, "references left in files outside the mod");
        }
        info!(old, new, files = total.written, "renamed type");
        Ok(total)
    }

    /// Bring the active file into schema order and write it if it changed.
    ///
    /// Object handles are invalidated when anything changed.
    pub fn normalize_active_file(&mut self) -> Result<bool> {
        self.ensure_writable(0)?;
        let active = self.active.ok_or(Error::NoActiveFile)?;
        let container = self
            .containers
            .get_mut(active)
            .ok_or_else(|| Error::UnknownFile(active.to_string()))?;
        let file = container.file_tag().to_string();
        let doc = container
            .document_mut(0)
            .ok_or(Error::UnknownDocument { file, index: 0 })?;
        let root = doc.root_element().ok_or(civxml_dom::Error::MissingRoot)?;

        let changed = normalize_to_schema(doc, &self.schema, root)?;
        if changed {
            container.write_file(0)?;
            container.set_all_tags();
            self.objects.reset();
            debug!(file = %container.file_tag(), "normalized active file");
        }
        Ok(changed)
    }

    // ---- buttons -----------------------------------------------------------

    /// Button art of an element of the active file.
    ///
    /// Follows fields that refer to other files' types, then the
    /// `ButtonChild` hint (default `Button`), until an element of class
    /// `Button` is reached.
    pub fn button_art(&self, slot: usize, element: NodeId) -> Option<&str> {
        let doc = self.active_document(slot).ok()?;
        self.button_art_in(doc, element, 0)
    }

    fn button_art_in<'a>(&'a self, doc: &'a XmlDocument, element: NodeId, depth: usize) -> Option<&'a str> {
        if depth > MAX_BUTTON_DEPTH {
            return None;
        }
        let name = doc.name(element)?;

        if let Some(file) = self.info(name, "Type") {
            let container = self.container_by_tag(file)?;
            let (slot, target) = container.element(doc.text(element)?)?;
            return self.button_art_in(container.document(slot)?, target, depth + 1);
        }

        let child_name = self.info(name, "ButtonChild").unwrap_or("Button");
        if let Some(child) = doc.first_child_element(element, Some(child_name)) {
            return self.button_art_in(doc, child, depth + 1);
        }

        if self.info(name, "Class") == Some("Button") {
            return doc.text(element);
        }
        None
    }
}
