//! Editor configuration documents.
//!
//! Two files below the XML root configure the editor:
//!
//! - `Editor/EditorFiles.xml` lists the editable files (`Files/File`) and the
//!   languages new text entries are created with (`Languages`)
//! - `Editor/EditorInfos.xml` holds per-tag hints (`Tags/<tag>`), optionally
//!   overridden for one file (`FileSpecific/<file tag>/<tag>`)

use civxml_common::{Error as CommonError, SearchPaths};
use civxml_dom::{NodeId, XmlDocument};
use tracing::debug;

use crate::{FileDescription, Result};

/// Logical name of the file list.
pub const FILES_PATH: &str = "Editor/EditorFiles.xml";
/// Logical name of the tag hints.
pub const INFOS_PATH: &str = "Editor/EditorInfos.xml";

const TAGS: &str = "Tags";
const FILE_SPECIFIC: &str = "FileSpecific";

/// Languages appended to every new text entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Languages {
    /// Element names of the non-English languages.
    pub list: Vec<String>,
    /// Placeholder text for each of them.
    pub default_string: String,
}

/// Editor hints for one tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagInfo {
    /// File tag whose types the field refers to.
    pub type_name: Option<String>,
    pub help: Option<String>,
    pub class: Option<String>,
    /// `NONE` is an accepted value.
    pub allow_type_none: bool,
    /// New referenced records may be created from the field.
    pub remote_create: bool,
    /// Keep the active file's prefix in created names.
    pub remote_create_prefix: bool,
    pub button_child: Option<String>,
}

/// Parsed editor configuration.
#[derive(Debug)]
pub struct EditorSettings {
    files: Vec<FileDescription>,
    languages: Languages,
    info: XmlDocument,
    paths: SearchPaths,
}

impl EditorSettings {
    /// Read the configuration through the search paths.
    ///
    /// The file list is required; a missing hints file starts empty.
    pub fn open(paths: &SearchPaths) -> Result<Self> {
        let files = XmlDocument::open(paths.resolve_required(FILES_PATH)?.path)?;
        let info = match paths.resolve(INFOS_PATH) {
            Ok(resolved) => XmlDocument::open(resolved.path)?,
            Err(CommonError::NotFound { .. }) => {
                debug!("no editor infos, starting empty");
                empty_info()
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_documents(&files, info, paths.clone())
    }

    /// Build from already parsed documents.
    pub fn from_documents(files: &XmlDocument, info: XmlDocument, paths: SearchPaths) -> Result<Self> {
        let top = files.document_node();

        let mut descriptions = Vec::new();
        if let Some(list) = files.child_elements(top, Some("Files")).next() {
            for file in files.child_elements(list, Some("File")) {
                descriptions.push(FileDescription::from_element(files, file)?);
            }
        }

        let mut languages = Languages::default();
        if let Some(element) = files.child_elements(top, Some("Languages")).next() {
            if let Some(list) = files.first_child_element(element, Some("List")) {
                languages.list = files
                    .child_elements(list, None)
                    .filter_map(|e| files.name(e))
                    .map(str::to_string)
                    .collect();
            }
            languages.default_string = files
                .first_child_element(element, Some("DefaultString"))
                .and_then(|e| files.text(e))
                .unwrap_or_default()
                .to_string();
        }

        debug!(
            files = descriptions.len(),
            languages = languages.list.len(),
            "read editor settings"
        );
        Ok(Self {
            files: descriptions,
            languages,
            info,
            paths,
        })
    }

    /// Descriptions of the editable files, in list order.
    pub fn files(&self) -> &[FileDescription] {
        &self.files
    }

    pub fn languages(&self) -> &Languages {
        &self.languages
    }

    /// The hints document.
    pub fn info_document(&self) -> &XmlDocument {
        &self.info
    }

    fn top(&self, name: &str) -> Option<NodeId> {
        self.info
            .child_elements(self.info.document_node(), Some(name))
            .next()
    }

    fn setting_of(&self, entry: Option<NodeId>, setting: &str) -> Option<&str> {
        let element = self.info.first_child_element(entry?, Some(setting))?;
        self.info.text(element)
    }

    /// One hint for a tag.
    ///
    /// A `FileSpecific` entry for `file_tag` overrides the general entry
    /// setting by setting.
    pub fn info(&self, tag: &str, setting: &str, file_tag: Option<&str>) -> Option<&str> {
        let specific = file_tag.and_then(|file| {
            let group = self.top(FILE_SPECIFIC)?;
            let file = self.info.first_child_element(group, Some(file))?;
            self.info.first_child_element(file, Some(tag))
        });
        let general = self
            .top(TAGS)
            .and_then(|group| self.info.first_child_element(group, Some(tag)));

        self.setting_of(specific, setting)
            .or_else(|| self.setting_of(general, setting))
    }

    /// All hints for a tag.
    pub fn tag_info(&self, tag: &str, file_tag: Option<&str>) -> TagInfo {
        let text = |setting| self.info(tag, setting, file_tag).map(str::to_string);
        let flag = |setting| self.info(tag, setting, file_tag).is_some();
        TagInfo {
            type_name: text("Type"),
            help: text("Help"),
            class: text("Class"),
            allow_type_none: flag("bAllowTypeNone"),
            remote_create: flag("bRemoteCreate"),
            remote_create_prefix: flag("bRemoteCreatePrefix"),
            button_child: text("ButtonChild"),
        }
    }

    /// Replace the hints for a tag and write the hints file to the mod.
    ///
    /// With `file_tag` the entry goes below `FileSpecific/<file_tag>`.
    /// Entries are kept sorted by element name.
    pub fn set_info(&mut self, file_tag: Option<&str>, tag: &str, info: &TagInfo) -> Result<()> {
        let doc = &mut self.info;
        let document = doc.document_node();
        let group = match file_tag {
            Some(file) => {
                let specific = ensure_child(doc, document, FILE_SPECIFIC, false)?;
                ensure_child(doc, specific, file, true)?
            }
            None => ensure_child(doc, document, TAGS, false)?,
        };
        let entry = ensure_child(doc, group, tag, true)?;
        doc.remove_child_elements(entry)?;

        let values = [
            ("Type", info.type_name.as_deref()),
            ("Help", info.help.as_deref()),
            ("Class", info.class.as_deref()),
            ("bAllowTypeNone", info.allow_type_none.then_some("1")),
            ("bRemoteCreate", info.remote_create.then_some("1")),
            ("bRemoteCreatePrefix", info.remote_create_prefix.then_some("1")),
            ("ButtonChild", info.button_child.as_deref()),
        ];
        for (name, value) in values {
            if let Some(value) = value {
                let child = doc.create_element(name);
                doc.set_text(child, value)?;
                doc.append_child(entry, child)?;
            }
        }

        let path = self.paths.write_path(INFOS_PATH)?;
        self.info.save(&path)?;
        debug!(tag, file = ?file_tag, path = %path.display(), "wrote editor infos");
        Ok(())
    }
}

fn empty_info() -> XmlDocument {
    XmlDocument::with_declaration("1.0", None)
}

/// The child element `name` of `parent`, created if missing.
fn ensure_child(doc: &mut XmlDocument, parent: NodeId, name: &str, sorted: bool) -> Result<NodeId> {
    if let Some(existing) = doc.first_child_element(parent, Some(name)) {
        return Ok(existing);
    }
    let child = doc.create_element(name);
    let before = if sorted {
        doc.child_elements(parent, None)
            .find(|&e| doc.name(e).is_some_and(|n| n > name))
    } else {
        None
    };
    match before {
        Some(before) => doc.insert_before(before, child)?,
        None => doc.append_child(parent, child)?,
    }
    Ok(child)
}
