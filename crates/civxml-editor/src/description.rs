//! Editor file list entries.

use civxml_dom::{NodeId, XmlDocument};

use crate::{Error, Result};

/// One `<File>` entry of the editor file list.
///
/// ```xml
/// <File>
///     <Tag>UnitInfo</Tag>
///     <Dir>Units</Dir>
///     <Name>CIV4UnitInfos</Name>
///     <Root>Civ4UnitInfos</Root>
/// </File>
/// ```
///
/// A description with a `SubFiles` child is a combo file: it owns no
/// document and lists the tags of other files instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescription {
    /// Element name of one record, also the file's identity.
    pub tag: String,
    /// Directory below the XML root.
    pub dir: String,
    /// File name without the `.xml` extension.
    pub name: Option<String>,
    /// Name of the document's root element.
    pub root: Option<String>,
    /// Element grouping nested records of the same tag.
    pub sub_type: Option<String>,
    /// Member file tags of a combo file.
    pub sub_files: Option<Vec<String>>,
}

impl FileDescription {
    /// Description of a single data file.
    pub fn single(tag: &str, dir: &str, name: &str, root: &str) -> Self {
        Self {
            tag: tag.to_string(),
            dir: dir.to_string(),
            name: Some(name.to_string()),
            root: Some(root.to_string()),
            sub_type: None,
            sub_files: None,
        }
    }

    /// Description of a combo file over other files' tags.
    pub fn combo<I, S>(tag: &str, dir: &str, sub_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag: tag.to_string(),
            dir: dir.to_string(),
            name: None,
            root: None,
            sub_type: None,
            sub_files: Some(sub_files.into_iter().map(Into::into).collect()),
        }
    }

    /// Group nested records under `sub_type` elements.
    pub fn with_sub_type(mut self, sub_type: &str) -> Self {
        self.sub_type = Some(sub_type.to_string());
        self
    }

    /// Read a `<File>` element.
    pub fn from_element(doc: &XmlDocument, element: NodeId) -> Result<Self> {
        let child = |name: &str| {
            doc.first_child_element(element, Some(name))
                .and_then(|e| doc.text(e))
                .map(str::to_string)
        };

        let tag = child("Tag");
        let Some(dir) = child("Dir") else {
            return Err(Error::IncompleteDescription { tag, field: "Dir" });
        };
        let Some(tag) = tag else {
            return Err(Error::IncompleteDescription { tag: None, field: "Tag" });
        };

        let sub_files = doc
            .first_child_element(element, Some("SubFiles"))
            .map(|list| {
                doc.child_elements(list, Some("Tag"))
                    .filter_map(|t| doc.text(t))
                    .map(str::to_string)
                    .collect()
            });

        let description = Self {
            tag,
            dir,
            name: child("Name"),
            root: child("Root"),
            sub_type: child("SubType"),
            sub_files,
        };

        if !description.is_combo() {
            if description.name.is_none() {
                return Err(Error::IncompleteDescription {
                    tag: Some(description.tag),
                    field: "Name",
                });
            }
            if description.root.is_none() {
                return Err(Error::IncompleteDescription {
                    tag: Some(description.tag),
                    field: "Root",
                });
            }
        }
        Ok(description)
    }

    /// Whether this is a combo file.
    #[inline]
    pub fn is_combo(&self) -> bool {
        self.sub_files.is_some()
    }

    /// Logical path of the data file, `<Dir>/<Name>.xml`.
    pub fn logical_path(&self) -> Option<String> {
        self.name
            .as_ref()
            .map(|name| format!("{}/{}.xml", self.dir, name))
    }
}
