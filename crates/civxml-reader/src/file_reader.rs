//! Record list iteration over one cached data file.

use civxml_dom::{NodeId, XmlDocument};
use tracing::{debug, warn};

use crate::cache::{DocumentCache, DocumentHandle};
use crate::reader::{empty_document, XmlReader};
use crate::schema::Schema;
use crate::{Alerts, Error, Result, XmlAlert};

/// Element naming a record's identity.
pub const TYPE_TAG: &str = "Type";

/// Which file to load and how strictly.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileSpec {
    /// Logical path, e.g. `Units/CIV4UnitInfos.xml`.
    pub path: String,
    /// Element name of one record. When absent the first element with a
    /// `Type` child is taken as the first record.
    pub record_tag: Option<String>,
    /// Missing required files abort the load instead of raising an alert.
    pub required: bool,
}

impl FileSpec {
    /// An optional file with records located by their `Type` child.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            record_tag: None,
            required: false,
        }
    }

    /// Mark the file as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Locate records by element name.
    pub fn with_record_tag(mut self, tag: impl Into<String>) -> Self {
        self.record_tag = Some(tag.into());
        self
    }
}

/// One data file opened for reading, with its schema.
///
/// Missing optional files and malformed documents leave the reader empty
/// (and raise an alert); iteration then yields nothing.
///
/// # Example
///
/// ```no_run
/// use civxml_common::SearchPaths;
/// use civxml_reader::{Alerts, DocumentCache, FileReader, FileSpec};
///
/// let mut cache = DocumentCache::new(SearchPaths::with_mod("Assets/XML"));
/// let alerts = Alerts::new();
/// let reader = FileReader::open(&mut cache, &FileSpec::new("Units/CIV4UnitInfos.xml"), &alerts)?;
///
/// let mut unit = reader.first_list_element()?;
/// while unit.is_valid() {
///     let record = unit.record()?;
///     println!("{}: cost {}", unit.type_name(), record.read_int("iCost", 0));
///     unit.next()?;
/// }
/// # Ok::<(), civxml_reader::Error>(())
/// ```
#[derive(Debug)]
pub struct FileReader {
    spec: FileSpec,
    document: Option<DocumentHandle>,
    schema: Option<Schema>,
    first_record: Option<NodeId>,
    alerts: Alerts,
}

impl FileReader {
    /// Open a data file and its schema through the cache.
    pub fn open(cache: &mut DocumentCache, spec: &FileSpec, alerts: &Alerts) -> Result<Self> {
        let mut reader = Self {
            spec: spec.clone(),
            document: None,
            schema: None,
            first_record: None,
            alerts: alerts.clone(),
        };

        let handle = match cache.get_or_load(&spec.path) {
            Err(Error::Common(civxml_common::Error::NotFound { name, .. })) if spec.required => {
                return Err(civxml_common::Error::MissingRequiredFile { name }.into());
            }
            result => match downgrade(result, &spec.path, alerts)? {
                Some(handle) => handle,
                None => return Ok(reader),
            },
        };

        let doc = handle.document()?;
        let root = doc.root_element();

        if let Some(schema_path) = root
            .and_then(|root| doc.attribute(root, "xmlns"))
            .and_then(|xmlns| xmlns.strip_prefix("x-schema:"))
            .map(|name| sibling_path(&spec.path, name))
        {
            if let Some(schema_handle) = load(cache, &schema_path, alerts)? {
                reader.schema = Some(Schema::from_document(schema_handle.document()?));
            }
        }

        reader.first_record =
            root.and_then(|root| find_first_record(doc, root, spec.record_tag.as_deref()));
        if reader.first_record.is_none() {
            debug!(file = %spec.path, "file has no records");
        }
        reader.document = Some(handle);
        Ok(reader)
    }

    /// The file specification this reader was opened with.
    #[inline]
    pub fn spec(&self) -> &FileSpec {
        &self.spec
    }

    /// Logical file name.
    #[inline]
    pub fn file_name(&self) -> &str {
        &self.spec.path
    }

    /// The parsed schema, if the file referenced one that could be loaded.
    #[inline]
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// The alert sink this reader reports to.
    #[inline]
    pub fn alerts(&self) -> &Alerts {
        &self.alerts
    }

    /// Whether no document was loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.document.is_none()
    }

    /// The document, checking that the cache was not cleared.
    pub(crate) fn document(&self) -> Result<Option<&XmlDocument>> {
        self.document.as_ref().map(DocumentHandle::document).transpose()
    }

    /// Number of records in the file.
    pub fn num_types(&self) -> Result<usize> {
        self.records()?.try_fold(0, |count, record| record.map(|_| count + 1))
    }

    /// Cursor positioned on the first record.
    ///
    /// Neither the cursor nor any reader it spawns can be used after the
    /// cache is cleared; they report [`Error::StaleDocument`].
    pub fn first_list_element(&self) -> Result<TypeContainer<'_>> {
        let doc = self.document()?;
        Ok(TypeContainer::new(self, doc, self.first_record))
    }

    /// Iterate over all records in document order.
    ///
    /// Each step re-checks the cache: once it has been cleared the iterator
    /// yields [`Error::StaleDocument`] and then ends.
    pub fn records(&self) -> Result<Records<'_>> {
        let first = self.first_list_element()?;
        Ok(Records {
            cursor: Some(first),
            started: false,
        })
    }

    /// Check every record against its schema declaration.
    ///
    /// Raises [`XmlAlert::UnknownField`] for undeclared child elements and
    /// [`XmlAlert::MissingField`] for required fields that are absent.
    /// Returns the number of alerts raised.
    pub fn validate(&self) -> Result<usize> {
        let (Some(schema), Some(doc)) = (self.schema.as_ref(), self.document()?) else {
            return Ok(0);
        };

        let mut raised = 0;
        for record in self.records()? {
            let record = record?;
            let Some(element) = record.element() else {
                continue;
            };
            let Some(decl) = doc.name(element).and_then(|name| schema.element_type(name)) else {
                continue;
            };

            for child in doc.child_elements(element, None) {
                let name = doc.name(child).unwrap_or_default();
                if decl.field(name).is_none() {
                    self.alerts.push(XmlAlert::UnknownField {
                        file: self.spec.path.clone(),
                        record: record.type_name().to_string(),
                        field: name.to_string(),
                    });
                    raised += 1;
                }
            }

            for field in decl.fields.iter().filter(|f| !f.is_optional()) {
                if doc.first_child_element(element, Some(&field.type_name)).is_none() {
                    self.alerts.push(XmlAlert::MissingField {
                        file: self.spec.path.clone(),
                        record: record.type_name().to_string(),
                        field: field.type_name.clone(),
                    });
                    raised += 1;
                }
            }
        }
        Ok(raised)
    }
}

/// Load a document, downgrading a miss or a parse failure to an alert.
fn load(cache: &mut DocumentCache, path: &str, alerts: &Alerts) -> Result<Option<DocumentHandle>> {
    downgrade(cache.get_or_load(path), path, alerts)
}

fn downgrade(
    result: Result<DocumentHandle>,
    path: &str,
    alerts: &Alerts,
) -> Result<Option<DocumentHandle>> {
    match result {
        Ok(handle) => Ok(Some(handle)),
        Err(Error::Common(civxml_common::Error::NotFound { .. })) => {
            alerts.push(XmlAlert::MissingFile {
                file: path.to_string(),
            });
            Ok(None)
        }
        Err(Error::Dom(civxml_dom::Error::Io(e))) => Err(Error::Io(e)),
        Err(Error::Dom(e)) => {
            warn!(file = path, error = %e, "skipping malformed document");
            alerts.push(XmlAlert::MalformedDocument {
                file: path.to_string(),
                message: e.to_string(),
            });
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Path of `name` in the directory of `path`.
///
/// `Units/CIV4UnitInfos.xml` + `CIV4UnitSchema.xml` -> `Units/CIV4UnitSchema.xml`.
pub fn sibling_path(path: &str, name: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{name}"),
        None => name.to_string(),
    }
}

/// Find the first record element below `root`.
///
/// Descends through first children until reaching an element named
/// `record_tag`, or without a tag, the first element carrying a `Type` child.
pub fn find_first_record(
    doc: &XmlDocument,
    root: NodeId,
    record_tag: Option<&str>,
) -> Option<NodeId> {
    let mut cursor = Some(root);
    while let Some(element) = cursor {
        let found = match record_tag {
            Some(tag) => doc.name(element) == Some(tag),
            None => doc.first_child_element(element, Some(TYPE_TAG)).is_some(),
        };
        if found {
            return Some(element);
        }
        cursor = doc.first_child_element(element, None);
    }
    None
}

/// Cursor over the records of a [`FileReader`].
#[derive(Debug, Clone)]
pub struct TypeContainer<'r> {
    reader: &'r FileReader,
    element: Option<NodeId>,
    type_name: String,
}

impl<'r> TypeContainer<'r> {
    fn new(reader: &'r FileReader, doc: Option<&XmlDocument>, element: Option<NodeId>) -> Self {
        let mut container = Self {
            reader,
            element: None,
            type_name: String::new(),
        };
        container.set_element(doc, element);
        container
    }

    fn set_element(&mut self, doc: Option<&XmlDocument>, element: Option<NodeId>) {
        self.element = element;
        self.type_name = match (doc, element) {
            (Some(doc), Some(element)) => doc
                .first_child_element(element, Some(TYPE_TAG))
                .and_then(|ty| doc.text(ty))
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        };
    }

    /// Whether the cursor is on a record.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.element.is_some()
    }

    /// Text of the record's `Type` child.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The record element.
    #[inline]
    pub fn element(&self) -> Option<NodeId> {
        self.element
    }

    /// Advance to the next sibling with the same element name.
    pub fn next(&mut self) -> Result<()> {
        let doc = self.reader.document()?;
        let next = match (doc, self.element) {
            (Some(doc), Some(element)) => doc.next_sibling_element(element, doc.name(element)),
            _ => None,
        };
        self.set_element(doc, next);
        Ok(())
    }

    /// Typed reader over the current record.
    pub fn record(&self) -> Result<XmlReader<'_>> {
        let doc = self.reader.document()?.unwrap_or_else(|| empty_document());
        Ok(XmlReader::new(
            doc,
            self.element,
            self.reader.file_name(),
            &self.type_name,
            &self.reader.alerts,
        ))
    }
}

/// Iterator over records in document order.
#[derive(Debug)]
pub struct Records<'r> {
    cursor: Option<TypeContainer<'r>>,
    started: bool,
}

impl<'r> Iterator for Records<'r> {
    type Item = Result<TypeContainer<'r>>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        if self.started {
            if let Err(e) = cursor.next() {
                warn!(file = %cursor.reader.file_name(), error = %e, "record iteration interrupted");
                self.cursor = None;
                return Some(Err(e));
            }
        }
        self.started = true;
        if !cursor.is_valid() {
            self.cursor = None;
            return None;
        }
        Some(Ok(cursor.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{unit_mod, write_files};
    use civxml_common::SearchPaths;

    fn open(dir: &std::path::Path, spec: FileSpec) -> (DocumentCache, Alerts, Result<FileReader>) {
        let mut cache = DocumentCache::new(SearchPaths::with_mod(dir));
        let alerts = Alerts::new();
        let reader = FileReader::open(&mut cache, &spec, &alerts);
        (cache, alerts, reader)
    }

    #[test]
    fn test_iterates_in_document_order() {
        let dir = unit_mod();
        let (_cache, alerts, reader) = open(dir.path(), FileSpec::new("Units/CIV4UnitInfos.xml"));
        let reader = reader.unwrap();

        assert!(reader.schema().is_some());
        assert_eq!(reader.num_types().unwrap(), 3);

        let mut unit = reader.first_list_element().unwrap();
        let mut types = Vec::new();
        while unit.is_valid() {
            types.push(unit.type_name().to_string());
            unit.next().unwrap();
        }
        assert_eq!(types, vec!["UNIT_WARRIOR", "UNIT_ARCHER", "UNIT_ZEBRA"]);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_record_tag_lookup() {
        let dir = unit_mod();
        let spec = FileSpec::new("Units/CIV4UnitInfos.xml").with_record_tag("UnitInfo");
        let (_cache, _alerts, reader) = open(dir.path(), spec);
        let names: Vec<String> = reader
            .unwrap()
            .records()
            .unwrap()
            .map(|r| r.unwrap().type_name().to_string())
            .collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_missing_optional_file_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let (_cache, alerts, reader) = open(dir.path(), FileSpec::new("Civics/CIV4CivicInfos.xml"));
        let reader = reader.unwrap();
        assert!(reader.is_empty());
        assert_eq!(reader.num_types().unwrap(), 0);
        assert!(!reader.first_list_element().unwrap().is_valid());
        assert_eq!(
            alerts.snapshot(),
            vec![XmlAlert::MissingFile {
                file: "Civics/CIV4CivicInfos.xml".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_required_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (_cache, _alerts, reader) =
            open(dir.path(), FileSpec::new("GlobalDefines.xml").required());
        match reader {
            Err(Error::Common(civxml_common::Error::MissingRequiredFile { name })) => {
                assert_eq!(name, "GlobalDefines.xml")
            }
            other => panic!("expected MissingRequiredFile, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_document_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_files(dir.path(), &[("Bad.xml", "<Root><Unclosed></Root>")]);
        let (_cache, alerts, reader) = open(dir.path(), FileSpec::new("Bad.xml"));
        assert_eq!(reader.unwrap().num_types().unwrap(), 0);
        assert!(matches!(
            alerts.snapshot().as_slice(),
            [XmlAlert::MalformedDocument { .. }]
        ));
    }

    #[test]
    fn test_missing_schema_alerts_but_reads() {
        let dir = tempfile::tempdir().unwrap();
        write_files(
            dir.path(),
            &[(
                "Units/CIV4UnitInfos.xml",
                crate::fixtures::UNIT_INFOS,
            )],
        );
        let (_cache, alerts, reader) = open(dir.path(), FileSpec::new("Units/CIV4UnitInfos.xml"));
        let reader = reader.unwrap();
        assert!(reader.schema().is_none());
        assert_eq!(reader.num_types().unwrap(), 3);
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn test_stale_after_clear() {
        let dir = unit_mod();
        let (mut cache, _alerts, reader) = open(dir.path(), FileSpec::new("Units/CIV4UnitInfos.xml"));
        let reader = reader.unwrap();
        let mut unit = reader.first_list_element().unwrap();

        cache.clear();
        assert!(matches!(unit.next(), Err(Error::StaleDocument { .. })));
        assert!(matches!(unit.record(), Err(Error::StaleDocument { .. })));
        assert!(matches!(reader.num_types(), Err(Error::StaleDocument { .. })));
    }

    #[test]
    fn test_clear_during_iteration_is_reported() {
        let dir = unit_mod();
        let (mut cache, _alerts, reader) = open(dir.path(), FileSpec::new("Units/CIV4UnitInfos.xml"));
        let reader = reader.unwrap();
        let mut records = reader.records().unwrap();

        let first = records.next().unwrap().unwrap();
        assert_eq!(first.type_name(), "UNIT_WARRIOR");

        cache.clear();
        assert!(matches!(records.next(), Some(Err(Error::StaleDocument { .. }))));
        assert!(records.next().is_none());
    }

    #[test]
    fn test_validate() {
        let dir = unit_mod();
        write_files(
            dir.path(),
            &[(
                "Units/CIV4UnitInfos.xml",
                r#"<Civ4UnitInfos xmlns="x-schema:CIV4UnitSchema.xml">
                    <UnitInfos>
                        <UnitInfo><Type>UNIT_A</Type><iCost>1</iCost></UnitInfo>
                        <UnitInfo><Type>UNIT_B</Type><iBogus>1</iBogus></UnitInfo>
                    </UnitInfos>
                </Civ4UnitInfos>"#,
            )],
        );
        let (_cache, alerts, reader) = open(dir.path(), FileSpec::new("Units/CIV4UnitInfos.xml"));
        let raised = reader.unwrap().validate().unwrap();
        assert_eq!(raised, 2);
        let alerts = alerts.snapshot();
        assert!(alerts.contains(&XmlAlert::UnknownField {
            file: "Units/CIV4UnitInfos.xml".to_string(),
            record: "UNIT_B".to_string(),
            field: "iBogus".to_string(),
        }));
        assert!(alerts.contains(&XmlAlert::MissingField {
            file: "Units/CIV4UnitInfos.xml".to_string(),
            record: "UNIT_B".to_string(),
            field: "iCost".to_string(),
        }));
    }

    #[test]
    fn test_sibling_path() {
        assert_eq!(sibling_path("Units/CIV4UnitInfos.xml", "S.xml"), "Units/S.xml");
        assert_eq!(sibling_path("CIV4UnitInfos.xml", "S.xml"), "S.xml");
    }
}
