//! Typed binding of one record element's children.

use std::sync::OnceLock;

use civxml_dom::{NodeId, XmlDocument};

use crate::enums::NONE_TEXT;
use crate::{Alerts, Column, EnumTable, EnumValue, InfoArray, InfoElement, TextStage, XmlAlert, XmlEnum};

/// Document used by readers over files that failed to load.
pub(crate) fn empty_document() -> &'static XmlDocument {
    static EMPTY: OnceLock<XmlDocument> = OnceLock::new();
    EMPTY.get_or_init(XmlDocument::new)
}

/// A view over one XML element, reading its children as typed fields.
///
/// Missing scalars silently take their default. Enum problems raise
/// [`XmlAlert`]s tagged with the file and record and yield `NONE`; they never
/// abort the load.
///
/// Readers are lightweight and borrow from the document.
#[derive(Clone, Copy)]
pub struct XmlReader<'a> {
    doc: &'a XmlDocument,
    element: Option<NodeId>,
    file: &'a str,
    record: &'a str,
    alerts: &'a Alerts,
}

impl<'a> XmlReader<'a> {
    /// Create a reader over `element`.
    ///
    /// `file` and `record` only label alerts.
    pub fn new(
        doc: &'a XmlDocument,
        element: Option<NodeId>,
        file: &'a str,
        record: &'a str,
        alerts: &'a Alerts,
    ) -> Self {
        Self {
            doc,
            element,
            file,
            record,
            alerts,
        }
    }

    /// Whether the reader points at an element.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.element.is_some()
    }

    /// Name of the current element.
    #[inline]
    pub fn name(&self) -> Option<&'a str> {
        self.element.and_then(|e| self.doc.name(e))
    }

    /// The current element.
    #[inline]
    pub fn element(&self) -> Option<NodeId> {
        self.element
    }

    /// The document being read.
    #[inline]
    pub fn document(&self) -> &'a XmlDocument {
        self.doc
    }

    /// Reader over the first child named `name`.
    pub fn first_child(&self, name: &str) -> XmlReader<'a> {
        XmlReader {
            element: self.child(name),
            ..*self
        }
    }

    /// Move to the next sibling with the same element name.
    pub fn next_sibling_same_name(&mut self) {
        self.element = self
            .element
            .and_then(|e| self.doc.next_sibling_element(e, self.doc.name(e)));
    }

    /// Number of children named `name`.
    pub fn num_children(&self, name: &str) -> usize {
        self.element
            .map_or(0, |e| self.doc.child_elements(e, Some(name)).count())
    }

    fn child(&self, tag: &str) -> Option<NodeId> {
        self.element
            .and_then(|e| self.doc.first_child_element(e, Some(tag)))
    }

    fn invalid_number(&self, tag: &str, text: &str) {
        self.alerts.push(XmlAlert::InvalidNumber {
            file: self.file.to_string(),
            record: self.record.to_string(),
            tag: tag.to_string(),
            text: text.to_string(),
        });
    }

    /// Read a boolean child; `default` when absent.
    ///
    /// Accepts integers (non-zero is true) and `true`/`false`.
    pub fn read_bool(&self, tag: &str, default: bool) -> bool {
        let Some(element) = self.child(tag) else {
            return default;
        };
        let text = self.doc.text(element).unwrap_or_default().trim();
        if text.is_empty() {
            return false;
        }
        if let Ok(value) = text.parse::<i64>() {
            return value != 0;
        }
        if text.eq_ignore_ascii_case("true") {
            true
        } else if text.eq_ignore_ascii_case("false") {
            false
        } else {
            self.invalid_number(tag, text);
            false
        }
    }

    /// Read an integer child; `default` when absent.
    pub fn read_int(&self, tag: &str, default: i32) -> i32 {
        match self.child(tag) {
            Some(element) => self.int_text(tag, element),
            None => default,
        }
    }

    fn int_text(&self, tag: &str, element: NodeId) -> i32 {
        let text = self.doc.text(element).unwrap_or_default().trim();
        if text.is_empty() {
            return 0;
        }
        text.parse().unwrap_or_else(|_| {
            self.invalid_number(tag, text);
            0
        })
    }

    /// Read a string child.
    ///
    /// `None` when the child is absent, `Some("")` when it is present but
    /// empty.
    pub fn read_string(&self, tag: &str) -> Option<&'a str> {
        let element = self.child(tag)?;
        Some(self.doc.text(element).unwrap_or_default())
    }

    /// Read an enum child bound through a generated [`XmlEnum`].
    pub fn read_enum<T: XmlEnum>(&self, tag: &str, allow_none: bool) -> T {
        match self.read_enum_value(tag, T::table(), allow_none) {
            EnumValue::Known(index) => T::from_index(index).unwrap_or(T::NONE),
            EnumValue::None | EnumValue::Unrecognized(_) => T::NONE,
        }
    }

    /// Read an enum child bound through a table.
    pub fn read_enum_value(&self, tag: &str, table: &EnumTable, allow_none: bool) -> EnumValue {
        self.bind_enum(tag, self.child(tag), table, allow_none)
    }

    /// Bind `element`'s text against `table`, raising alerts as needed.
    ///
    /// - element missing: `NONE`, plus `MissingEnumType` unless `allow_none`
    /// - text not in the table and not `NONE`: `WrongEnumType`
    /// - literal `NONE`: `NoneEnumType` unless `allow_none`
    fn bind_enum(
        &self,
        tag: &str,
        element: Option<NodeId>,
        table: &EnumTable,
        allow_none: bool,
    ) -> EnumValue {
        let Some(element) = element else {
            if !allow_none {
                self.alerts.push(XmlAlert::MissingEnumType {
                    file: self.file.to_string(),
                    record: self.record.to_string(),
                    tag: tag.to_string(),
                });
            }
            return EnumValue::None;
        };

        let text = self.doc.text(element).unwrap_or_default();
        let value = table.lookup(text);
        match &value {
            EnumValue::Known(_) => {}
            EnumValue::Unrecognized(_) => {
                debug_assert_ne!(text, NONE_TEXT);
                self.alerts.push(XmlAlert::WrongEnumType {
                    file: self.file.to_string(),
                    record: self.record.to_string(),
                    tag: tag.to_string(),
                    element: self.doc.name(element).unwrap_or_default().to_string(),
                    text: text.to_string(),
                    expected: table.type_name().to_string(),
                });
            }
            EnumValue::None if !allow_none => {
                self.alerts.push(XmlAlert::NoneEnumType {
                    file: self.file.to_string(),
                    record: self.record.to_string(),
                    tag: tag.to_string(),
                    element: self.doc.name(element).unwrap_or_default().to_string(),
                });
            }
            EnumValue::None => {}
        }
        value
    }

    fn bind_column(&self, tag: &str, element: Option<NodeId>, column: &Column<'_>, allow_none: bool) -> i32 {
        match column {
            Column::Enum(table) => self.bind_enum(tag, element, table, allow_none).index(),
            Column::Int => element.map_or(0, |e| self.int_text(tag, e)),
        }
    }

    /// Read repeated rows under `tag` into `out`, replacing its content.
    ///
    /// Every child element of `tag` (following siblings with the first
    /// child's name) is one row, in document order. A single column is
    /// stored flat (`<YieldType>YIELD_FOOD</YieldType>`) when the row element
    /// is named after the enum's tag, otherwise one level deeper. Wider rows
    /// read their columns positionally from the row's child elements. Every
    /// column but the last rejects `NONE`.
    pub fn read_info_array<const N: usize>(
        &self,
        tag: &str,
        columns: &[Column<'_>; N],
        out: &mut InfoArray<N>,
    ) {
        let mut rows = Vec::new();
        let list = self.child(tag);
        let mut cursor = list.and_then(|list| self.doc.first_child_element(list, None));

        let flat = match (N, columns.first(), cursor) {
            (1, Some(Column::Enum(table)), Some(first)) => self.doc.name(first) == Some(table.tag()),
            (1, Some(Column::Int), Some(first)) => self.doc.first_child_element(first, None).is_none(),
            _ => false,
        };

        while let Some(row_element) = cursor {
            let mut row = [0i32; N];
            if N == 1 {
                let element = if flat {
                    Some(row_element)
                } else {
                    self.doc.first_child_element(row_element, None)
                };
                row[0] = self.bind_column(tag, element, &columns[0], false);
            } else {
                let mut element = self.doc.first_child_element(row_element, None);
                for (i, column) in columns.iter().enumerate() {
                    let allow_none = i + 1 == N;
                    row[i] = self.bind_column(tag, element, column, allow_none);
                    element = element.and_then(|e| self.doc.next_sibling_element(e, None));
                }
            }
            rows.push(row);
            cursor = self
                .doc
                .next_sibling_element(row_element, self.doc.name(row_element));
        }

        out.assign(rows);
    }

    /// Read single-column rows.
    pub fn read_info_array1<T0: InfoElement>(&self, tag: &str) -> Vec<T0> {
        let mut array = InfoArray::<1>::new();
        self.read_info_array(tag, &[T0::column()], &mut array);
        array.iter().map(|[a]| T0::from_raw(*a)).collect()
    }

    /// Read two-column rows.
    pub fn read_info_array2<T0: InfoElement, T1: InfoElement>(&self, tag: &str) -> Vec<(T0, T1)> {
        let mut array = InfoArray::<2>::new();
        self.read_info_array(tag, &[T0::column(), T1::column()], &mut array);
        array
            .iter()
            .map(|[a, b]| (T0::from_raw(*a), T1::from_raw(*b)))
            .collect()
    }

    /// Read three-column rows.
    pub fn read_info_array3<T0, T1, T2>(&self, tag: &str) -> Vec<(T0, T1, T2)>
    where
        T0: InfoElement,
        T1: InfoElement,
        T2: InfoElement,
    {
        let mut array = InfoArray::<3>::new();
        self.read_info_array(tag, &[T0::column(), T1::column(), T2::column()], &mut array);
        array
            .iter()
            .map(|[a, b, c]| (T0::from_raw(*a), T1::from_raw(*b), T2::from_raw(*c)))
            .collect()
    }

    /// Read four-column rows.
    pub fn read_info_array4<T0, T1, T2, T3>(&self, tag: &str) -> Vec<(T0, T1, T2, T3)>
    where
        T0: InfoElement,
        T1: InfoElement,
        T2: InfoElement,
        T3: InfoElement,
    {
        let mut array = InfoArray::<4>::new();
        self.read_info_array(
            tag,
            &[T0::column(), T1::column(), T2::column(), T3::column()],
            &mut array,
        );
        array
            .iter()
            .map(|[a, b, c, d]| {
                (
                    T0::from_raw(*a),
                    T1::from_raw(*b),
                    T2::from_raw(*c),
                    T3::from_raw(*d),
                )
            })
            .collect()
    }

    /// Read a text key reference.
    ///
    /// Requires a [`TextStage`] token. With `clear_unused`, keys that do not
    /// resolve, resolve to `????`, or resolve to another `TXT_KEY` are
    /// dropped (`None`). Without it, unknown keys are kept and raise
    /// [`XmlAlert::UnknownTextKey`]. When the active language shows raw tags,
    /// the key is returned unchecked.
    pub fn read_text_key(&self, tag: &str, stage: &TextStage<'_>, clear_unused: bool) -> Option<String> {
        let key = self.read_string(tag)?;
        if stage.shows_tags() {
            return Some(key.to_string());
        }

        let resolved = stage.text(key);
        if clear_unused {
            let unused = match resolved.as_deref() {
                None => true,
                Some(text) => text == "????" || (text.len() > 7 && text.starts_with("TXT_KEY")),
            };
            return if unused { None } else { Some(key.to_string()) };
        }

        if resolved.is_none() {
            self.alerts.push(XmlAlert::UnknownTextKey {
                file: self.file.to_string(),
                record: self.record.to_string(),
                tag: tag.to_string(),
                key: key.to_string(),
            });
        }
        Some(key.to_string())
    }
}

impl std::fmt::Debug for XmlReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlReader")
            .field("file", &self.file)
            .field("record", &self.record)
            .field("element", &self.name())
            .finish()
    }
}
