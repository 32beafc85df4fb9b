//! Fixed-width rows bound from repeated XML children.

use crate::EnumTable;

/// How one column of an info array is bound.
#[derive(Debug, Clone, Copy)]
pub enum Column<'t> {
    /// Enum name resolved through a table; missing or unknown yields `-1`.
    Enum(&'t EnumTable),
    /// Plain integer; missing or unparseable yields `0`.
    Int,
}

/// A type that can appear as a column of an info array.
pub trait InfoElement: Sized {
    /// Binding used for this column.
    fn column() -> Column<'static>;

    /// Convert a stored raw value back to the typed value.
    fn from_raw(raw: i32) -> Self;
}

impl InfoElement for i32 {
    fn column() -> Column<'static> {
        Column::Int
    }

    fn from_raw(raw: i32) -> Self {
        raw
    }
}

/// Rows of `N` raw values (enum ordinals or integers).
///
/// Filled by [`XmlReader::read_info_array`](crate::XmlReader::read_info_array),
/// which always replaces the whole content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoArray<const N: usize> {
    rows: Vec<[i32; N]>,
}

impl<const N: usize> InfoArray<N> {
    /// Create an empty array.
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Replace the content.
    pub fn assign(&mut self, rows: Vec<[i32; N]>) {
        self.rows = rows;
    }

    /// All rows in document order.
    #[inline]
    pub fn rows(&self) -> &[[i32; N]] {
        &self.rows
    }

    /// Get one row.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&[i32; N]> {
        self.rows.get(index)
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows.
    pub fn iter(&self) -> std::slice::Iter<'_, [i32; N]> {
        self.rows.iter()
    }

    /// Remove all rows.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl<'a, const N: usize> IntoIterator for &'a InfoArray<N> {
    type Item = &'a [i32; N];
    type IntoIter = std::slice::Iter<'a, [i32; N]>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
