//! Enum name tables and typed enum binding.
//!
//! Records reference each other by `Type` name (`UNIT_WARRIOR`,
//! `YIELD_FOOD`). At load time those names are mapped to dense ordinals
//! through an [`EnumTable`]. Unknown names collapse to the `NONE` sentinel
//! (`-1`), but [`EnumValue`] keeps "legitimately NONE" and "typo" apart.

use std::marker::PhantomData;

use civxml_common::FxHashMap;

use crate::{FileReader, Result};

/// Name to ordinal table for one enum type.
#[derive(Debug, Clone)]
pub struct EnumTable {
    type_name: String,
    tag: String,
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl EnumTable {
    /// Create a table.
    ///
    /// `type_name` is the enum's name used in diagnostics (`YieldTypes`),
    /// `tag` the element name a value is stored under (`YieldType`). Names
    /// get ordinals in iteration order; a repeated name keeps its first
    /// ordinal.
    pub fn new<I, S>(type_name: &str, tag: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = FxHashMap::default();
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self {
            type_name: type_name.to_string(),
            tag: tag.to_string(),
            names,
            index,
        }
    }

    /// Build a table from the `Type` values of a loaded file, in document order.
    pub fn from_reader(reader: &FileReader, type_name: &str, tag: &str) -> Result<Self> {
        let names = reader
            .records()?
            .map(|record| record.map(|r| r.type_name().to_string()))
            .collect::<Result<Vec<String>>>()?;
        Ok(Self::new(type_name, tag, names))
    }

    /// Enum type name, e.g. `YieldTypes`.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Element name values of this enum are stored under, e.g. `YieldType`.
    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// All names in ordinal order.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Ordinal of a name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Name of an ordinal.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Classify a piece of XML text.
    pub fn lookup(&self, text: &str) -> EnumValue {
        match self.index_of(text) {
            Some(index) => EnumValue::Known(index),
            None if text == NONE_TEXT => EnumValue::None,
            None => EnumValue::Unrecognized(text.to_string()),
        }
    }
}

/// The literal text meaning "no value".
pub const NONE_TEXT: &str = "NONE";

/// Result of binding XML text against an [`EnumTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumValue {
    /// A name found in the table.
    Known(usize),
    /// Missing element or the literal `NONE`.
    None,
    /// Text that is not a name of this enum.
    Unrecognized(String),
}

impl EnumValue {
    /// Raw value of the `NONE` sentinel.
    pub const NONE_INDEX: i32 = -1;

    /// Ordinal, or `-1` for both `None` and `Unrecognized`.
    pub fn index(&self) -> i32 {
        match self {
            EnumValue::Known(index) => *index as i32,
            EnumValue::None | EnumValue::Unrecognized(_) => Self::NONE_INDEX,
        }
    }

    /// Whether the value names a table entry.
    pub fn is_known(&self) -> bool {
        matches!(self, EnumValue::Known(_))
    }
}

/// A Rust enum bound to an XML name table.
///
/// Implemented by [`xml_enum!`](crate::xml_enum).
pub trait XmlEnum: Copy + Eq + Sized + 'static {
    /// Enum type name used in diagnostics.
    const TYPE_NAME: &'static str;
    /// Element name values are stored under.
    const TAG: &'static str;
    /// The `-1` sentinel.
    const NONE: Self;
    /// All values except `NONE`, in ordinal order.
    const VARIANTS: &'static [Self];

    /// The name table for this enum.
    fn table() -> &'static EnumTable;

    /// Ordinal of the value, `-1` for `NONE`.
    fn index(self) -> i32;

    /// Value for an ordinal.
    fn from_index(index: usize) -> Option<Self> {
        Self::VARIANTS.get(index).copied()
    }

    /// Value for a raw ordinal, mapping anything out of range to `NONE`.
    fn from_i32(raw: i32) -> Self {
        usize::try_from(raw)
            .ok()
            .and_then(Self::from_index)
            .unwrap_or(Self::NONE)
    }

    /// XML name of the value.
    fn xml_name(self) -> &'static str {
        usize::try_from(self.index())
            .ok()
            .and_then(|i| Self::table().name(i))
            .unwrap_or(NONE_TEXT)
    }

    /// Iterate all values except `NONE`.
    fn iter() -> EnumIter<Self> {
        EnumIter {
            next: 0,
            _marker: PhantomData,
        }
    }
}

/// Iterator over the values of an [`XmlEnum`].
#[derive(Debug, Clone)]
pub struct EnumIter<T> {
    next: usize,
    _marker: PhantomData<T>,
}

impl<T: XmlEnum> Iterator for EnumIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let value = T::from_index(self.next)?;
        self.next += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = T::VARIANTS.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<T: XmlEnum> ExactSizeIterator for EnumIter<T> {}

/// Declare a Rust enum bound to an XML name table.
///
/// The generated enum has a `None = -1` variant followed by the listed
/// variants with ordinals `0..n`, and implements [`XmlEnum`] and
/// [`InfoElement`](crate::InfoElement).
///
/// # Example
///
/// ```
/// use civxml_reader::{xml_enum, XmlEnum};
///
/// xml_enum! {
///     /// Yields produced by plots and buildings.
///     pub enum YieldTypes: "YieldType" {
///         Food = "YIELD_FOOD",
///         Lumber = "YIELD_LUMBER",
///     }
/// }
///
/// assert_eq!(YieldTypes::Lumber.index(), 1);
/// assert_eq!(YieldTypes::None.index(), -1);
/// assert_eq!(YieldTypes::table().index_of("YIELD_FOOD"), Some(0));
/// assert_eq!(YieldTypes::iter().count(), 2);
/// ```
#[macro_export]
macro_rules! xml_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $tag:literal {
            $( $variant:ident = $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(i32)]
        $vis enum $name {
            None = -1,
            $( $variant ),+
        }

        impl $crate::XmlEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const TAG: &'static str = $tag;
            const NONE: Self = $name::None;
            const VARIANTS: &'static [Self] = &[ $( $name::$variant ),+ ];

            fn table() -> &'static $crate::EnumTable {
                static TABLE: ::std::sync::OnceLock<$crate::EnumTable> = ::std::sync::OnceLock::new();
                TABLE.get_or_init(|| {
                    $crate::EnumTable::new(stringify!($name), $tag, [ $( $text ),+ ])
                })
            }

            fn index(self) -> i32 {
                self as i32
            }
        }

        impl $crate::InfoElement for $name {
            fn column() -> $crate::Column<'static> {
                $crate::Column::Enum(<$name as $crate::XmlEnum>::table())
            }

            fn from_raw(raw: i32) -> Self {
                <$name as $crate::XmlEnum>::from_i32(raw)
            }
        }
    };
}
