//! Schema-driven editing of XML game data files.
//!
//! The editor works on the files of one mod, falling back to the base game
//! for anything the mod does not override:
//!
//! - [`EditorSettings`] reads the list of editable files and per-tag hints
//! - [`FileContainer`] holds the documents of one file and indexes their
//!   records by `Type`; combo files group several of them
//! - [`XmlEditor`] owns every container and walks the active file with
//!   schema-bound cursors ([`ObjectId`]), creating elements at their schema
//!   position on demand
//! - [`TextFileStorage`] and [`TextString`] manage the text keys of
//!   `Civ4GameText` files, including gender and plural variants
//! - [`normalize_to_schema`] brings hand-edited files back into schema order
//!
//! Files outside the mod are never written: edits to them fail with
//! [`Error::ReadOnlyFile`] until they are copied into the mod.
//!
//! # Example
//!
//! ```no_run
//! use civxml_common::SearchPaths;
//! use civxml_editor::XmlEditor;
//!
//! let paths = SearchPaths::with_mod("Mods/MyMod/Assets/XML").with_root("Assets/XML");
//! let mut editor = XmlEditor::new(paths)?;
//! editor.set_active_file(editor.file_index("UnitInfo").unwrap())?;
//!
//! let warrior = editor.record_object("UNIT_WARRIOR")?.unwrap();
//! let ty = editor.first_child(warrior)?.unwrap();
//! editor.set_value(ty, "UNIT_BRAVE")?;
//! # Ok::<(), civxml_editor::Error>(())
//! ```

mod container;
mod description;
mod editor;
mod error;
mod normalize;
mod object;
mod settings;
mod text;

#[cfg(test)]
mod fixtures;

pub use container::{FileContainer, TypeRename};
pub use description::FileDescription;
pub use editor::XmlEditor;
pub use error::{Error, Result};
pub use normalize::normalize_to_schema;
pub use object::{ObjectId, TEXT_CLASS, TEXT_FIELDS};
pub use settings::{EditorSettings, Languages, TagInfo, FILES_PATH, INFOS_PATH};
pub use text::{TextFileStorage, TextString, TEXT_ROOT, TOKEN_SEPARATOR};
