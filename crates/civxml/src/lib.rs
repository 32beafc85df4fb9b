//! civxml - typed record reading and schema-driven editing of XML game data.
//!
//! This crate provides a unified interface to the civxml crates:
//!
//! # Crates
//!
//! - [`civxml_common`] - Search paths (mod over base game) and shared errors
//! - [`civxml_dom`] - Mutable XML document model
//! - [`civxml_reader`] - Document cache, record iteration and typed binding
//! - [`civxml_editor`] - Schema-bound editing, text files and normalization
//!
//! # Example
//!
//! ```no_run
//! use civxml::prelude::*;
//!
//! let paths = SearchPaths::with_mod("Mods/MyMod/Assets/XML").with_root("Assets/XML");
//!
//! // Load path: read records into typed values.
//! let mut ctx = LoadContext::new(paths.clone());
//! ctx.enter_stage(LoadStage::Infos);
//! let reader = ctx.open(&FileSpec::new("Units/CIV4UnitInfos.xml").required())?;
//! for unit in reader.records()? {
//!     let unit = unit?;
//!     println!("{} costs {}", unit.type_name(), unit.record()?.read_int("iCost", 0));
//! }
//!
//! // Editor path: change a record in place.
//! let mut editor = XmlEditor::new(paths)?;
//! editor.set_active_file(editor.file_index("UnitInfo").unwrap())?;
//! if let Some(unit) = editor.record_object("UNIT_WARRIOR")? {
//!     println!("{:?}", editor.child_type(unit)?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use civxml_common as common;
pub use civxml_dom as dom;
pub use civxml_editor as editor;
pub use civxml_reader as reader;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use civxml_common::SearchPaths;
    pub use civxml_dom::{NodeId, XmlDocument};
    pub use civxml_editor::{normalize_to_schema, ObjectId, TextFileStorage, TextString, XmlEditor};
    pub use civxml_reader::{
        xml_enum, DocumentCache, EnumTable, EnumValue, FileReader, FileSpec, InfoArray, LoadContext,
        LoadStage, Schema, XmlAlert, XmlEnum, XmlReader,
    };
}

// Re-export commonly used types at the crate root
pub use civxml_editor::XmlEditor;
pub use civxml_reader::LoadContext;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
