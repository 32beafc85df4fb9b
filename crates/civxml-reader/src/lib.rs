//! Cached, typed record reader for XML game data.
//!
//! Game entities (units, yields, civilizations) are described in XML files
//! of repeated records, each identified by its `Type` child. This crate
//! turns those files into typed values during a load pass:
//!
//! - [`DocumentCache`] parses every file once per pass and hands out
//!   [`DocumentHandle`]s that detect use after [`DocumentCache::clear`]
//! - [`FileReader`] and [`TypeContainer`] walk the records of one file in
//!   document order
//! - [`XmlReader`] binds a record's children to scalars, enums, fixed-width
//!   [`InfoArray`]s and text keys
//! - [`XmlAlert`]s collect every binding problem without aborting the load
//!
//! # Quick Start
//!
//! ```no_run
//! use civxml_common::SearchPaths;
//! use civxml_reader::{xml_enum, FileSpec, LoadContext, LoadStage};
//!
//! xml_enum! {
//!     pub enum YieldTypes: "YieldType" {
//!         Food = "YIELD_FOOD",
//!         Lumber = "YIELD_LUMBER",
//!     }
//! }
//!
//! let paths = SearchPaths::with_mod("Mods/MyMod/Assets/XML").with_root("Assets/XML");
//! let mut ctx = LoadContext::new(paths);
//! ctx.enter_stage(LoadStage::Infos);
//!
//! let reader = ctx.open(&FileSpec::new("Units/CIV4UnitInfos.xml").required())?;
//! for unit in reader.records()? {
//!     let unit = unit?;
//!     let record = unit.record()?;
//!     let cost = record.read_int("iCost", 0);
//!     let yields: Vec<(YieldTypes, i32)> = record.read_info_array2("YieldCosts");
//!     println!("{}: {cost} {yields:?}", unit.type_name());
//! }
//!
//! for alert in ctx.finish() {
//!     eprintln!("{alert}");
//! }
//! # Ok::<(), civxml_reader::Error>(())
//! ```

mod alert;
mod cache;
mod context;
mod enums;
mod error;
mod file_reader;
mod info_array;
mod reader;
mod schema;
mod stage;

#[cfg(test)]
mod fixtures;

pub use alert::{Alerts, XmlAlert};
pub use cache::{DocumentCache, DocumentHandle};
pub use context::LoadContext;
pub use enums::{EnumIter, EnumTable, EnumValue, XmlEnum, NONE_TEXT};
pub use error::{Error, Result};
pub use file_reader::{
    find_first_record, sibling_path, FileReader, FileSpec, Records, TypeContainer, TYPE_TAG,
};
pub use info_array::{Column, InfoArray, InfoElement};
pub use reader::XmlReader;
pub use schema::{ElementType, FieldDecl, FieldKind, MaxOccurs, Schema, TypeId};
pub use stage::{LoadStage, TextLookup, TextStage};
