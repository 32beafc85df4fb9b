//! Mutable XML document model for civxml.
//!
//! Game data files, their schemas and text tables are all small XML
//! documents that the loader reads and the editor rewrites in place. This
//! crate keeps a parsed document in an arena of nodes addressed by
//! [`NodeId`], so cursors can hold plain ids instead of references and a
//! removed node is detectable rather than dangling.
//!
//! # Example
//!
//! ```no_run
//! use civxml_dom::XmlDocument;
//!
//! let mut doc = XmlDocument::open("Assets/XML/Units/CIV4UnitInfos.xml")?;
//! let root = doc.root_element().unwrap();
//!
//! for list in doc.child_elements(root, None) {
//!     println!("{:?}", doc.name(list));
//! }
//!
//! doc.save("Mods/MyMod/Assets/XML/Units/CIV4UnitInfos.xml")?;
//! # Ok::<(), civxml_dom::Error>(())
//! ```

mod document;
mod error;
mod node;
mod parse;
mod write;

pub use document::{Children, Declaration, Descendants, XmlDocument};
pub use error::{Error, Result};
pub use node::{NodeId, NodeKind};
