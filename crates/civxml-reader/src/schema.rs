//! The schema dialect describing record shapes.
//!
//! Schemas are XML documents of the form
//!
//! ```xml
//! <Schema xmlns="urn:schemas-microsoft-com:xml-data" xmlns:dt="urn:schemas-microsoft-com:datatypes">
//!     <ElementType name="Type" content="textOnly"/>
//!     <ElementType name="iCost" content="textOnly" dt:type="int"/>
//!     <ElementType name="UnitInfo" content="eltOnly">
//!         <element type="Type"/>
//!         <element type="iCost" minOccurs="0"/>
//!     </ElementType>
//!     <ElementType name="UnitInfos" content="eltOnly">
//!         <element type="UnitInfo" maxOccurs="*"/>
//!     </ElementType>
//! </Schema>
//! ```
//!
//! Only the attributes `name`, `type`, `minOccurs`, `maxOccurs`, `content`
//! and `dt:type` carry meaning.

use civxml_common::FxHashMap;
use civxml_dom::{NodeId, XmlDocument};

/// Index of an [`ElementType`] within its [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    /// Position of the type in declaration order.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Upper cardinality bound of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    /// `maxOccurs` absent or `1`
    One,
    /// `maxOccurs="*"`
    Many,
}

/// Primitive classification of an element type.
///
/// There is no explicit string marker in the dialect: whatever is not
/// boolean, int or an element-only container is a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `dt:type="boolean"`
    Bool,
    /// `dt:type="int"`
    Int,
    /// `content="eltOnly"` (composite with child elements)
    Dir,
    /// Anything else
    String,
}

/// One `<element type=".."/>` declaration inside an `ElementType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub type_name: String,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
}

impl FieldDecl {
    /// `minOccurs="0"`.
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0
    }

    /// `maxOccurs="*"`.
    #[inline]
    pub fn is_list(&self) -> bool {
        self.max_occurs == MaxOccurs::Many
    }
}

/// One `<ElementType>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementType {
    pub name: String,
    pub content: Option<String>,
    pub data_type: Option<String>,
    pub fields: Vec<FieldDecl>,
}

impl ElementType {
    /// Classify the type from its schema attributes.
    pub fn kind(&self) -> FieldKind {
        match self.data_type.as_deref() {
            Some("boolean") => FieldKind::Bool,
            Some("int") => FieldKind::Int,
            _ if self.content.as_deref() == Some("eltOnly") => FieldKind::Dir,
            _ => FieldKind::String,
        }
    }

    /// Position and declaration of a field by element name.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDecl)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.type_name == name)
    }
}

/// A parsed schema document.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: Vec<ElementType>,
    index: FxHashMap<String, TypeId>,
}

impl Schema {
    /// Build from a schema document.
    ///
    /// Unnamed `ElementType`s are skipped; when a name is declared twice the
    /// first declaration wins.
    pub fn from_document(doc: &XmlDocument) -> Self {
        let mut schema = Schema::default();
        let Some(root) = doc.root_element() else {
            return schema;
        };

        for decl in doc.child_elements(root, Some("ElementType")) {
            let Some(name) = doc.attribute(decl, "name") else {
                continue;
            };
            if schema.index.contains_key(name) {
                continue;
            }
            let element_type = ElementType {
                name: name.to_string(),
                content: doc.attribute(decl, "content").map(str::to_string),
                data_type: doc.attribute(decl, "dt:type").map(str::to_string),
                fields: parse_fields(doc, decl),
            };
            schema.push(element_type);
        }
        schema
    }

    fn push(&mut self, element_type: ElementType) -> TypeId {
        let id = TypeId(self.types.len());
        self.index.insert(element_type.name.clone(), id);
        self.types.push(element_type);
        id
    }

    /// Look up a type id by element name.
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.index.get(name).copied()
    }

    /// Look up a type by element name.
    pub fn element_type(&self, name: &str) -> Option<&ElementType> {
        self.type_id(name).map(|id| &self.types[id.0])
    }

    /// Get a type by id.
    pub fn get(&self, id: TypeId) -> Option<&ElementType> {
        self.types.get(id.0)
    }

    /// All types in declaration order.
    pub fn types(&self) -> &[ElementType] {
        &self.types
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the schema declares no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn parse_fields(doc: &XmlDocument, decl: NodeId) -> Vec<FieldDecl> {
    doc.child_elements(decl, Some("element"))
        .filter_map(|field| {
            let type_name = doc.attribute(field, "type")?;
            let min_occurs = match doc.attribute(field, "minOccurs") {
                Some("0") => 0,
                _ => 1,
            };
            let max_occurs = match doc.attribute(field, "maxOccurs") {
                Some("*") => MaxOccurs::Many,
                _ => MaxOccurs::One,
            };
            Some(FieldDecl {
                type_name: type_name.to_string(),
                min_occurs,
                max_occurs,
            })
        })
        .collect()
}
