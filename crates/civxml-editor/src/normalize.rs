//! Reconcile a document with its schema.
//!
//! Hand-edited files drift from the schema: fields end up out of order and
//! fields dropped from the schema linger. [`normalize_to_schema`] walks an
//! element against its `ElementType` and
//!
//! - puts the children of a composite element into field order, moving a
//!   child only when it is out of place
//! - keeps every same-named child of a list field and only the first child
//!   of any other field
//! - deletes children the schema does not declare
//! - strips child elements from a scalar element but keeps its text, so
//!   `<iCost>25<Junk/></iCost>` becomes `<iCost>25</iCost>`
//!
//! Elements whose type is unknown to the schema are left alone.

use civxml_dom::{NodeId, XmlDocument};
use civxml_reader::{ElementType, FieldDecl, Schema};

use crate::Result;

/// How an element type constrains its children.
enum Shape<'s> {
    /// No fields, so no child elements.
    Scalar,
    /// A single repeated field.
    List(&'s FieldDecl),
    /// Fields in declaration order.
    Composite(&'s [FieldDecl]),
}

impl<'s> Shape<'s> {
    fn of(element_type: &'s ElementType) -> Self {
        match element_type.fields.as_slice() {
            [] => Shape::Scalar,
            [field] if field.is_list() => Shape::List(field),
            fields => Shape::Composite(fields),
        }
    }
}

/// Normalize `element` and its subtree. Returns whether anything changed.
///
/// Running it again right after makes no further change.
pub fn normalize_to_schema(doc: &mut XmlDocument, schema: &Schema, element: NodeId) -> Result<bool> {
    let Some(element_type) = doc.name(element).and_then(|name| schema.element_type(name)) else {
        return Ok(false);
    };

    match Shape::of(element_type) {
        Shape::Scalar => Ok(doc.remove_child_elements(element)? > 0),
        Shape::List(field) => {
            let mut changed = false;
            let children: Vec<NodeId> = doc.child_elements(element, None).collect();
            for child in children {
                if doc.name(child) == Some(field.type_name.as_str()) {
                    changed |= normalize_to_schema(doc, schema, child)?;
                } else {
                    doc.remove(child)?;
                    changed = true;
                }
            }
            Ok(changed)
        }
        Shape::Composite(fields) => normalize_composite(doc, schema, element, fields),
    }
}

fn normalize_composite(
    doc: &mut XmlDocument,
    schema: &Schema,
    element: NodeId,
    fields: &[FieldDecl],
) -> Result<bool> {
    let mut changed = false;
    let mut placed: Vec<NodeId> = Vec::new();

    for field in fields {
        let matching: Vec<NodeId> = doc
            .child_elements(element, Some(&field.type_name))
            .filter(|child| !placed.contains(child))
            .collect();
        let take = if field.is_list() { matching.len() } else { matching.len().min(1) };

        for &child in &matching[..take] {
            let expected = match placed.last() {
                Some(&previous) => doc.next_sibling_element(previous, None),
                None => doc.first_child_element(element, None),
            };
            if expected != Some(child) {
                match placed.last() {
                    Some(&previous) => doc.insert_after(previous, child)?,
                    None => doc.insert_first_child(element, child)?,
                }
                changed = true;
            }
            changed |= normalize_to_schema(doc, schema, child)?;
            placed.push(child);
        }
    }

    let leftovers: Vec<NodeId> = doc
        .child_elements(element, None)
        .filter(|child| !placed.contains(child))
        .collect();
    for child in leftovers {
        doc.remove(child)?;
        changed = true;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::UNIT_SCHEMA;

    fn schema() -> Schema {
        Schema::from_document(&XmlDocument::parse(UNIT_SCHEMA).unwrap())
    }

    fn child_names(doc: &XmlDocument, element: NodeId) -> Vec<String> {
        doc.child_elements(element, None)
            .filter_map(|e| doc.name(e))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_reorders_and_prunes() {
        let schema = schema();
        let mut doc = XmlDocument::parse(
            r#"<Civ4UnitInfos>
                <UnitInfos>
                    <UnitInfo>
                        <iCost>15</iCost>
                        <Obsolete>1</Obsolete>
                        <Description>TXT_KEY_UNIT_WARRIOR</Description>
                        <Type>UNIT_WARRIOR</Type>
                        <Flavors>
                            <Flavor><iFlavor>2</iFlavor><FlavorType>FLAVOR_MILITARY</FlavorType></Flavor>
                            <Junk/>
                            <Flavor><FlavorType>FLAVOR_GOLD</FlavorType><iFlavor>1</iFlavor></Flavor>
                        </Flavors>
                        <iCost>99</iCost>
                    </UnitInfo>
                    <Stray/>
                </UnitInfos>
            </Civ4UnitInfos>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();

        assert!(normalize_to_schema(&mut doc, &schema, root).unwrap());

        let list = doc.first_child_element(root, None).unwrap();
        assert_eq!(child_names(&doc, list), ["UnitInfo"]);
        let unit = doc.first_child_element(list, None).unwrap();
        assert_eq!(child_names(&doc, unit), ["Type", "Description", "iCost", "Flavors"]);
        let cost = doc.first_child_element(unit, Some("iCost")).unwrap();
        assert_eq!(doc.text(cost), Some("15"));

        let flavors = doc.first_child_element(unit, Some("Flavors")).unwrap();
        assert_eq!(child_names(&doc, flavors), ["Flavor", "Flavor"]);
        let first = doc.first_child_element(flavors, None).unwrap();
        assert_eq!(child_names(&doc, first), ["FlavorType", "iFlavor"]);

        assert!(!normalize_to_schema(&mut doc, &schema, root).unwrap());
    }

    #[test]
    fn test_canonical_document_unchanged() {
        let schema = schema();
        let mut doc = XmlDocument::parse(crate::fixtures::UNIT_INFOS).unwrap();
        let root = doc.root_element().unwrap();
        let before = doc.to_xml_string().unwrap();
        assert!(!normalize_to_schema(&mut doc, &schema, root).unwrap());
        assert_eq!(doc.to_xml_string().unwrap(), before);
    }

    #[test]
    fn test_scalar_keeps_text() {
        let schema = schema();
        let mut doc = XmlDocument::parse("<iCost>5<Nested/></iCost>").unwrap();
        let root = doc.root_element().unwrap();
        assert!(normalize_to_schema(&mut doc, &schema, root).unwrap());
        assert_eq!(doc.text(root), Some("5"));
        assert!(doc.first_child_element(root, None).is_none());
        assert!(!normalize_to_schema(&mut doc, &schema, root).unwrap());
        assert_eq!(doc.text(root), Some("5"));
    }

    #[test]
    fn test_unknown_element_left_alone() {
        let schema = schema();
        let mut doc = XmlDocument::parse("<Mystery><A/><B/></Mystery>").unwrap();
        let root = doc.root_element().unwrap();
        assert!(!normalize_to_schema(&mut doc, &schema, root).unwrap());
        assert_eq!(child_names(&doc, root), ["A", "B"]);
    }
}
