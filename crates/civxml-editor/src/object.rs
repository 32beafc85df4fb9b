//! Schema-bound cursors over the active file.
//!
//! An [`ObjectId`] names one schema field at one position: the field may be
//! backed by an element (allocated) or only declared by the schema
//! (unallocated). Walking fields in schema order with
//! [`XmlEditor::first_child`] and [`XmlEditor::next`] therefore visits
//! every field a record could have, and allocating an unallocated field
//! creates its element at the schema position.
//!
//! Ids are handed out by an arena owned by the editor. Wrapping an element
//! that already has a cursor under the same parent returns the existing id,
//! so repeated walks over a record do not grow the arena. Unallocated
//! positions get a fresh id each time and are only released when the active
//! file changes: that empties the arena, and older ids then fail with
//! [`Error::StaleObject`].

use civxml_common::FxHashMap;
use civxml_dom::NodeId;
use civxml_reader::{FieldDecl, FieldKind, TYPE_TAG};
use tracing::debug;

use crate::text::{TextString, FEMALE, MALE, PLURAL, SINGULAR, TOKEN_SEPARATOR};
use crate::{Error, Result, XmlEditor};

/// Text fields and the suffix of the keys generated for them.
pub const TEXT_FIELDS: [(&str, &str); 4] = [
    ("Civilopedia", "_PEDIA"),
    ("Description", ""),
    ("Help", "_HELP"),
    ("Strategy", "_STRATEGY"),
];

/// Class reported for text fields.
pub const TEXT_CLASS: &str = "TxtKey";

/// Handle of a cursor in the editor's object arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Object {
    slot: usize,
    element: Option<NodeId>,
    parent: Option<ObjectId>,
    name: String,
    /// Position and declaration of the field in the parent's type.
    decl: Option<(usize, FieldDecl)>,
}

#[derive(Debug, Default)]
pub(crate) struct ObjectArena {
    generation: u32,
    objects: Vec<Object>,
    /// Allocated objects by slot, element and parent.
    wrapped: FxHashMap<(usize, NodeId, Option<ObjectId>), u32>,
}

impl ObjectArena {
    /// Forget every object; existing ids become stale.
    pub(crate) fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.objects.clear();
        self.wrapped.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.objects.len()
    }

    fn push(&mut self, object: Object) -> ObjectId {
        let index = match object.element {
            Some(element) => {
                let key = (object.slot, element, object.parent);
                if let Some(&index) = self.wrapped.get(&key) {
                    return ObjectId {
                        index,
                        generation: self.generation,
                    };
                }
                let index = self.objects.len() as u32;
                self.wrapped.insert(key, index);
                index
            }
            None => self.objects.len() as u32,
        };
        self.objects.push(object);
        ObjectId {
            index,
            generation: self.generation,
        }
    }

    fn get(&self, id: ObjectId) -> Result<&Object> {
        if id.generation != self.generation {
            return Err(Error::StaleObject);
        }
        self.objects.get(id.index as usize).ok_or(Error::StaleObject)
    }

    fn get_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        if id.generation != self.generation {
            return Err(Error::StaleObject);
        }
        self.objects
            .get_mut(id.index as usize)
            .ok_or(Error::StaleObject)
    }

    /// Point an object at a new element, or none after a delete.
    fn set_element(&mut self, id: ObjectId, element: Option<NodeId>) -> Result<()> {
        let object = self.get_mut(id)?;
        let (slot, parent, old) = (object.slot, object.parent, object.element);
        object.element = element;
        if let Some(old) = old {
            self.wrapped.remove(&(slot, old, parent));
        }
        if let Some(new) = element {
            self.wrapped.insert((slot, new, parent), id.index);
        }
        Ok(())
    }
}

impl XmlEditor {
    // ---- navigation --------------------------------------------------------

    /// Cursor on the root element of the active file.
    pub fn root_object(&mut self) -> Result<ObjectId> {
        let doc = self.active_document(0)?;
        let root = doc.root_element().ok_or(civxml_dom::Error::MissingRoot)?;
        let name = doc.name(root).unwrap_or_default().to_string();
        Ok(self.objects.push(Object {
            slot: 0,
            element: Some(root),
            parent: None,
            name,
            decl: None,
        }))
    }

    /// Cursor on the record of a type in the active file.
    ///
    /// Cursors for every ancestor up to the root are created with it, so
    /// [`next`](Self::next) walks the record's siblings.
    pub fn record_object(&mut self, tag: &str) -> Result<Option<ObjectId>> {
        let Some((slot, element)) = self.active_container()?.element(tag) else {
            return Ok(None);
        };
        let doc = self.active_document(slot)?;

        let mut chain = vec![element];
        let mut cursor = doc.parent(element);
        while let Some(node) = cursor.filter(|&n| doc.is_element(n)) {
            chain.push(node);
            cursor = doc.parent(node);
        }
        chain.reverse();

        let mut objects = Vec::with_capacity(chain.len());
        let mut parent_name: Option<&str> = None;
        for node in chain {
            let name = doc.name(node).unwrap_or_default();
            let decl = parent_name
                .and_then(|parent| self.schema.element_type(parent))
                .and_then(|t| t.field(name))
                .map(|(i, d)| (i, d.clone()));
            objects.push((node, name.to_string(), decl));
            parent_name = Some(name);
        }

        let mut parent = None;
        for (node, name, decl) in objects {
            let id = self.objects.push(Object {
                slot,
                element: Some(node),
                parent,
                name,
                decl,
            });
            parent = Some(id);
        }
        Ok(parent)
    }

    /// Cursor on the first schema field of an object.
    pub fn first_child(&mut self, id: ObjectId) -> Result<Option<ObjectId>> {
        let object = self.objects.get(id)?;
        let Some(field) = self
            .schema
            .element_type(&object.name)
            .and_then(|t| t.fields.first())
        else {
            return Ok(None);
        };
        let element = match object.element {
            Some(e) => self
                .active_document(object.slot)?
                .first_child_element(e, Some(&field.type_name)),
            None => None,
        };
        let child = Object {
            slot: object.slot,
            element,
            parent: Some(id),
            name: field.type_name.clone(),
            decl: Some((0, field.clone())),
        };
        Ok(Some(self.objects.push(child)))
    }

    /// Cursor on the next field position.
    ///
    /// An allocated list entry is followed by its next same-named sibling,
    /// and after the last one by an unallocated slot for appending. Any
    /// other object is followed by the next field of the parent's type.
    pub fn next(&mut self, id: ObjectId) -> Result<Option<ObjectId>> {
        let object = self.objects.get(id)?;
        let (Some(parent_id), Some((index, decl))) = (object.parent, object.decl.as_ref()) else {
            return Ok(None);
        };
        let (slot, index) = (object.slot, *index);

        if decl.is_list() {
            if let Some(element) = object.element {
                let next = self
                    .active_document(slot)?
                    .next_sibling_element(element, Some(&decl.type_name));
                let sibling = Object {
                    element: next,
                    ..object.clone()
                };
                return Ok(Some(self.objects.push(sibling)));
            }
        }

        let parent = self.objects.get(parent_id)?;
        let Some(field) = self
            .schema
            .element_type(&parent.name)
            .and_then(|t| t.fields.get(index + 1))
        else {
            return Ok(None);
        };
        let element = match parent.element {
            Some(e) => self
                .active_document(slot)?
                .first_child_element(e, Some(&field.type_name)),
            None => None,
        };
        let following = Object {
            slot,
            element,
            parent: Some(parent_id),
            name: field.type_name.clone(),
            decl: Some((index + 1, field.clone())),
        };
        Ok(Some(self.objects.push(following)))
    }

    /// Cursor on the parent object.
    pub fn parent(&self, id: ObjectId) -> Result<Option<ObjectId>> {
        Ok(self.objects.get(id)?.parent)
    }

    // ---- mutation ----------------------------------------------------------

    /// Create the element of an unallocated object and write the file.
    ///
    /// Unallocated ancestors are allocated first. The element goes after
    /// the last sibling of the same or an earlier field, or first.
    pub fn allocate(&mut self, id: ObjectId) -> Result<NodeId> {
        let object = self.objects.get(id)?;
        if object.element.is_some() {
            return Err(Error::AlreadyAllocated {
                name: object.name.clone(),
            });
        }
        let slot = object.slot;
        self.ensure_writable(slot)?;
        let element = self.allocate_inner(id)?;
        self.write_slot(slot)?;
        Ok(element)
    }

    fn allocate_inner(&mut self, id: ObjectId) -> Result<NodeId> {
        let object = self.objects.get(id)?.clone();
        if let Some(element) = object.element {
            return Ok(element);
        }
        let Some(parent_id) = object.parent else {
            return Err(Error::NotAllocated { name: object.name });
        };
        let parent_element = self.allocate_inner(parent_id)?;
        let parent_name = self.objects.get(parent_id)?.name.clone();

        let index = object.decl.as_ref().map_or(0, |(i, _)| *i);
        let anchors: Vec<String> = match self.schema.element_type(&parent_name) {
            Some(t) => t
                .fields
                .iter()
                .take(index + 1)
                .rev()
                .map(|f| f.type_name.clone())
                .collect(),
            None => vec![object.name.clone()],
        };

        let doc = self.active_document_mut(object.slot)?;
        let anchor = anchors
            .iter()
            .find_map(|name| doc.last_child_element(parent_element, Some(name)));
        let element = doc.create_element(&object.name);
        match anchor {
            Some(anchor) => doc.insert_after(anchor, element)?,
            None => doc.insert_first_child(parent_element, element)?,
        }

        self.objects.set_element(id, Some(element))?;
        debug!(name = %object.name, "allocated element");
        Ok(element)
    }

    /// Set the text of an object, allocating it if needed, and write the file.
    ///
    /// Changing a `Type` renames references to it in every file.
    pub fn set_value(&mut self, id: ObjectId, value: &str) -> Result<()> {
        let slot = self.objects.get(id)?.slot;
        self.ensure_writable(slot)?;
        let element = self.allocate_inner(id)?;

        let doc = self.active_document_mut(slot)?;
        let old = doc.text(element).map(str::to_string);
        doc.set_text(element, value)?;
        self.write_slot(slot)?;

        if self.objects.get(id)?.name == TYPE_TAG {
            self.set_types(old.as_deref(), Some(value))?;
        }
        Ok(())
    }

    /// Set a boolean field (`1` or `0`).
    pub fn set_bool(&mut self, id: ObjectId, value: bool) -> Result<()> {
        self.set_value(id, if value { "1" } else { "0" })
    }

    pub fn set_int(&mut self, id: ObjectId, value: i32) -> Result<()> {
        self.set_value(id, &value.to_string())
    }

    /// Remove the element of an object and write the file.
    pub fn delete(&mut self, id: ObjectId) -> Result<()> {
        let object = self.objects.get(id)?;
        let Some(element) = object.element else {
            return Err(Error::NotAllocated {
                name: object.name.clone(),
            });
        };
        let slot = object.slot;
        self.ensure_writable(slot)?;

        self.active_document_mut(slot)?.remove(element)?;
        self.objects.set_element(id, None)?;
        self.write_slot(slot)?;
        self.set_types(None, None)?;
        Ok(())
    }

    /// Copy an allocated list entry, without any `Type`, right after itself.
    ///
    /// Returns the cursor on the copy, or `None` for objects that cannot be
    /// cloned.
    pub fn clone_object(&mut self, id: ObjectId) -> Result<Option<ObjectId>> {
        let object = self.objects.get(id)?.clone();
        let Some(element) = object.element else {
            return Ok(None);
        };
        if !object.decl.as_ref().is_some_and(|(_, d)| d.is_list()) {
            return Ok(None);
        }
        self.ensure_writable(object.slot)?;

        let doc = self.active_document_mut(object.slot)?;
        let copy = doc.clone_subtree(element, |doc, node| doc.name(node) != Some(TYPE_TAG))?;
        doc.insert_after(element, copy)?;
        self.write_slot(object.slot)?;

        Ok(Some(self.objects.push(Object {
            element: Some(copy),
            ..object
        })))
    }

    /// Move an object's element in front of `dest`.
    ///
    /// Both must be the same field. An unallocated `dest` moves the element
    /// behind the last entry of its kind. Returns whether anything moved.
    pub fn move_before(&mut self, id: ObjectId, dest: ObjectId) -> Result<bool> {
        let source = self.objects.get(id)?.clone();
        let target = self.objects.get(dest)?.clone();
        if source.name != target.name || source.slot != target.slot {
            return Ok(false);
        }
        let Some(element) = source.element else {
            return Err(Error::NotAllocated { name: source.name });
        };
        let target_parent = match target.parent {
            Some(parent) => self.objects.get(parent)?.element,
            None => None,
        };
        self.ensure_writable(source.slot)?;

        let doc = self.active_document_mut(source.slot)?;
        match target.element {
            Some(before) => {
                if before == element || doc.next_sibling_element(element, None) == Some(before) {
                    return Ok(false);
                }
                doc.insert_before(before, element)?;
            }
            None => {
                let Some(parent) = target_parent else {
                    return Ok(false);
                };
                match doc.last_child_element(parent, Some(&target.name)) {
                    Some(last) if last == element => return Ok(false),
                    Some(last) => doc.insert_after(last, element)?,
                    None => doc.append_child(parent, element)?,
                }
            }
        }
        self.write_slot(source.slot)?;
        Ok(true)
    }

    // ---- queries -----------------------------------------------------------

    pub fn is_allocated(&self, id: ObjectId) -> Result<bool> {
        Ok(self.objects.get(id)?.element.is_some())
    }

    /// Element backing an object.
    pub fn element(&self, id: ObjectId) -> Result<Option<NodeId>> {
        Ok(self.objects.get(id)?.element)
    }

    /// Element name, which is also the schema type name.
    pub fn name(&self, id: ObjectId) -> Result<&str> {
        Ok(&self.objects.get(id)?.name)
    }

    pub fn kind(&self, id: ObjectId) -> Result<FieldKind> {
        let object = self.objects.get(id)?;
        Ok(self
            .schema
            .element_type(&object.name)
            .map_or(FieldKind::String, |t| t.kind()))
    }

    /// Whether the field may repeat.
    pub fn is_list_element(&self, id: ObjectId) -> Result<bool> {
        Ok(self.objects.get(id)?.decl.as_ref().is_some_and(|(_, d)| d.is_list()))
    }

    pub fn is_optional(&self, id: ObjectId) -> Result<bool> {
        Ok(self
            .objects
            .get(id)?
            .decl
            .as_ref()
            .is_some_and(|(_, d)| d.is_optional()))
    }

    /// Whether the object must exist for its record to be valid.
    pub fn is_mandatory(&self, id: ObjectId) -> Result<bool> {
        let object = self.objects.get(id)?;
        if object.element.is_some() {
            return Ok(true);
        }
        let (Some(parent_id), Some((_, decl))) = (object.parent, object.decl.as_ref()) else {
            return Ok(true);
        };
        if decl.is_optional() {
            return Ok(false);
        }
        if decl.is_list() {
            if let Some(parent) = self.objects.get(parent_id)?.element {
                let doc = self.active_document(object.slot)?;
                if doc.first_child_element(parent, Some(&object.name)).is_some() {
                    return Ok(false);
                }
            }
        }
        self.is_mandatory(parent_id)
    }

    /// Whether deleting leaves the record valid.
    pub fn can_delete(&self, id: ObjectId) -> Result<bool> {
        let object = self.objects.get(id)?;
        let (Some(element), Some((_, decl))) = (object.element, object.decl.as_ref()) else {
            return Ok(false);
        };
        if decl.is_optional() {
            return Ok(true);
        }
        if decl.is_list() {
            let doc = self.active_document(object.slot)?;
            let name = Some(object.name.as_str());
            return Ok(doc.previous_sibling_element(element, name).is_some()
                || doc.next_sibling_element(element, name).is_some());
        }
        Ok(false)
    }

    /// Text of the object's element.
    pub fn value(&self, id: ObjectId) -> Result<Option<&str>> {
        let object = self.objects.get(id)?;
        let Some(element) = object.element else {
            return Ok(None);
        };
        Ok(self.active_document(object.slot)?.text(element))
    }

    /// Whether the text is `1`.
    pub fn bool_value(&self, id: ObjectId) -> Result<bool> {
        Ok(self.value(id)? == Some("1"))
    }

    /// Integer value, `0` when missing or unparseable.
    pub fn int_value(&self, id: ObjectId) -> Result<i32> {
        Ok(self
            .value(id)?
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0))
    }

    /// Text of a child element of the object.
    pub fn child_string(&self, id: ObjectId, child: &str) -> Result<Option<&str>> {
        let object = self.objects.get(id)?;
        let Some(element) = object.element else {
            return Ok(None);
        };
        let doc = self.active_document(object.slot)?;
        Ok(doc
            .first_child_element(element, Some(child))
            .and_then(|c| doc.text(c)))
    }

    /// The object's own `Type` child.
    pub fn child_type(&self, id: ObjectId) -> Result<Option<&str>> {
        self.child_string(id, TYPE_TAG)
    }

    /// The record type the object belongs to.
    ///
    /// The own `Type` child, else the `Type` among the preceding siblings,
    /// else among the following ones.
    pub fn type_name(&self, id: ObjectId) -> Result<Option<&str>> {
        let object = self.objects.get(id)?;
        let Some(element) = object.element else {
            return Ok(None);
        };
        let doc = self.active_document(object.slot)?;
        let text = |e: Option<NodeId>| e.and_then(|e| doc.text(e));
        Ok(text(doc.first_child_element(element, Some(TYPE_TAG)))
            .or_else(|| text(doc.previous_sibling_element(element, Some(TYPE_TAG))))
            .or_else(|| text(doc.next_sibling_element(element, Some(TYPE_TAG)))))
    }

    /// Record type of the parent object.
    pub fn parent_type(&self, id: ObjectId) -> Result<Option<&str>> {
        match self.objects.get(id)?.parent {
            Some(parent) => self.child_type(parent),
            None => Ok(None),
        }
    }

    /// Field names the schema declares for the object, in order.
    pub fn schema_children(&self, id: ObjectId) -> Result<Vec<&str>> {
        let object = self.objects.get(id)?;
        Ok(self
            .schema
            .element_type(&object.name)
            .map(|t| t.fields.iter().map(|f| f.type_name.as_str()).collect())
            .unwrap_or_default())
    }

    pub fn num_schema_children(&self, id: ObjectId) -> Result<usize> {
        let object = self.objects.get(id)?;
        Ok(self
            .schema
            .element_type(&object.name)
            .map_or(0, |t| t.fields.len()))
    }

    // ---- editor hints ------------------------------------------------------

    /// File whose types the object's value refers to.
    pub fn info_type(&self, id: ObjectId) -> Result<Option<usize>> {
        if self.kind(id)? != FieldKind::String {
            return Ok(None);
        }
        let name = self.name(id)?;
        Ok(self.info(name, "Type").and_then(|file| self.file_index(file)))
    }

    pub fn help(&self, id: ObjectId) -> Result<Option<&str>> {
        Ok(self.info(self.name(id)?, "Help"))
    }

    /// Display class of the object. Text fields are [`TEXT_CLASS`].
    pub fn info_class(&self, id: ObjectId) -> Result<Option<&str>> {
        if self.is_text(id)? {
            return Ok(Some(TEXT_CLASS));
        }
        Ok(self.info(self.name(id)?, "Class"))
    }

    pub fn allows_type_none(&self, id: ObjectId) -> Result<bool> {
        Ok(self.info(self.name(id)?, "bAllowTypeNone").is_some())
    }

    pub fn is_remote_create(&self, id: ObjectId) -> Result<bool> {
        Ok(self.info(self.name(id)?, "bRemoteCreate").is_some())
    }

    pub fn is_remote_create_prefix(&self, id: ObjectId) -> Result<bool> {
        Ok(self.info(self.name(id)?, "bRemoteCreatePrefix").is_some())
    }

    pub fn button_child(&self, id: ObjectId) -> Result<Option<&str>> {
        Ok(self.info(self.name(id)?, "ButtonChild"))
    }

    /// Button art of the object's element.
    pub fn object_button_art(&self, id: ObjectId) -> Result<Option<&str>> {
        let object = self.objects.get(id)?;
        Ok(object
            .element
            .and_then(|element| self.button_art(object.slot, element)))
    }

    /// Whether the value refers to a combo file.
    pub fn is_combo_object(&self, id: ObjectId) -> Result<bool> {
        Ok(self.info_type(id)?.is_some_and(|file| self.is_combo(file)))
    }

    /// Member of the combo file that defines the value.
    pub fn active_combo_file(&self, id: ObjectId) -> Result<Option<usize>> {
        let Some(file) = self.info_type(id)?.filter(|&f| self.is_combo(f)) else {
            return Ok(None);
        };
        Ok(self
            .value(id)?
            .and_then(|value| self.combo_file_index(file, value)))
    }

    // ---- text --------------------------------------------------------------

    /// Position of the object in [`TEXT_FIELDS`].
    pub fn text_type(&self, id: ObjectId) -> Result<Option<usize>> {
        let name = self.name(id)?;
        Ok(TEXT_FIELDS.iter().position(|(field, _)| *field == name))
    }

    pub fn is_text(&self, id: ObjectId) -> Result<bool> {
        Ok(self.text_type(id)?.is_some())
    }

    /// English text of the key in the object's value, unselected.
    pub fn text_of(&self, id: ObjectId) -> Result<String> {
        let Some(text) = self.text_string(id)? else {
            return Ok(String::new());
        };
        let doc = self
            .text_file
            .as_ref()
            .map(|t| t.document())
            .ok_or(Error::NoActiveFile)?;
        let source = doc
            .first_child_element(text.element(), Some("Text"))
            .unwrap_or(text.element());
        Ok(doc.text(source).unwrap_or_default().to_string())
    }

    /// English text of the key in the object's value.
    pub fn text_string(&self, id: ObjectId) -> Result<Option<TextString<'_>>> {
        let Some(key) = self.value(id)? else {
            return Ok(None);
        };
        Ok(self.text_file.as_ref().and_then(|t| t.text_string(key)))
    }

    /// Write the variants of a text field, indexed as in
    /// [`TextString::text_from_index`].
    ///
    /// Empty variants are left out. A field without a key gets
    /// `TXT_KEY_<Type><suffix>`, and the key's entry in the active text file
    /// is created or replaced. Male-only text with a singular variant is
    /// stored as plain text, anything else as `Text`/`Gender`/`Plural`
    /// lists.
    pub fn set_text_key(&mut self, id: ObjectId, variants: [&str; 4]) -> Result<()> {
        let Some(text_index) = self.text_type(id)? else {
            return Err(Error::NotText {
                name: self.name(id)?.to_string(),
            });
        };

        // male singular, female singular, male plural, female plural
        let entries: Vec<(&str, bool, bool)> = [0, 2, 1, 3]
            .into_iter()
            .filter_map(|i| {
                let (male, plural) = TextString::text_from_index(i)?;
                let text = variants[i];
                (!text.is_empty()).then_some((text, !male, plural))
            })
            .collect();
        if entries.is_empty() {
            return Ok(());
        }
        let gender_mask = entries
            .iter()
            .fold(0u8, |mask, &(_, female, _)| mask | if female { 2 } else { 1 });
        let plural_mask = entries
            .iter()
            .fold(0u8, |mask, &(_, _, plural)| mask | if plural { 2 } else { 1 });
        let separator = TOKEN_SEPARATOR.to_string();
        let joined = entries
            .iter()
            .map(|&(text, _, _)| text)
            .collect::<Vec<_>>()
            .join(separator.as_str());

        let slot = self.objects.get(id)?.slot;
        self.ensure_writable(slot)?;
        if self.text_file.is_none() {
            return Err(Error::NoActiveFile);
        }

        let element = self.allocate_inner(id)?;
        let mut key = self.value(id)?.unwrap_or_default().to_string();
        if key.is_empty() {
            let record = self.type_name(id)?.unwrap_or_default();
            key = format!("TXT_KEY_{record}{}", TEXT_FIELDS[text_index].1);
            self.active_document_mut(slot)?.set_text(element, &key)?;
        }
        self.write_slot(slot)?;

        let languages = self.settings().languages().clone();
        let text_file = self.text_file.as_mut().ok_or(Error::NoActiveFile)?;
        let english = match text_file.english(&key) {
            Some(english) => english,
            None => text_file.create_element(&key, &languages)?,
        };

        let doc = text_file.document_mut();
        let children: Vec<NodeId> = doc.children(english).collect();
        for child in children {
            doc.remove(child)?;
        }

        if gender_mask == 1 && plural_mask & 1 != 0 {
            doc.set_text(english, &joined)?;
        } else {
            let gender_tokens: Vec<&str> = entries
                .iter()
                .map(|&(_, female, _)| if female { FEMALE } else { MALE })
                .collect();
            let plural_tokens: Vec<&str> = entries
                .iter()
                .map(|&(_, _, plural)| if plural { PLURAL } else { SINGULAR })
                .collect();
            // A uniform gender or plurality is written once.
            let genders = match gender_mask {
                3 => gender_tokens.join(separator.as_str()),
                _ => gender_tokens[0].to_string(),
            };
            let plurals = match plural_mask {
                3 => plural_tokens.join(separator.as_str()),
                _ => plural_tokens[0].to_string(),
            };
            for (name, value) in [("Text", &joined), ("Gender", &genders), ("Plural", &plurals)] {
                let child = doc.create_element(name);
                doc.set_text(child, value)?;
                doc.append_child(english, child)?;
            }
        }
        text_file.save()?;
        debug!(key = %key, variants = entries.len(), "wrote text key");
        Ok(())
    }

    // ---- remote records ----------------------------------------------------

    /// Point a reference field at a record named after the parent record,
    /// creating that record in the referenced file when missing.
    ///
    /// The name is the referenced file's prefix followed by the parent
    /// type without the active file's prefix (kept whole when the field
    /// has `bRemoteCreatePrefix`). A new record is a copy of the first
    /// record of the referenced file. Returns the value set, or `None`
    /// when the field does not support remote creation.
    pub fn create_remote(&mut self, id: ObjectId) -> Result<Option<String>> {
        if !self.is_remote_create(id)? {
            return Ok(None);
        }
        let Some(remote) = self.info_type(id)? else {
            return Ok(None);
        };
        let Some(parent_type) = self.parent_type(id)?.map(str::to_string) else {
            return Ok(None);
        };
        self.ensure_writable(self.objects.get(id)?.slot)?;

        let skip = if self.is_remote_create_prefix(id)? {
            0
        } else {
            self.active_container()?.prefix().len()
        };
        let container = self.container_mut(remote)?;
        let stem = parent_type.get(skip..).unwrap_or(&parent_type);
        let value = format!("{}{}", container.prefix(), stem);

        if container.element(&value).is_none() {
            if !container.is_writable(0) {
                return Err(Error::ReadOnlyFile {
                    path: container
                        .logical_path(0)
                        .unwrap_or_else(|| container.file_tag())
                        .to_string(),
                });
            }
            let tag = container.file_tag().to_string();
            let list = container.list_element(0).ok_or_else(|| Error::MissingList {
                file: tag.clone(),
                record: tag.clone(),
            })?;
            let doc = container.document_mut(0).ok_or_else(|| Error::UnknownDocument {
                file: tag.clone(),
                index: 0,
            })?;

            let record = match doc.first_child_element(list, Some(&tag)) {
                Some(template) => doc.clone_subtree(template, |_, _| true)?,
                None => doc.create_element(&tag),
            };
            let type_element = match doc.first_child_element(record, Some(TYPE_TAG)) {
                Some(existing) => existing,
                None => {
                    let created = doc.create_element(TYPE_TAG);
                    doc.insert_first_child(record, created)?;
                    created
                }
            };
            doc.set_text(type_element, &value)?;
            doc.append_child(list, record)?;
            container.write_file(0)?;
            container.set_all_tags();
            debug!(file = %tag, record = %value, "created remote record");
        }

        self.set_value(id, &value)?;
        Ok(Some(value))
    }
}
