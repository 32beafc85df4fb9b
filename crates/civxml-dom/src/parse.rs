//! Parse XML text into an [`XmlDocument`].

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::document::{is_latin1_label, Declaration};
use crate::node::NodeId;
use crate::{Error, Result, XmlDocument};

impl XmlDocument {
    /// Parse XML text.
    ///
    /// Whitespace-only text between elements is dropped; any other text is
    /// kept verbatim, including leading and trailing spaces. Comments and
    /// CDATA sections are kept so documents survive a save unchanged. Several
    /// top-level elements are accepted (editor settings files use them);
    /// [`root_element`](Self::root_element) is the first.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        let mut doc = XmlDocument::new();
        let mut stack: Vec<NodeId> = vec![NodeId::DOCUMENT];

        loop {
            match reader.read_event() {
                Ok(Event::Decl(decl)) => {
                    let version = decl
                        .version()
                        .map(|v| String::from_utf8_lossy(&v).into_owned())
                        .unwrap_or_else(|_| "1.0".to_string());
                    let encoding = decl
                        .encoding()
                        .and_then(|e| e.ok())
                        .map(|e| String::from_utf8_lossy(&e).into_owned());
                    let standalone = decl
                        .standalone()
                        .and_then(|s| s.ok())
                        .map(|s| String::from_utf8_lossy(&s).into_owned());
                    doc.set_declaration(Some(Declaration {
                        version,
                        encoding,
                        standalone,
                    }));
                }
                Ok(Event::Start(e)) => {
                    let parent = *stack.last().unwrap_or(&NodeId::DOCUMENT);
                    let id = start_element(&mut doc, &e)?;
                    doc.append_child(parent, id)?;
                    stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    let parent = *stack.last().unwrap_or(&NodeId::DOCUMENT);
                    let id = start_element(&mut doc, &e)?;
                    doc.append_child(parent, id)?;
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Text(e)) => {
                    let parent = *stack.last().unwrap_or(&NodeId::DOCUMENT);
                    if parent != NodeId::DOCUMENT {
                        let text = e.unescape().map_err(|e| Error::Xml(e.to_string()))?;
                        if !text.trim().is_empty() {
                            let id = doc.create_text(&text);
                            doc.append_child(parent, id)?;
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    let parent = *stack.last().unwrap_or(&NodeId::DOCUMENT);
                    if parent != NodeId::DOCUMENT {
                        let text = String::from_utf8_lossy(&e);
                        let id = doc.create_cdata(&text);
                        doc.append_child(parent, id)?;
                    }
                }
                Ok(Event::Comment(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    let parent = *stack.last().unwrap_or(&NodeId::DOCUMENT);
                    let id = doc.create_comment(&text);
                    doc.append_child(parent, id)?;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {} // Processing instructions, DOCTYPE
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "parse error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
            }
        }

        if stack.len() > 1 {
            return Err(Error::Xml("unexpected end of document".to_string()));
        }
        if doc.root_element().is_none() {
            return Err(Error::MissingRoot);
        }
        Ok(doc)
    }

    /// Parse raw file bytes, honouring a Latin-1 encoding declaration.
    ///
    /// Anything not declared as ISO-8859-1 is decoded as UTF-8 (a leading
    /// byte order mark is skipped).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if declared_encoding(bytes).is_some_and(is_latin1_label) {
            let text: String = bytes.iter().map(|&b| b as char).collect();
            return Self::parse(&text);
        }
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)?;
        Self::parse(text)
    }

    /// Read and parse a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        debug!(path = %path.display(), size = bytes.len(), "parsing document");
        Self::from_bytes(&bytes)
    }
}

/// Build a detached element from a start tag.
fn start_element(doc: &mut XmlDocument, e: &BytesStart<'_>) -> Result<NodeId> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let id = doc.create_element(&name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(e.to_string()))?;
        doc.set_attribute(id, &key, &value)?;
    }
    Ok(id)
}

/// The `encoding` pseudo-attribute of the XML declaration, if any.
fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let end = memchr::memmem::find(bytes, b"?>")?;
    let decl = &bytes[..end];
    let start = memchr::memmem::find(decl, b"encoding")? + b"encoding".len();
    let rest = &decl[start..];
    let quote_pos = memchr::memchr2(b'"', b'\'', rest)?;
    let quote = rest[quote_pos];
    let value = &rest[quote_pos + 1..];
    let close = memchr::memchr(quote, value)?;
    std::str::from_utf8(&value[..close]).ok()
}
