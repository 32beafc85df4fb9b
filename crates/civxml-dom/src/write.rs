//! Serialize an [`XmlDocument`] back to XML text.

use std::io::Write;
use std::path::Path;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use crate::node::{NodeId, NodeKind};
use crate::{Error, Result, XmlDocument};

impl XmlDocument {
    /// Convert the document to an XML string.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut output = Vec::new();
        self.write_xml(&mut output)?;
        String::from_utf8(output).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Write tab-indented XML to a writer.
    ///
    /// The output is UTF-8; use [`to_bytes`](Self::to_bytes) to honour a
    /// Latin-1 declaration.
    pub fn write_xml<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut xml_writer = Writer::new_with_indent(writer, b'\t', 1);

        if let Some(decl) = self.declaration() {
            xml_writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(|e| Error::Xml(e.to_string()))?;
        }

        for child in self.children(NodeId::DOCUMENT) {
            self.write_node(&mut xml_writer, child)?;
        }

        xml_writer.get_mut().write_all(b"\n")?;
        Ok(())
    }

    /// Write a single node and its subtree.
    fn write_node<W: Write>(&self, writer: &mut Writer<W>, id: NodeId) -> Result<()> {
        let Some(kind) = self.kind(id) else {
            return Ok(());
        };

        let event = match kind {
            NodeKind::Element { name, attributes } => {
                let mut elem = BytesStart::new(name.as_str());
                for (key, value) in attributes {
                    elem.push_attribute((key.as_str(), value.as_str()));
                }

                if self.first_child(id).is_none() {
                    Event::Empty(elem)
                } else {
                    writer
                        .write_event(Event::Start(elem))
                        .map_err(|e| Error::Xml(e.to_string()))?;
                    for child in self.children(id) {
                        self.write_node(writer, child)?;
                    }
                    Event::End(BytesEnd::new(name.as_str()))
                }
            }
            NodeKind::Text(text) => Event::Text(BytesText::new(text)),
            NodeKind::CData(text) => Event::CData(BytesCData::new(text.as_str())),
            NodeKind::Comment(text) => Event::Comment(BytesText::from_escaped(text.as_str())),
            NodeKind::Document => return Ok(()),
        };

        writer
            .write_event(event)
            .map_err(|e| Error::Xml(e.to_string()))?;
        Ok(())
    }

    /// Serialize to bytes in the declared encoding.
    ///
    /// Latin-1 documents get characters above U+00FF written as numeric
    /// character references.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let text = self.to_xml_string()?;
        if self.declaration().is_some_and(|d| d.is_latin1()) {
            Ok(encode_latin1(&text))
        } else {
            Ok(text.into_bytes())
        }
    }

    /// Write the document to a file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &bytes)
        };
        write().map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), size = bytes.len(), "saved document");
        Ok(())
    }
}

fn encode_latin1(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if code <= 0xFF {
            out.push(code as u8);
        } else {
            out.extend_from_slice(format!("&#{code};").as_bytes());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_indents_with_tabs() {
        let doc = XmlDocument::parse("<Root><A>1</A><B/></Root>").unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains("<Root>\n\t<A>1</A>\n\t<B/>\n</Root>"));
    }

    #[test]
    fn test_write_keeps_declaration() {
        let doc = XmlDocument::parse(
            r#"<?xml version="1.0" encoding="ISO-8859-1"?><Root/>"#,
        )
        .unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="ISO-8859-1"?>"#));
    }

    #[test]
    fn test_round_trip_text_and_attributes() {
        let original = r#"<Units xmlns="x-schema:Units.xml">
            <Unit a="x &amp; y">
                <Type>UNIT_WARRIOR</Type>
                <Text>1 &lt; 2</Text>
            </Unit>
            <!-- trailing -->
        </Units>"#;
        let doc = XmlDocument::parse(original).unwrap();
        let reparsed = XmlDocument::parse(&doc.to_xml_string().unwrap()).unwrap();

        let root = reparsed.root_element().unwrap();
        assert_eq!(reparsed.attribute(root, "xmlns"), Some("x-schema:Units.xml"));
        let unit = reparsed.first_child_element(root, Some("Unit")).unwrap();
        assert_eq!(reparsed.attribute(unit, "a"), Some("x & y"));
        let text = reparsed.first_child_element(unit, Some("Text")).unwrap();
        assert_eq!(reparsed.text(text), Some("1 < 2"));
        assert_eq!(reparsed.children(root).count(), 2);
    }

    #[test]
    fn test_latin1_output() {
        let mut doc = XmlDocument::with_declaration("1.0", Some("ISO-8859-1"));
        let root = doc.create_element("Root");
        doc.append_child(doc.document_node(), root).unwrap();
        doc.set_text(root, "é€").unwrap();

        let bytes = doc.to_bytes().unwrap();
        let needle: &[u8] = &[0xE9, b'&', b'#', b'8', b'3', b'6', b'4', b';'];
        assert!(bytes.windows(needle.len()).any(|w| w == needle));

        let reparsed = XmlDocument::from_bytes(&bytes).unwrap();
        let root = reparsed.root_element().unwrap();
        assert_eq!(reparsed.text(root), Some("é€"));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Units/CIV4UnitInfos.xml");
        let doc = XmlDocument::parse("<Root><A>1</A></Root>").unwrap();
        doc.save(&path).unwrap();

        let loaded = XmlDocument::open(&path).unwrap();
        let root = loaded.root_element().unwrap();
        let a = loaded.first_child_element(root, Some("A")).unwrap();
        assert_eq!(loaded.text(a), Some("1"));
    }

    #[test]
    fn test_save_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let doc = XmlDocument::parse("<Root/>").unwrap();
        // A directory cannot be overwritten by a file.
        let err = doc.save(dir.path()).unwrap_err();
        match err {
            Error::Write { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("expected write error, got {other:?}"),
        }
    }
}
