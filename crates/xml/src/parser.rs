//! Building an [Element] tree from a document with quick-xml.
use quick_xml::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::dtd::EntityMap;
use crate::element::Element;
use crate::errors::{Error, Result};

fn xml_error(reader: &Reader<&[u8]>, source: impl Into<quick_xml::Error>) -> Error {
    Error::Xml {
        position: reader.buffer_position() as u64,
        source: source.into(),
    }
}

/// Parse a whole document into a tree, returning the document element.
///
/// References to entities in `entities` are kept as references (with their expansion attached) so that loaders can
/// tell `&uk;` apart from literal text.  Character references and the predefined XML entities become plain text.  A
/// reference to anything else is an [Error::UndeclaredEntity].
pub fn parse_document(data: &[u8], entities: &EntityMap) -> Result<Element> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::with_capacity(4096);
    let mut stack: Vec<Element> = vec![];
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(&reader, e))?;

        match event {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(Error::MalformedDocument(
                        "Found content after the document element".into(),
                    ));
                }

                let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()));
                for attribute in e.attributes() {
                    let attribute = attribute.map_err(|e| xml_error(&reader, e))?;
                    let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
                    let raw = String::from_utf8_lossy(attribute.value.as_ref()).into_owned();
                    let value = escape::unescape(&raw)
                        .map_err(|e| xml_error(&reader, e))?
                        .into_owned();
                    element.add_attribute(key, value);
                }
                stack.push(element);
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    Error::MalformedDocument("Found a closing tag with no opening tag".into())
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.push_child(element),
                    None => root = Some(element),
                }
            }
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::GeneralRef(e) => {
                let character = e.resolve_char_ref().map_err(|err| xml_error(&reader, err))?;
                let name = String::from_utf8_lossy(&e).into_owned();
                if let Some(top) = stack.last_mut() {
                    if let Some(c) = character {
                        top.push_text(c.encode_utf8(&mut [0u8; 4]));
                    } else if let Some(s) = escape::resolve_predefined_entity(&name) {
                        top.push_text(s);
                    } else {
                        let expansion = entities
                            .get(&name)
                            .cloned()
                            .ok_or_else(|| Error::UndeclaredEntity(name.clone()))?;
                        top.push_entity(name, expansion);
                    }
                }
            }
            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(Error::MalformedDocument(format!(
            "Document ended inside <{}>",
            stack.last().map(|x| x.get_name()).unwrap_or_default()
        )));
    }

    root.ok_or_else(|| Error::MalformedDocument("Document has no root element".into()))
}
