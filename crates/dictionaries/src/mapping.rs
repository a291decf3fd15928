//! How the rows of a table are found in, and extracted from, the document.
//!
//! A dictionary format gives each table of its schema a [TableMapping].  Most tables take one row per element found
//! by walking a fixed path of element names down from the element that produced the parent row.  Extractors are plain
//! functions, so a format is just static data.
use jblite_datastore::Value;
use jblite_xml::Element;

use crate::entities::EntitySurrogates;
use crate::errors::{Error, Result};

/// Builds the data columns of one row, in table order, from the element the row comes from.
pub type Extractor = fn(&Element, &EntitySurrogates) -> Result<Vec<Value>>;

#[derive(Copy, Clone, Debug)]
pub enum RowSource {
    /// One row per element at this path below the parent's element (or below the document root, for root tables).
    Path(&'static [&'static str]),
    /// Rows are only ever written by the parent's [Fanout].
    ParentFanout,
}

/// Extra rows written into a child table when a parent element satisfies `when`.
#[derive(Copy, Clone)]
pub struct Fanout {
    pub table: &'static str,
    pub path: &'static [&'static str],
    pub when: fn(&Element) -> bool,
}

#[derive(Copy, Clone)]
pub struct TableMapping {
    pub source: RowSource,
    pub extract: Extractor,
    pub fanout: Option<Fanout>,
}

impl std::fmt::Debug for Fanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fanout")
            .field("table", &self.table)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TableMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableMapping")
            .field("source", &self.source)
            .field("fanout", &self.fanout)
            .finish_non_exhaustive()
    }
}

impl TableMapping {
    pub fn at(path: &'static [&'static str], extract: Extractor) -> TableMapping {
        TableMapping {
            source: RowSource::Path(path),
            extract,
            fanout: None,
        }
    }

    pub fn from_parent_fanout(extract: Extractor) -> TableMapping {
        TableMapping {
            source: RowSource::ParentFanout,
            extract,
            fanout: None,
        }
    }

    pub fn with_fanout(mut self, fanout: Fanout) -> TableMapping {
        self.fanout = Some(fanout);
        self
    }
}

/// For tables with no data columns.
pub fn extract_nothing(_: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![])
}

/// The element's own text, or null.
pub fn extract_value(element: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![element.text().into()])
}

pub fn extract_entity(element: &Element, entities: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![Value::Integer(entities.id_for(element)?)])
}

pub(crate) fn required_text(element: &Element) -> Result<String> {
    element
        .text()
        .ok_or_else(|| Error::MalformedDocument(format!("<{}> has no text", element.get_name())))
}

pub(crate) fn required_child_text(element: &Element, child: &str) -> Result<String> {
    element.child_text(child).ok_or_else(|| {
        Error::MalformedDocument(format!(
            "<{}> is missing <{}>",
            element.get_name(),
            child
        ))
    })
}

pub(crate) fn parse_integer(element: &Element, text: &str) -> Result<i64> {
    text.parse().map_err(|_| {
        Error::MalformedDocument(format!(
            "<{}> should hold an integer, not {:?}",
            element.get_name(),
            text
        ))
    })
}

/// The integer in the text of the first child called `child`, if there is one.
pub(crate) fn optional_child_integer(element: &Element, child: &str) -> Result<Option<i64>> {
    match element.find(child) {
        None => Ok(None),
        Some(c) => match c.text() {
            None => Ok(None),
            Some(t) => Ok(Some(parse_integer(c, &t)?)),
        },
    }
}

pub(crate) fn optional_attribute(element: &Element, name: &str) -> Value {
    element.get_attribute(name).into()
}

/// Map an attribute with a closed set of values onto a flag.
///
/// `choices` pairs each accepted value with its flag; a missing attribute is `absent`.
pub(crate) fn flag_attribute(element: &Element, name: &str, absent: bool, choices: &[(&str, bool)]) -> Result<bool> {
    let value = match element.get_attribute(name) {
        None => return Ok(absent),
        Some(x) => x,
    };

    choices
        .iter()
        .find(|(choice, _)| *choice == value)
        .map(|(_, flag)| *flag)
        .ok_or_else(|| Error::UnsupportedAttributeValue {
            element: element.get_name().to_string(),
            attribute: name.to_string(),
            value: value.to_string(),
        })
}
