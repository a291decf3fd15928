//! A dictionary format: everything needed to load one kind of document and read it back.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use jblite_datastore::{Layout, Schema, TableDescriptor};

use crate::errors::{Error, Result};
use crate::mapping::{RowSource, TableMapping};
use crate::search_index::SearchIndex;
use crate::{jmdict, kanjidic2};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FormatKind {
    Jmdict,
    Kanjidic2,
}

impl FormatKind {
    pub fn get_name(&self) -> &'static str {
        match self {
            FormatKind::Jmdict => "jmdict",
            FormatKind::Kanjidic2 => "kanjidic2",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get_name())
    }
}

impl FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<FormatKind, String> {
        match s.to_ascii_lowercase().as_str() {
            "jmdict" => Ok(FormatKind::Jmdict),
            "kanjidic2" | "kd2" => Ok(FormatKind::Kanjidic2),
            _ => Err(format!("Unknown dictionary format {}", s)),
        }
    }
}

#[derive(Debug)]
pub struct Format {
    kind: FormatKind,
    layout: Layout,
    /// The table whose rows are dictionary entries, and which lookups start from.
    entry_table: &'static str,
    mappings: HashMap<&'static str, TableMapping>,
    entity_table: Option<TableDescriptor>,
    search_indexes: Vec<SearchIndex>,
}

impl Format {
    pub fn new(kind: FormatKind) -> Result<Format> {
        match kind {
            FormatKind::Jmdict => jmdict::format(),
            FormatKind::Kanjidic2 => kanjidic2::format(),
        }
    }

    /// Put a format together, checking that every table has a mapping which agrees with the schema.
    pub(crate) fn from_parts(
        kind: FormatKind,
        schema: Schema,
        tables: Vec<TableDescriptor>,
        entry_table: &'static str,
        mappings: Vec<(&'static str, TableMapping)>,
        entity_table: Option<TableDescriptor>,
        search_indexes: Vec<SearchIndex>,
    ) -> Result<Format> {
        let layout = Layout::new(schema, tables)?;
        let mappings: HashMap<_, _> = mappings.into_iter().collect();
        let schema = layout.get_schema();

        if !schema.is_root(entry_table) {
            return Err(invalid(format!("entry table {} isn't a root", entry_table)));
        }

        for (parent, node) in schema.iter_preorder() {
            let mapping = mappings
                .get(node.get_name())
                .ok_or_else(|| invalid(format!("{} has no mapping", node.get_name())))?;

            if let (RowSource::ParentFanout, None) = (mapping.source, parent) {
                return Err(invalid(format!(
                    "{} is a root so can't come from a parent's fanout",
                    node.get_name()
                )));
            }

            if let Some(fanout) = mapping.fanout {
                let target_parent = schema.get_parent(fanout.table).map(|x| x.get_name());
                if target_parent != Some(node.get_name()) {
                    return Err(invalid(format!(
                        "{} fans out into {}, which isn't its child",
                        node.get_name(),
                        fanout.table
                    )));
                }
            }
        }

        if let Some(extra) = mappings.keys().find(|k| schema.get_node(k).is_none()) {
            return Err(invalid(format!("{} has a mapping but isn't in the schema", extra)));
        }

        Ok(Format {
            kind,
            layout,
            entry_table,
            mappings,
            entity_table,
            search_indexes,
        })
    }

    pub fn get_kind(&self) -> FormatKind {
        self.kind
    }

    pub fn get_layout(&self) -> &Layout {
        &self.layout
    }

    pub fn get_entry_table(&self) -> &'static str {
        self.entry_table
    }

    pub fn get_mapping(&self, table: &str) -> Result<&TableMapping> {
        self.mappings
            .get(table)
            .ok_or_else(|| jblite_datastore::Error::UnknownTable(table.to_string()).into())
    }

    pub fn get_entity_table(&self) -> Option<&TableDescriptor> {
        self.entity_table.as_ref()
    }

    pub fn iter_search_indexes(&self) -> impl Iterator<Item = &SearchIndex> {
        self.search_indexes.iter()
    }

    pub fn get_search_index(&self, table: &str) -> Option<&SearchIndex> {
        self.search_indexes.iter().find(|x| x.table == table)
    }
}

fn invalid(message: String) -> Error {
    jblite_datastore::Error::InvalidSchema(message).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    use jblite_datastore::SchemaBuilder;

    use crate::mapping::{extract_nothing, extract_value, Fanout};
    use crate::tables;

    fn schema() -> Schema {
        let mut b = SchemaBuilder::new();
        b.add_table_with_children("gloss", |b| {
            b.add_table("pri");
        });
        b.build().unwrap()
    }

    fn gloss_tables() -> Vec<TableDescriptor> {
        vec![
            jblite_datastore::TableBuilder::new("gloss").build().unwrap(),
            tables::key_value("pri").unwrap(),
        ]
    }

    #[test]
    fn kinds_parse() {
        assert_eq!("JMdict".parse::<FormatKind>().unwrap(), FormatKind::Jmdict);
        assert_eq!("kanjidic2".parse::<FormatKind>().unwrap(), FormatKind::Kanjidic2);
        assert!("edict".parse::<FormatKind>().is_err());
        assert_eq!(FormatKind::Kanjidic2.to_string(), "kanjidic2");
    }

    #[test]
    fn builtin_formats_are_consistent() {
        for kind in [FormatKind::Jmdict, FormatKind::Kanjidic2] {
            let format = Format::new(kind).unwrap();
            assert_eq!(format.get_kind(), kind);
        }
    }

    #[test]
    fn rejects_missing_mappings() {
        let result = Format::from_parts(
            FormatKind::Jmdict,
            schema(),
            gloss_tables(),
            "gloss",
            vec![("gloss", TableMapping::at(&["gloss"], extract_nothing))],
            None,
            vec![],
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_fanout_into_non_children() {
        fn always(_: &jblite_xml::Element) -> bool {
            true
        }

        let result = Format::from_parts(
            FormatKind::Jmdict,
            schema(),
            gloss_tables(),
            "gloss",
            vec![
                (
                    "gloss",
                    TableMapping::at(&["gloss"], extract_nothing).with_fanout(Fanout {
                        table: "gloss",
                        path: &["pri"],
                        when: always,
                    }),
                ),
                ("pri", TableMapping::from_parent_fanout(extract_value)),
            ],
            None,
            vec![],
        );
        assert!(result.is_err());

        let result = Format::from_parts(
            FormatKind::Jmdict,
            schema(),
            gloss_tables(),
            "gloss",
            vec![
                (
                    "gloss",
                    TableMapping::at(&["gloss"], extract_nothing).with_fanout(Fanout {
                        table: "pri",
                        path: &["pri"],
                        when: always,
                    }),
                ),
                ("pri", TableMapping::from_parent_fanout(extract_value)),
            ],
            None,
            vec![],
        );
        assert!(result.is_ok());
    }
}
