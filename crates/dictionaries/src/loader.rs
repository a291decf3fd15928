//! The bulk loader: walks a parsed document alongside the schema and inserts a row per mapped element.
//!
//! Loading is depth first in document order.  A row is inserted before anything below it so that its generated id can
//! be given to its children as their fk.  The loader never begins or commits a transaction; callers wrap the whole
//! load in one so a failure leaves nothing behind.
use std::collections::BTreeMap;

use jblite_datastore::{SchemaNode, Store};
use jblite_xml::Element;
use log::*;

use crate::entities::EntitySurrogates;
use crate::errors::{Error, Result};
use crate::format::Format;
use crate::mapping::RowSource;

const PROGRESS_INTERVAL: u64 = 10_000;

/// Rows inserted per table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    rows: BTreeMap<String, u64>,
}

impl LoadStats {
    pub fn get(&self, table: &str) -> u64 {
        self.rows.get(table).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.rows.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn record(&mut self, table: &str) {
        *self.rows.entry(table.to_string()).or_default() += 1;
    }
}

struct Loader<'a, S> {
    format: &'a Format,
    entities: &'a EntitySurrogates,
    store: &'a S,
    stats: LoadStats,
    roots: u64,
}

/// Load `document` into tables which must already have been materialized.
pub fn load(format: &Format, document: &Element, entities: &EntitySurrogates, store: &impl Store) -> Result<LoadStats> {
    let mut loader = Loader {
        format,
        entities,
        store,
        stats: Default::default(),
        roots: 0,
    };

    for node in format.get_layout().get_schema().iter_roots() {
        let path = match format.get_mapping(node.get_name())?.source {
            RowSource::Path(p) => p,
            RowSource::ParentFanout => {
                return Err(Error::Datastore(jblite_datastore::Error::InvalidSchema(format!(
                    "root table {} has no source path",
                    node.get_name()
                ))))
            }
        };

        for element in document.find_path(path) {
            loader.load_row(node, element, None)?;
        }
    }

    info!(
        "Loaded {} rows, {} of them roots",
        loader.stats.total(),
        loader.roots
    );
    Ok(loader.stats)
}

impl<'a, S: Store> Loader<'a, S> {
    fn load_row(&mut self, node: &SchemaNode, element: &Element, fk: Option<i64>) -> Result<i64> {
        let format = self.format;
        let table = format.get_layout().get_table(node.get_name())?;
        let mapping = format.get_mapping(node.get_name())?;

        let values = (mapping.extract)(element, self.entities)?;
        let id = self.store.insert(table, fk, &values)?;
        self.stats.record(node.get_name());

        if fk.is_none() {
            self.roots += 1;
            if self.roots % PROGRESS_INTERVAL == 0 {
                info!("Loaded {} {} rows", self.roots, node.get_name());
            }
        }

        if let Some(fanout) = mapping.fanout {
            if (fanout.when)(element) {
                let target = node
                    .iter_children()
                    .find(|c| c.get_name() == fanout.table)
                    .ok_or_else(|| jblite_datastore::Error::UnknownTable(fanout.table.to_string()))?;
                for child in element.find_path(fanout.path) {
                    self.load_row(target, child, Some(id))?;
                }
            }
        }

        for child_node in node.iter_children() {
            let path = match format.get_mapping(child_node.get_name())?.source {
                RowSource::Path(p) => p,
                RowSource::ParentFanout => continue,
            };

            for child in element.find_path(path) {
                self.load_row(child_node, child, Some(id))?;
            }
        }

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jblite_datastore::{Database, Reconstructor, SchemaBuilder, TableBuilder, Value};
    use jblite_xml::{parse_document, EntityMap};
    use pretty_assertions::assert_eq;

    use crate::format::FormatKind;
    use crate::mapping::{extract_value, required_child_text, Fanout, TableMapping};
    use crate::tables;

    fn extract_seq(element: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
        Ok(vec![required_child_text(element, "seq")?.into()])
    }

    fn extract_word(element: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
        Ok(vec![
            required_child_text(element, "text")?.into(),
            Value::Bool(several_notes(element)),
        ])
    }

    fn several_notes(element: &Element) -> bool {
        element.find_all("note").count() > 1
    }

    /// `item{ word{note} }`, where notes are only stored when a word has several.
    fn test_format() -> Format {
        let mut schema = SchemaBuilder::new();
        schema.add_table_with_children("item", |b| {
            b.add_table_with_children("word", |b| {
                b.add_table("note");
            });
        });

        let mut item = TableBuilder::new("item");
        item.add_text_column("seq", false).unwrap();
        let mut word = TableBuilder::child("word");
        word.add_text_column("text", false)
            .unwrap()
            .add_boolean_column("annotated")
            .unwrap();

        Format::from_parts(
            FormatKind::Jmdict,
            schema.build().unwrap(),
            vec![
                item.build().unwrap(),
                word.build().unwrap(),
                tables::key_value("note").unwrap(),
            ],
            "item",
            vec![
                ("item", TableMapping::at(&["item"], extract_seq)),
                (
                    "word",
                    TableMapping::at(&["word"], extract_word).with_fanout(Fanout {
                        table: "note",
                        path: &["note"],
                        when: several_notes,
                    }),
                ),
                ("note", TableMapping::from_parent_fanout(extract_value)),
            ],
            None,
            vec![],
        )
        .unwrap()
    }

    const DOC: &str = r#"<root>
        <item><seq>1</seq>
            <word><text>a</text><note>x</note></word>
            <word><text>b</text><note>y</note><note>z</note></word>
        </item>
        <item><seq>2</seq></item>
    </root>"#;

    #[test]
    fn loads_in_document_order_with_fanout() {
        let format = test_format();
        let db = Database::open_in_memory().unwrap();
        format.get_layout().materialize(&db).unwrap();

        let doc = parse_document(DOC.as_bytes(), &EntityMap::new()).unwrap();
        let stats = load(&format, &doc, &EntitySurrogates::default(), &db).unwrap();
        assert_eq!(stats.get("item"), 2);
        assert_eq!(stats.get("word"), 2);
        assert_eq!(stats.get("note"), 2);
        assert_eq!(stats.total(), 6);

        let record = Reconstructor::new(format.get_layout(), &db)
            .lookup("item", 1)
            .unwrap();
        let words = record.get_children("word");
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].data.get_text("text"), Some("a"));
        assert_eq!(words[0].data.get_bool("annotated"), Some(false));
        assert!(words[0].get_children("note").is_empty());
        assert_eq!(words[1].data.get_bool("annotated"), Some(true));
        assert_eq!(
            words[1]
                .get_children("note")
                .iter()
                .map(|n| n.data.get_text("value").unwrap())
                .collect::<Vec<_>>(),
            vec!["y", "z"]
        );

        let record = Reconstructor::new(format.get_layout(), &db)
            .lookup("item", 2)
            .unwrap();
        assert_eq!(record.data.get_text("seq"), Some("2"));
        assert!(record.children.is_empty());
    }

    #[test]
    fn extraction_errors_stop_the_load() {
        let format = test_format();
        let db = Database::open_in_memory().unwrap();
        format.get_layout().materialize(&db).unwrap();

        let doc = parse_document(b"<root><item><seq>1</seq><word/></item></root>", &EntityMap::new()).unwrap();
        let result = load(&format, &doc, &EntitySurrogates::default(), &db);
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }
}
