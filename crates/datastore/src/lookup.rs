//! Rebuilding nested records from flat rows.
//!
//! Given a root row, we fetch every row of every child table whose `fk` is that row's id, then do the same for each of
//! those rows, and so on down the schema tree.  This is one query per (row, child table) pair, which is fine for the
//! sizes of tree a single dictionary entry produces.
use std::collections::BTreeMap;

use log::*;

use crate::descriptor::{ColumnType, TableDescriptor};
use crate::errors::{Error, Result};
use crate::layout::Layout;
use crate::record::Record;
use crate::row::{Row, Value};
use crate::schema::SchemaNode;
use crate::store::Store;

/// Column of the entity table holding an entity's expansion.
pub const ENTITY_EXPANSION_COLUMN: &str = "expansion";

pub struct Reconstructor<'a, S> {
    layout: &'a Layout,
    store: &'a S,
    entities: Option<&'a TableDescriptor>,
}

impl<'a, S: Store> Reconstructor<'a, S> {
    pub fn new(layout: &'a Layout, store: &'a S) -> Self {
        Reconstructor {
            layout,
            store,
            entities: None,
        }
    }

    /// Replace entity ids with their expansion text, using the given entity table.
    pub fn resolve_entities(mut self, entity_table: &'a TableDescriptor) -> Self {
        self.entities = Some(entity_table);
        self
    }

    /// Rebuild the record rooted at row `id` of `table`.
    ///
    /// Nothing is cached: every call reads the store again.
    pub fn lookup(&self, table: &str, id: i64) -> Result<Record> {
        let node = self
            .layout
            .get_schema()
            .get_node(table)
            .ok_or_else(|| Error::UnknownTable(table.to_string()))?;
        let desc = self.layout.get_table(table)?;

        let row = self.store.query_by_id(desc, id)?.ok_or_else(|| Error::NotFound {
            table: table.to_string(),
            id,
        })?;

        trace!("Reconstructing {} {}", table, id);
        self.build_record(node, desc, row)
    }

    fn build_record(&self, node: &SchemaNode, desc: &TableDescriptor, mut row: Row) -> Result<Record> {
        // Tables without generated ids are leaves (the layout checks this), so there's nothing to fetch below them.
        let id = match row.id {
            Some(x) => x,
            None => {
                self.resolve_row_entities(desc, &mut row)?;
                return Ok(Record {
                    id: 0,
                    data: row.data,
                    children: Default::default(),
                });
            }
        };

        let mut children = BTreeMap::new();
        for child in node.iter_children() {
            let child_desc = self.layout.get_table(child.get_name())?;
            let rows = self.store.query_by_fk(child_desc, id)?;
            if rows.is_empty() {
                continue;
            }

            let records = rows
                .into_iter()
                .map(|r| self.build_record(child, child_desc, r))
                .collect::<Result<Vec<_>>>()?;
            children.insert(child.get_name().to_string(), records);
        }

        self.resolve_row_entities(desc, &mut row)?;
        Ok(Record {
            id,
            data: row.data,
            children,
        })
    }

    fn resolve_row_entities(&self, desc: &TableDescriptor, row: &mut Row) -> Result<()> {
        let entities = match self.entities {
            Some(x) => x,
            None => return Ok(()),
        };

        for column in desc
            .iter_columns()
            .filter(|c| c.get_column_type() == ColumnType::Entity)
        {
            let value = match row.data.get_mut(column.get_name()) {
                Some(x) => x,
                None => continue,
            };
            let entity_id = match value.as_integer() {
                Some(x) => x,
                None => continue,
            };

            let entity = self
                .store
                .query_by_id(entities, entity_id)?
                .ok_or_else(|| Error::NotFound {
                    table: entities.get_name().to_string(),
                    id: entity_id,
                })?;
            *value = entity
                .data
                .get(ENTITY_EXPANSION_COLUMN)
                .cloned()
                .unwrap_or(Value::Null);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::database::Database;
    use crate::descriptor::TableBuilder;
    use crate::layout::tests::build_test_layout;
    use crate::layout::Layout;
    use crate::row::RowData;
    use crate::schema::SchemaBuilder;

    fn text(name: &str, value: &str) -> RowData {
        let mut data = RowData::new();
        data.insert(name, Value::from(value));
        data
    }

    #[test]
    fn reconstructs_nested_records() {
        let layout = build_test_layout();
        let db = Database::open_in_memory().unwrap();
        layout.materialize(&db).unwrap();

        let character = layout.get_table("character").unwrap();
        let rmgroup = layout.get_table("rmgroup").unwrap();
        let reading = layout.get_table("reading").unwrap();

        let neko = db.insert(character, None, &[Value::from("猫")]).unwrap();
        let group = db.insert(rmgroup, Some(neko), &[]).unwrap();
        let kun = db
            .insert(reading, Some(group), &[Value::from("ja_kun"), Value::from("ねこ")])
            .unwrap();
        let on = db
            .insert(reading, Some(group), &[Value::from("ja_on"), Value::from("ビョウ")])
            .unwrap();

        let record = Reconstructor::new(&layout, &db).lookup("character", neko).unwrap();

        let mut kun_data = RowData::new();
        kun_data.insert("type", Value::from("ja_kun"));
        kun_data.insert("value", Value::from("ねこ"));
        let mut on_data = RowData::new();
        on_data.insert("type", Value::from("ja_on"));
        on_data.insert("value", Value::from("ビョウ"));

        let expected = Record {
            id: neko,
            data: text("literal", "猫"),
            children: [(
                "rmgroup".to_string(),
                vec![Record {
                    id: group,
                    data: RowData::new(),
                    children: [(
                        "reading".to_string(),
                        vec![
                            Record {
                                id: kun,
                                data: kun_data,
                                children: Default::default(),
                            },
                            Record {
                                id: on,
                                data: on_data,
                                children: Default::default(),
                            },
                        ],
                    )]
                    .into_iter()
                    .collect(),
                }],
            )]
            .into_iter()
            .collect(),
        };

        // No nanori rows, so no nanori key.
        assert_eq!(record, expected);
    }

    #[test]
    fn missing_root_is_not_found() {
        let layout = build_test_layout();
        let db = Database::open_in_memory().unwrap();
        layout.materialize(&db).unwrap();

        let err = Reconstructor::new(&layout, &db)
            .lookup("character", 999_999)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 999_999, .. }));

        assert!(matches!(
            Reconstructor::new(&layout, &db).lookup("nope", 1),
            Err(Error::UnknownTable(_))
        ));
    }

    #[test]
    fn resolves_entities() {
        let mut schema = SchemaBuilder::new();
        schema.add_table_with_children("entry", |b| {
            b.add_table("misc");
        });
        let entry = TableBuilder::new("entry").build().unwrap();
        let mut misc = TableBuilder::child("misc");
        misc.add_entity_column("entity").unwrap();
        let layout = Layout::new(schema.build().unwrap(), [entry, misc.build().unwrap()]).unwrap();

        let mut entity = TableBuilder::new("entity");
        entity.add_text_column("entity", false).unwrap();
        entity.add_text_column(ENTITY_EXPANSION_COLUMN, false).unwrap();
        let entity = entity.build().unwrap();

        let db = Database::open_in_memory().unwrap();
        layout.materialize(&db).unwrap();
        crate::layout::materialize_table(&entity, &db).unwrap();

        let uk = db
            .insert(
                &entity,
                None,
                &[
                    Value::from("uk"),
                    Value::from("word usually written using kana alone"),
                ],
            )
            .unwrap();
        let entry_id = db.insert(layout.get_table("entry").unwrap(), None, &[]).unwrap();
        db.insert(layout.get_table("misc").unwrap(), Some(entry_id), &[Value::Integer(uk)])
            .unwrap();

        let raw = Reconstructor::new(&layout, &db).lookup("entry", entry_id).unwrap();
        assert_eq!(
            raw.get_children("misc")[0].data.get_integer("entity"),
            Some(uk)
        );

        let resolved = Reconstructor::new(&layout, &db)
            .resolve_entities(&entity)
            .lookup("entry", entry_id)
            .unwrap();
        assert_eq!(
            resolved.get_children("misc")[0].data.get_text("entity"),
            Some("word usually written using kana alone")
        );
    }
}
