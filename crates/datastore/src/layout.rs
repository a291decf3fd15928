//! A layout binds a schema tree to the descriptors of its tables.
use std::collections::HashMap;

use log::*;

use crate::descriptor::TableDescriptor;
use crate::errors::{Error, Result};
use crate::row::Row;
use crate::schema::Schema;
use crate::store::Store;

#[derive(Clone, Debug)]
pub struct Layout {
    schema: Schema,
    tables: HashMap<String, TableDescriptor>,
}

impl Layout {
    /// Bind `tables` to `schema`.
    ///
    /// Every schema node needs exactly one descriptor of the right shape: roots have no parent fk, everything else
    /// does, and anything with children has a generated id for those children to point at.
    pub fn new(schema: Schema, tables: impl IntoIterator<Item = TableDescriptor>) -> Result<Layout> {
        let mut map = HashMap::new();
        for t in tables {
            let name = t.get_name().to_string();
            if map.insert(name.clone(), t).is_some() {
                return Err(Error::InvalidSchema(format!(
                    "{} has more than one descriptor",
                    name
                )));
            }
        }

        for (parent, node) in schema.iter_preorder() {
            let desc = map
                .get(node.get_name())
                .ok_or_else(|| Error::UnknownTable(node.get_name().to_string()))?;

            if desc.has_parent_fk() != parent.is_some() {
                return Err(Error::InvalidSchema(format!(
                    "{} {} a parent fk column",
                    node.get_name(),
                    if parent.is_some() {
                        "is a child table but lacks"
                    } else {
                        "is a root table but has"
                    }
                )));
            }

            if !node.is_leaf() && !desc.has_generated_id() {
                return Err(Error::InvalidSchema(format!(
                    "{} has children but no generated id",
                    node.get_name()
                )));
            }
        }

        if let Some(extra) = map.keys().find(|k| schema.get_node(k).is_none()) {
            return Err(Error::InvalidSchema(format!(
                "{} has a descriptor but isn't in the schema",
                extra
            )));
        }

        Ok(Layout { schema, tables: map })
    }

    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get_table(&self, name: &str) -> Result<&TableDescriptor> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    /// Create every table in the schema, with indexes, destroying any existing table of the same name.
    ///
    /// Tables are created in schema pre-order.  If this fails part way through, the store holds a partial set of tables
    /// and the only way forward is to materialize again.
    pub fn materialize(&self, store: &impl Store) -> Result<Vec<&TableDescriptor>> {
        let mut created = vec![];

        for (_, node) in self.schema.iter_preorder() {
            let table = self.get_table(node.get_name())?;
            materialize_table(table, store)?;
            created.push(table);
        }

        info!("Materialized {} tables", created.len());
        Ok(created)
    }

    /// Find the id of the `ancestor` row that `row` of `table` descends from, by following fk links upward.
    ///
    /// If `table` is `ancestor`, this is the row's own id.
    pub fn ancestor_id(&self, store: &impl Store, table: &str, row: &Row, ancestor: &str) -> Result<i64> {
        let mut table = self.get_table(table)?;
        let mut row = row.clone();

        loop {
            if table.get_name() == ancestor {
                return row.id.ok_or_else(|| {
                    Error::InvalidSchema(format!("{} has no generated id", ancestor))
                });
            }

            let parent = self
                .schema
                .get_parent(table.get_name())
                .ok_or_else(|| {
                    Error::InvalidSchema(format!(
                        "{} does not descend from {}",
                        table.get_name(),
                        ancestor
                    ))
                })?;
            let fk = row.fk.ok_or_else(|| {
                Error::InvalidSchema(format!("{} has no parent fk", table.get_name()))
            })?;

            // The last hop doesn't need a query: the fk already is the ancestor's id.
            if parent.get_name() == ancestor {
                return Ok(fk);
            }

            table = self.get_table(parent.get_name())?;
            row = store.query_by_id(table, fk)?.ok_or_else(|| Error::NotFound {
                table: table.get_name().to_string(),
                id: fk,
            })?;
        }
    }
}

/// Drop and recreate a single table and its indexes.
pub fn materialize_table(table: &TableDescriptor, store: &impl Store) -> Result<()> {
    store.drop_table_if_exists(table.get_name())?;
    store.create_table(table)?;
    for index in table.iter_indexes() {
        store.create_index(
            index.get_name(),
            table.get_name(),
            &index.iter_columns().collect::<Vec<_>>(),
        )?;
    }
    Ok(())
}
