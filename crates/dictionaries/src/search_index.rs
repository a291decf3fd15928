//! Derived lookup tables, rebuilt from loaded rows after every load.
//!
//! An index maps a normalized value taken from rows of some source table to the id of the root row each source row
//! descends from.
use jblite_datastore::{materialize_table, Condition, Layout, Store, TableBuilder, TableDescriptor, Value};
use log::*;

use crate::errors::Result;

#[derive(Clone)]
pub struct SearchIndex {
    /// Name of the index table.
    pub table: &'static str,
    pub value_column: &'static str,
    pub root_column: &'static str,
    pub root_table: &'static str,
    pub source_table: &'static str,
    pub source_column: &'static str,
    /// Only source rows whose column equals this value are indexed.
    pub filter: Option<(&'static str, &'static str)>,
    pub normalize: fn(&str) -> String,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("table", &self.table)
            .field("source_table", &self.source_table)
            .field("source_column", &self.source_column)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl SearchIndex {
    /// `(id, <value column>, <root column>)`, indexed on the value.
    pub fn descriptor(&self) -> Result<TableDescriptor> {
        let mut b = TableBuilder::new(self.table);
        b.add_text_column(self.value_column, false)?
            .add_integer_column(self.root_column, false)?
            .add_index(&[self.value_column])?;
        Ok(b.build()?)
    }

    /// Drop and rebuild the index from the source table.  Returns the number of rows written.
    pub fn build(&self, layout: &Layout, store: &impl Store) -> Result<u64> {
        let index = self.descriptor()?;
        materialize_table(&index, store)?;

        let source = layout.get_table(self.source_table)?;
        let conditions = match self.filter {
            Some((column, value)) => vec![Condition::Equals(column, Value::from(value))],
            None => vec![],
        };

        let mut written = 0;
        for row in store.select(source, &conditions)? {
            let value = match row.data.get_text(self.source_column) {
                Some(x) => (self.normalize)(x),
                None => continue,
            };
            let root = layout.ancestor_id(store, self.source_table, &row, self.root_table)?;
            store.insert(&index, None, &[Value::Text(value), Value::Integer(root)])?;
            written += 1;
        }

        info!("Built {} with {} rows", self.table, written);
        Ok(written)
    }

    /// Ids of root rows with an indexed value `LIKE` the pattern, in index order.
    pub fn search(&self, store: &impl Store, pattern: &str) -> Result<Vec<i64>> {
        let index = self.descriptor()?;
        Ok(store
            .query_like(&index, self.value_column, pattern)?
            .into_iter()
            .filter_map(|row| row.data.get_integer(self.root_column))
            .collect())
    }
}
