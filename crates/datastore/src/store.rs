//! The interface the mapping engine needs from a relational store.
use crate::descriptor::{TableDescriptor, FK_COLUMN, ID_COLUMN};
use crate::errors::Result;
use crate::row::{Row, Value};

/// A condition in a select.  Conditions are combined with `AND`.
#[derive(Clone, Debug)]
pub enum Condition<'a> {
    Equals(&'a str, Value),
    /// SQL `LIKE`; the pattern carries its own wildcards.
    Like(&'a str, String),
}

pub trait Store {
    fn drop_table_if_exists(&self, name: &str) -> Result<()>;

    /// Create the table only; indexes are created separately with [Store::create_index].
    fn create_table(&self, table: &TableDescriptor) -> Result<()>;

    fn create_index(&self, name: &str, table: &str, columns: &[&str]) -> Result<()>;

    /// Insert a row, returning its generated id.
    ///
    /// `values` are the data columns in table order.  `fk` must be set exactly when the table has a parent fk.
    fn insert(&self, table: &TableDescriptor, fk: Option<i64>, values: &[Value]) -> Result<i64>;

    /// Select all rows matching every condition, in id order.
    fn select(&self, table: &TableDescriptor, conditions: &[Condition]) -> Result<Vec<Row>>;

    fn query_by_id(&self, table: &TableDescriptor, id: i64) -> Result<Option<Row>> {
        Ok(self
            .select(table, &[Condition::Equals(ID_COLUMN, Value::Integer(id))])?
            .into_iter()
            .next())
    }

    fn query_by_fk(&self, table: &TableDescriptor, fk: i64) -> Result<Vec<Row>> {
        self.select(table, &[Condition::Equals(FK_COLUMN, Value::Integer(fk))])
    }

    fn query_by_exact_match(
        &self,
        table: &TableDescriptor,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<Row>>
    where
        Self: Sized,
    {
        self.select(table, &[Condition::Equals(column, value.into())])
    }

    fn query_like(&self, table: &TableDescriptor, column: &str, pattern: &str) -> Result<Vec<Row>> {
        self.select(table, &[Condition::Like(column, pattern.to_string())])
    }
}
