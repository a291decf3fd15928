//! Descriptors for the shapes of table that recur across dictionary formats.
use jblite_datastore::{TableBuilder, TableDescriptor};

use crate::errors::Result;

/// A child table with no data of its own, which only groups its children.
pub(crate) fn group(name: &str) -> Result<TableDescriptor> {
    Ok(TableBuilder::child(name).build()?)
}

/// `(id, fk, value TEXT NULL)`.
pub(crate) fn key_value(name: &str) -> Result<TableDescriptor> {
    let mut b = TableBuilder::child(name);
    b.add_text_column("value", true)?;
    Ok(b.build()?)
}

/// `(id, fk, entity)`, where `entity` is an id in the entity table.
pub(crate) fn key_entity(name: &str) -> Result<TableDescriptor> {
    let mut b = TableBuilder::child(name);
    b.add_entity_column("entity")?;
    Ok(b.build()?)
}

/// `(id, fk, type TEXT NULL, value TEXT NULL)`.
pub(crate) fn type_value(name: &str) -> Result<TableDescriptor> {
    let mut b = TableBuilder::child(name);
    b.add_text_column("type", true)?.add_text_column("value", true)?;
    Ok(b.build()?)
}
