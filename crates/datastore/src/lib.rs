//! The datastore crate.
//!
//! This crate maps trees of records onto sqlite tables and back.  There are 4 primary pieces:
//!
//! - The schema, a tree naming which tables hang off which.
//! - Table descriptors, which give each table in the schema its columns and indexes.
//! - The [Store] trait and its sqlite implementation, [Database], which can create tables, insert rows (returning
//!   generated ids), and select rows by column.
//! - The [Reconstructor], which walks the schema from a root row down through `fk` links and builds a [Record].
//!
//! Every child table has an `fk` column holding the id of its parent row.  Nothing in sqlite enforces this: it's a
//! convention of the loaders, and the reason ids must be generated by the store rather than by us.
mod database;
mod descriptor;
mod errors;
mod layout;
mod lookup;
mod record;
mod row;
mod schema;
mod store;

pub use database::*;
pub use descriptor::{ColumnDescriptor, ColumnType, IndexDescriptor, TableBuilder, TableDescriptor, FK_COLUMN, ID_COLUMN};
pub use errors::*;
pub use layout::*;
pub use lookup::*;
pub use record::*;
pub use row::*;
pub use schema::*;
pub use store::*;
