//! Dictionary formats and the machinery to load them.
//!
//! A [Format] describes one kind of dictionary document: its schema tree, the table behind each node, a
//! [TableMapping] saying where each table's rows come from in the document, and any derived search indexes.  The
//! [load] function drives any format; [convert()] wraps it with reading, parsing, and building a database file.  Built
//! databases are read back with [Dictionary].
mod convert;
mod dictionary;
mod entities;
mod errors;
mod format;
pub mod jmdict;
pub mod kanjidic2;
mod loader;
mod mapping;
mod search_index;
mod tables;

pub use convert::*;
pub use dictionary::*;
pub use entities::*;
pub use errors::*;
pub use format::*;
pub use loader::*;
pub use mapping::{extract_entity, extract_nothing, extract_value, Extractor, Fanout, RowSource, TableMapping};
pub use search_index::*;
