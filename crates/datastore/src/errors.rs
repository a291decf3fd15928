#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("No row with id {id} in table {table}")]
    NotFound { table: String, id: i64 },

    #[error("Storage error: {}", _0)]
    Storage(#[from] rusqlite::Error),

    #[error("Unable to render SQL template: {}", _0)]
    Template(#[from] tera::Error),

    #[error("Unknown table {}", _0)]
    UnknownTable(String),

    #[error("Table {table} has no column {column}")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid table descriptor: {}", _0)]
    InvalidDescriptor(String),

    #[error("Invalid schema: {}", _0)]
    InvalidSchema(String),

    #[error("{table}.{column}: {message}")]
    ValueMismatch {
        table: String,
        column: String,
        message: String,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
