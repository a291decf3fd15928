//! The database wraps a rusqlite connection and implements [Store] over it.
use std::path::Path;

use log::*;

use crate::descriptor::{build_index_statement, check_identifier, quote_ident, ColumnType, TableDescriptor};
use crate::errors::{Error, Result};
use crate::row::{Row, RowData, Value};
use crate::store::{Condition, Store};

#[derive(Debug)]
pub struct Database {
    conn: rusqlite::Connection,
}

/// A transaction like that from rusqlite: drop rolls back, calling commit commits.
pub struct Transaction<'a> {
    transaction: rusqlite::Transaction<'a>,
}

/// SQL that we run as part of opening a connection.
///
/// - Enables the busy timeout.
/// - Raises the default cache size because the one sqlite sets up for us is only a couple megabytes since they have to
///   make their defaults work with e.g. phones.
///
/// We don't use WAL: dictionaries are built once into a fresh file which is then renamed into place, and a lingering
/// `-wal` file would not follow it.
const INITIAL_SQL: &str = r#"
PRAGMA busy_timeout = 1000;
PRAGMA cache_size = -100000;
"#;

fn read_row(table: &TableDescriptor, r: &rusqlite::Row) -> rusqlite::Result<Row> {
    let mut index = 0;
    let mut next = || {
        index += 1;
        index - 1
    };

    let id = if table.has_generated_id() {
        Some(r.get::<_, i64>(next())?)
    } else {
        None
    };
    let fk = if table.has_parent_fk() {
        Some(r.get::<_, i64>(next())?)
    } else {
        None
    };

    let mut data = RowData::new();
    for c in table.iter_columns() {
        let value: Value = match c.get_column_type() {
            ColumnType::Text => r.get::<_, Option<String>>(next())?.into(),
            ColumnType::Integer | ColumnType::Entity => r.get::<_, Option<i64>>(next())?.into(),
            ColumnType::Boolean => r.get::<_, Option<i64>>(next())?.map(|x| x != 0).into(),
        };
        data.insert(c.get_name(), value);
    }

    Ok(Row { id, fk, data })
}

fn drop_table_if_exists(conn: &rusqlite::Connection, name: &str) -> Result<()> {
    check_identifier(name)?;
    debug!("Dropping table {}", name);
    conn.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)), [])?;
    Ok(())
}

fn create_table(conn: &rusqlite::Connection, table: &TableDescriptor) -> Result<()> {
    debug!("Creating table {}", table.get_name());
    conn.execute(table.create_statement(), [])?;
    Ok(())
}

fn create_index(conn: &rusqlite::Connection, name: &str, table: &str, columns: &[&str]) -> Result<()> {
    let stmt = build_index_statement(name, table, columns)?;
    debug!("Creating index: {}", stmt);
    conn.execute(&stmt, [])?;
    Ok(())
}

fn insert(
    conn: &rusqlite::Connection,
    table: &TableDescriptor,
    fk: Option<i64>,
    values: &[Value],
) -> Result<i64> {
    table.check_values(fk, values)?;

    let fk_value = fk.map(Value::Integer);
    let mut statement = conn.prepare_cached(table.insert_statement())?;
    statement.execute(rusqlite::params_from_iter(
        fk_value.iter().chain(values.iter()),
    ))?;
    Ok(conn.last_insert_rowid())
}

fn select(conn: &rusqlite::Connection, table: &TableDescriptor, conditions: &[Condition]) -> Result<Vec<Row>> {
    let mut sql = table.select_statement().to_string();
    let mut params: Vec<Value> = Vec::with_capacity(conditions.len());

    for (i, c) in conditions.iter().enumerate() {
        let (column, op, value) = match c {
            Condition::Equals(column, value) => (*column, "=", value.clone()),
            Condition::Like(column, pattern) => (*column, "LIKE", Value::Text(pattern.clone())),
        };

        if !table.has_column(column) {
            return Err(Error::UnknownColumn {
                table: table.get_name().to_string(),
                column: column.to_string(),
            });
        }

        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&format!("{} {} ?", quote_ident(column), op));
        params.push(value);
    }

    // Ids increase monotonically, so this is insertion order.
    sql.push_str(if table.has_generated_id() {
        " ORDER BY `id`"
    } else {
        " ORDER BY rowid"
    });

    let mut statement = conn.prepare_cached(&sql)?;
    let rows = statement
        .query_map(rusqlite::params_from_iter(params.iter()), |r| {
            read_row(table, r)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening database at {}", path.display());
        let conn = rusqlite::Connection::open(path)?;
        Database::with_connection(conn)
    }

    /// Open a database which lives only as long as this object.  Mostly useful for testing.
    pub fn open_in_memory() -> Result<Self> {
        Database::with_connection(rusqlite::Connection::open_in_memory()?)
    }

    /// Build a database from an already-existing connection.
    pub fn with_connection(conn: rusqlite::Connection) -> Result<Self> {
        conn.execute_batch(INITIAL_SQL)?;
        Ok(Database { conn })
    }

    pub fn transaction(&mut self) -> Result<Transaction> {
        Ok(Transaction {
            transaction: self.conn.transaction()?,
        })
    }

    /// Names of all tables in the database, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut statement = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = statement
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        check_identifier(table)?;
        Ok(self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |r| r.get(0),
        )?)
    }
}

impl<'a> Transaction<'a> {
    pub fn commit(self) -> Result<()> {
        Ok(self.transaction.commit()?)
    }
}

impl Store for Database {
    fn drop_table_if_exists(&self, name: &str) -> Result<()> {
        drop_table_if_exists(&self.conn, name)
    }

    fn create_table(&self, table: &TableDescriptor) -> Result<()> {
        create_table(&self.conn, table)
    }

    fn create_index(&self, name: &str, table: &str, columns: &[&str]) -> Result<()> {
        create_index(&self.conn, name, table, columns)
    }

    fn insert(&self, table: &TableDescriptor, fk: Option<i64>, values: &[Value]) -> Result<i64> {
        insert(&self.conn, table, fk, values)
    }

    fn select(&self, table: &TableDescriptor, conditions: &[Condition]) -> Result<Vec<Row>> {
        select(&self.conn, table, conditions)
    }
}

impl<'a> Store for Transaction<'a> {
    fn drop_table_if_exists(&self, name: &str) -> Result<()> {
        drop_table_if_exists(&self.transaction, name)
    }

    fn create_table(&self, table: &TableDescriptor) -> Result<()> {
        create_table(&self.transaction, table)
    }

    fn create_index(&self, name: &str, table: &str, columns: &[&str]) -> Result<()> {
        create_index(&self.transaction, name, table, columns)
    }

    fn insert(&self, table: &TableDescriptor, fk: Option<i64>, values: &[Value]) -> Result<i64> {
        insert(&self.transaction, table, fk, values)
    }

    fn select(&self, table: &TableDescriptor, conditions: &[Condition]) -> Result<Vec<Row>> {
        select(&self.transaction, table, conditions)
    }
}
