//! Table descriptors.
//!
//! A table has, in this order:
//!
//! - Optionally, a generated `id INTEGER PRIMARY KEY` column.  Every table which can have children needs one.
//! - Optionally, an `fk INTEGER` column holding the id of the owning row in the parent table.  Every non-root table has
//!   one, and it is always indexed.
//! - Some number of data columns, each of which is an integer, a string, a boolean, or an entity reference (the integer
//!   id of a row in the entity table).
//!
//! Descriptors are plain data.  All tables go through the same generic create/insert/select code, parameterized by the
//! descriptor, and the SQL for that is rendered once when the descriptor is built.
use itertools::Itertools;
use log::*;

use crate::errors::{Error, Result};
use crate::row::Value;

pub const ID_COLUMN: &str = "id";
pub const FK_COLUMN: &str = "fk";

/// Types of a table's data columns.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnType {
    /// This column is a 64-bit signed integer.
    Integer,
    /// This column is a string.
    Text,
    /// This column is a boolean, stored as 0 or 1.
    Boolean,
    /// This column is the id of a row in the entity table.
    Entity,
}

impl ColumnType {
    fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer | ColumnType::Boolean | ColumnType::Entity => "INTEGER",
        }
    }
}

/// A data column in a table.
#[derive(Clone, Debug)]
pub struct ColumnDescriptor {
    name: String,
    column_type: ColumnType,
    nullable: bool,
}

/// A secondary index over one or more columns.
#[derive(Clone, Debug)]
pub struct IndexDescriptor {
    name: String,
    columns: Vec<String>,
}

/// Prebuilt statements for a table.
#[derive(Clone, Debug)]
struct Statements {
    create: String,
    insert: String,
    /// `SELECT <all columns> FROM <table>`, to which conditions are appended.
    select: String,
}

/// Description of a table.
#[derive(Clone, Debug)]
pub struct TableDescriptor {
    name: String,
    columns: Vec<ColumnDescriptor>,
    generated_id: bool,
    parent_fk: bool,
    indexes: Vec<IndexDescriptor>,
    statements: Statements,
}

/// Quote an identifier.  Names are checked to be alphanumeric by the builder, so this can't be escaped out of.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("`{}`", name)
}

pub(crate) fn check_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidDescriptor("Names may not be empty".into()));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::InvalidDescriptor(format!(
            "{} contains characters other than ascii letters, digits, and _",
            name
        )));
    }

    Ok(())
}

impl ColumnDescriptor {
    pub fn new(name: String, column_type: ColumnType, nullable: bool) -> Result<Self> {
        check_identifier(&name)?;
        Ok(Self {
            name,
            column_type,
            nullable,
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Check that a value may be stored in this column.
    fn check_value(&self, table: &str, value: &Value) -> Result<()> {
        let ok = match (self.column_type, value) {
            (_, Value::Null) => self.nullable,
            (ColumnType::Integer | ColumnType::Entity, Value::Integer(_)) => true,
            (ColumnType::Text, Value::Text(_)) => true,
            (ColumnType::Boolean, Value::Bool(_)) => true,
            _ => false,
        };

        if !ok {
            return Err(Error::ValueMismatch {
                table: table.to_string(),
                column: self.name.clone(),
                message: format!("{:?} can't be stored in a {:?} column", value, self.column_type),
            });
        }

        Ok(())
    }
}

impl IndexDescriptor {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|x| x.as_str())
    }
}

impl TableDescriptor {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn has_generated_id(&self) -> bool {
        self.generated_id
    }

    pub fn has_parent_fk(&self) -> bool {
        self.parent_fk
    }

    /// Iterate over the data columns, i.e. everything but `id` and `fk`.
    pub fn iter_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.get_name() == name)
    }

    /// Whether `name` is any column of this table, including the key columns.
    pub fn has_column(&self, name: &str) -> bool {
        (self.generated_id && name == ID_COLUMN)
            || (self.parent_fk && name == FK_COLUMN)
            || self.get_column(name).is_some()
    }

    /// Iterate over all indexes: the fk index if any, then the secondary indexes.
    pub fn iter_indexes(&self) -> impl Iterator<Item = &IndexDescriptor> {
        self.indexes.iter()
    }

    pub(crate) fn create_statement(&self) -> &str {
        &self.statements.create
    }

    pub(crate) fn insert_statement(&self) -> &str {
        &self.statements.insert
    }

    pub(crate) fn select_statement(&self) -> &str {
        &self.statements.select
    }

    /// Check a set of data values against this table's data columns.
    pub fn check_values(&self, fk: Option<i64>, values: &[Value]) -> Result<()> {
        if self.parent_fk != fk.is_some() {
            return Err(Error::ValueMismatch {
                table: self.name.clone(),
                column: FK_COLUMN.to_string(),
                message: if self.parent_fk {
                    "child rows need a parent id".to_string()
                } else {
                    "root rows may not have a parent id".to_string()
                },
            });
        }

        if values.len() != self.columns.len() {
            return Err(Error::ValueMismatch {
                table: self.name.clone(),
                column: "*".to_string(),
                message: format!(
                    "expected {} values but got {}",
                    self.columns.len(),
                    values.len()
                ),
            });
        }

        for (c, v) in self.columns.iter().zip(values.iter()) {
            c.check_value(&self.name, v)?;
        }

        Ok(())
    }
}

const CREATE_TEMPLATE: &str = r#"
CREATE TABLE {{ table }} (
{%- for c in columns %}
    {{ c.name }} {{ c.definition }}{% if not loop.last %},{% endif %}
{%- endfor %}
)
"#;

const INSERT_TEMPLATE: &str = r#"
INSERT INTO {{ table }}
{%- if columns %}({{ columns | join(sep=", ") }}) VALUES (
    {%- for c in columns -%}
    ?{% if not loop.last %}, {% endif -%}
    {%- endfor -%}
)
{%- else %} DEFAULT VALUES{% endif %}
"#;

const SELECT_TEMPLATE: &str = r#"SELECT {{ columns | join(sep=", ") }} FROM {{ table }}"#;

const INDEX_TEMPLATE: &str = r#"CREATE INDEX {{ index }} ON {{ table }} ({{ columns | join(sep=", ") }})"#;

#[derive(serde::Serialize)]
struct ColumnDefinition {
    name: String,
    definition: String,
}

fn build_statements(
    name: &str,
    columns: &[ColumnDescriptor],
    generated_id: bool,
    parent_fk: bool,
) -> Result<Statements> {
    let table = quote_ident(name);

    let mut definitions = vec![];
    if generated_id {
        definitions.push(ColumnDefinition {
            name: quote_ident(ID_COLUMN),
            definition: "INTEGER PRIMARY KEY".into(),
        });
    }
    if parent_fk {
        definitions.push(ColumnDefinition {
            name: quote_ident(FK_COLUMN),
            definition: "INTEGER NOT NULL".into(),
        });
    }
    for c in columns.iter() {
        let null = if c.is_nullable() { "" } else { " NOT NULL" };
        definitions.push(ColumnDefinition {
            name: quote_ident(c.get_name()),
            definition: format!("{}{}", c.get_column_type().sql_type(), null),
        });
    }

    let mut context = tera::Context::new();
    context.insert("table", &table);
    context.insert("columns", &definitions);
    let create = tera::Tera::one_off(CREATE_TEMPLATE, &context, false)?;

    // Inserts never mention the id; sqlite assigns it.
    let insertable = parent_fk
        .then(|| quote_ident(FK_COLUMN))
        .into_iter()
        .chain(columns.iter().map(|c| quote_ident(c.get_name())))
        .collect::<Vec<_>>();
    let mut context = tera::Context::new();
    context.insert("table", &table);
    context.insert("columns", &insertable);
    let insert = tera::Tera::one_off(INSERT_TEMPLATE, &context, false)?;

    let mut context = tera::Context::new();
    context.insert("table", &table);
    context.insert(
        "columns",
        &definitions.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
    );
    let select = tera::Tera::one_off(SELECT_TEMPLATE, &context, false)?;

    let statements = Statements {
        create: create.trim().to_string(),
        insert: insert.trim().to_string(),
        select,
    };
    debug!("Statements for {}: {:?}", name, statements);
    Ok(statements)
}

/// Build a `CREATE INDEX` statement.
pub(crate) fn build_index_statement(index: &str, table: &str, columns: &[&str]) -> Result<String> {
    check_identifier(index)?;
    check_identifier(table)?;
    for c in columns.iter() {
        check_identifier(c)?;
    }

    let mut context = tera::Context::new();
    context.insert("index", &quote_ident(index));
    context.insert("table", &quote_ident(table));
    context.insert(
        "columns",
        &columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>(),
    );
    Ok(tera::Tera::one_off(INDEX_TEMPLATE, &context, false)?)
}

/// A helper to build tables.
///
/// Tables start out with a generated id and no parent fk, which is the shape of a root table; use
/// [TableBuilder::child] for child tables.
pub struct TableBuilder {
    name: String,
    columns: Vec<ColumnDescriptor>,
    generated_id: bool,
    parent_fk: bool,
    indexes: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: vec![],
            generated_id: true,
            parent_fk: false,
            indexes: vec![],
        }
    }

    /// Start a table whose rows each belong to a row of a parent table.
    pub fn child(name: impl Into<String>) -> Self {
        let mut ret = Self::new(name);
        ret.parent_fk = true;
        ret
    }

    /// Tables without generated ids get sqlite's implicit rowid only, and can't have children.
    pub fn set_generated_id(&mut self, generated_id: bool) -> &mut Self {
        self.generated_id = generated_id;
        self
    }

    pub fn set_parent_fk(&mut self, parent_fk: bool) -> &mut Self {
        self.parent_fk = parent_fk;
        self
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if name == ID_COLUMN || name == FK_COLUMN {
            return Err(Error::InvalidDescriptor(format!(
                "{}: {} is reserved for key columns",
                self.name, name
            )));
        }

        if self.columns.iter().map(|x| x.get_name()).any(|x| x == name) {
            return Err(Error::InvalidDescriptor(format!(
                "{}: duplicate column {}",
                self.name, name
            )));
        }

        Ok(())
    }

    fn add_column(&mut self, name: &str, column_type: ColumnType, nullable: bool) -> Result<&mut Self> {
        self.check_name(name)?;
        self.columns
            .push(ColumnDescriptor::new(name.to_string(), column_type, nullable)?);
        Ok(self)
    }

    pub fn add_integer_column(&mut self, name: &str, nullable: bool) -> Result<&mut Self> {
        self.add_column(name, ColumnType::Integer, nullable)
    }

    pub fn add_text_column(&mut self, name: &str, nullable: bool) -> Result<&mut Self> {
        self.add_column(name, ColumnType::Text, nullable)
    }

    pub fn add_boolean_column(&mut self, name: &str) -> Result<&mut Self> {
        // A missing flag is false, never null.
        self.add_column(name, ColumnType::Boolean, false)
    }

    pub fn add_entity_column(&mut self, name: &str) -> Result<&mut Self> {
        self.add_column(name, ColumnType::Entity, false)
    }

    /// Add a secondary index over the given columns, which must already have been added.
    pub fn add_index(&mut self, columns: &[&str]) -> Result<&mut Self> {
        if columns.is_empty() {
            return Err(Error::InvalidDescriptor(format!(
                "{}: indexes need at least one column",
                self.name
            )));
        }

        for c in columns.iter() {
            if self.columns.iter().all(|x| x.get_name() != *c) {
                return Err(Error::UnknownColumn {
                    table: self.name.clone(),
                    column: c.to_string(),
                });
            }
        }

        self.indexes
            .push(columns.iter().map(|x| x.to_string()).collect());
        Ok(self)
    }

    pub fn build(self) -> Result<TableDescriptor> {
        check_identifier(&self.name)?;

        if !self.generated_id && !self.parent_fk && self.columns.is_empty() {
            return Err(Error::InvalidDescriptor(format!(
                "{} has no columns",
                self.name
            )));
        }

        let mut indexes = vec![];
        if self.parent_fk {
            indexes.push(IndexDescriptor {
                name: format!("{}_{}", self.name, FK_COLUMN),
                columns: vec![FK_COLUMN.to_string()],
            });
        }
        for cols in self.indexes {
            indexes.push(IndexDescriptor {
                name: format!("{}_{}", self.name, cols.iter().join("_")),
                columns: cols,
            });
        }

        let statements = build_statements(
            &self.name,
            &self.columns,
            self.generated_id,
            self.parent_fk,
        )?;

        Ok(TableDescriptor {
            name: self.name,
            columns: self.columns,
            generated_id: self.generated_id,
            parent_fk: self.parent_fk,
            indexes,
            statements,
        })
    }
}
