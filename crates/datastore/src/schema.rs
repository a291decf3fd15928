//! The schema tree: which tables hang off which.
//!
//! A schema is a forest.  Each node names a table; a node's children are the tables whose rows point at rows of the
//! node's table through their `fk` column.  Since ids aren't namespaced by position, a table name may appear only once
//! anywhere in the schema.
use std::collections::HashSet;

use crate::errors::{Error, Result};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaNode {
    name: String,
    children: Vec<SchemaNode>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schema {
    roots: Vec<SchemaNode>,
}

impl SchemaNode {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn iter_children(&self) -> impl Iterator<Item = &SchemaNode> {
        self.children.iter()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn visit_preorder<'a>(&'a self, parent: Option<&'a SchemaNode>, out: &mut Vec<(Option<&'a SchemaNode>, &'a SchemaNode)>) {
        out.push((parent, self));
        for c in self.children.iter() {
            c.visit_preorder(Some(self), out);
        }
    }
}

impl Schema {
    pub fn iter_roots(&self) -> impl Iterator<Item = &SchemaNode> {
        self.roots.iter()
    }

    /// All nodes in pre-order, roots first, paired with their parent.
    pub fn iter_preorder(&self) -> impl Iterator<Item = (Option<&SchemaNode>, &SchemaNode)> {
        let mut out = vec![];
        for r in self.roots.iter() {
            r.visit_preorder(None, &mut out);
        }
        out.into_iter()
    }

    pub fn get_node(&self, name: &str) -> Option<&SchemaNode> {
        self.iter_preorder()
            .map(|(_, n)| n)
            .find(|n| n.get_name() == name)
    }

    /// The parent of the named table, or `None` for roots and unknown tables.
    pub fn get_parent(&self, name: &str) -> Option<&SchemaNode> {
        self.iter_preorder()
            .find(|(_, n)| n.get_name() == name)
            .and_then(|(p, _)| p)
    }

    pub fn is_root(&self, name: &str) -> bool {
        self.roots.iter().any(|r| r.get_name() == name)
    }
}

/// Builds one level of a schema tree.
#[derive(Default)]
pub struct SchemaBuilder {
    nodes: Vec<SchemaNode>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a table with no children.
    pub fn add_table(&mut self, name: &str) -> &mut Self {
        self.add_table_with_children(name, |_| {})
    }

    /// Add a table, calling `children` to add the tables underneath it.
    pub fn add_table_with_children(
        &mut self,
        name: &str,
        children: impl FnOnce(&mut SchemaBuilder),
    ) -> &mut Self {
        let mut builder = SchemaBuilder::new();
        children(&mut builder);
        self.nodes.push(SchemaNode {
            name: name.to_string(),
            children: builder.nodes,
        });
        self
    }

    pub fn build(self) -> Result<Schema> {
        let schema = Schema { roots: self.nodes };

        if schema.roots.is_empty() {
            return Err(Error::InvalidSchema("A schema needs at least one table".into()));
        }

        let mut seen = HashSet::new();
        for (_, n) in schema.iter_preorder() {
            if n.get_name().is_empty() {
                return Err(Error::InvalidSchema("Table names may not be empty".into()));
            }
            if !seen.insert(n.get_name()) {
                return Err(Error::InvalidSchema(format!(
                    "{} appears more than once",
                    n.get_name()
                )));
            }
        }

        Ok(schema)
    }
}
