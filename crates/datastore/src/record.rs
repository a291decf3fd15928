//! Records: a row plus everything it is a parent of.
use std::collections::BTreeMap;

use crate::row::RowData;

/// A reconstructed row, with its child rows grouped by table.
///
/// Tables which had no rows for this parent are absent from `children` rather than present and empty.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Record {
    pub id: i64,
    pub data: RowData,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Vec<Record>>,
}

impl Record {
    pub fn get_children(&self, table: &str) -> &[Record] {
        self.children.get(table).map(|x| &x[..]).unwrap_or(&[])
    }

    /// Collect descendant records by following a path of table names.
    ///
    /// For example `["sense", "gloss"]` returns every gloss of every sense, in order.  Returns an empty vec if nothing
    /// matches.
    pub fn find_children(&self, path: &[&str]) -> Vec<&Record> {
        let mut records = vec![self];
        for table in path.iter() {
            records = records
                .into_iter()
                .flat_map(|r| r.get_children(table).iter())
                .collect();
        }
        records
    }

    /// Total number of records in this tree, including this one.
    pub fn count(&self) -> usize {
        1 + self
            .children
            .values()
            .flat_map(|x| x.iter())
            .map(|x| x.count())
            .sum::<usize>()
    }
}
