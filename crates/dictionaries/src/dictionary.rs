//! Reading a converted dictionary.
use std::path::Path;

use jblite_datastore::{Database, Reconstructor, Record};
use log::*;

use crate::errors::{Error, Result};
use crate::format::{Format, FormatKind};
use crate::{jmdict, kanjidic2};

#[derive(Debug)]
pub struct Dictionary {
    format: Format,
    db: Database,
}

impl Dictionary {
    /// Open a database previously written by `convert`.
    pub fn open(kind: FormatKind, path: &Path) -> Result<Dictionary> {
        // sqlite would happily create an empty database for us.
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
            .into());
        }

        Dictionary::with_database(kind, Database::open(path)?)
    }

    pub fn with_database(kind: FormatKind, db: Database) -> Result<Dictionary> {
        Ok(Dictionary {
            format: Format::new(kind)?,
            db,
        })
    }

    pub fn get_format(&self) -> &Format {
        &self.format
    }

    pub fn get_database(&self) -> &Database {
        &self.db
    }

    /// Rebuild the entry with the given id, with entities expanded.
    pub fn lookup(&self, id: i64) -> Result<Record> {
        let mut reconstructor = Reconstructor::new(self.format.get_layout(), &self.db);
        if let Some(entities) = self.format.get_entity_table() {
            reconstructor = reconstructor.resolve_entities(entities);
        }
        Ok(reconstructor.lookup(self.format.get_entry_table(), id)?)
    }

    /// Ids of entries matching `query`.  See the format's `search` for what matches.
    pub fn search_ids(&self, query: &str, lang: Option<&str>) -> Result<Vec<i64>> {
        let ids = match self.format.get_kind() {
            FormatKind::Jmdict => jmdict::search(&self.format, &self.db, query, lang)?,
            FormatKind::Kanjidic2 => kanjidic2::search(&self.format, &self.db, query, lang)?,
        };
        debug!("{:?} matched {} entries", query, ids.len());
        Ok(ids)
    }

    pub fn search(&self, query: &str, lang: Option<&str>) -> Result<Vec<Record>> {
        self.search_ids(query, lang)?
            .into_iter()
            .map(|id| self.lookup(id))
            .collect()
    }

    /// The kanji entry for a single character.
    pub fn lookup_literal(&self, literal: &str) -> Result<Option<Record>> {
        if self.format.get_kind() != FormatKind::Kanjidic2 {
            return Err(Error::Unsupported {
                format: self.format.get_kind().get_name(),
                operation: "literal lookups",
            });
        }

        kanjidic2::lookup_literal(&self.format, &self.db, literal)?
            .map(|id| self.lookup(id))
            .transpose()
    }
}
