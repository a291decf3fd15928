//! Turning a dictionary document into a database file.
//!
//! The database is built under `<dest>.partial` and renamed over `dest` once committed, so nobody opening `dest` ever
//! sees a half-built dictionary.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use jblite_datastore::{Database, Store};
use jblite_logging::timed;
use jblite_xml::{expand_entities, parse_document, read_source, Element, EntityMap};
use log::*;

use crate::entities::{store_entities, EntitySurrogates};
use crate::errors::Result;
use crate::format::{Format, FormatKind};
use crate::loader::{load, LoadStats};

/// Read, parse and load `src` into a new database at `dest`, replacing anything already there.
pub fn convert(kind: FormatKind, src: &Path, dest: &Path) -> Result<LoadStats> {
    let format = Format::new(kind)?;
    info!("Converting {} ({}) into {}", src.display(), kind, dest.display());

    let (document, entities) = read_document(&format, src)?;

    let partial = partial_path(dest);
    remove_if_exists(&partial)?;
    let installed = build(&format, &document, &entities, &partial)
        .and_then(|stats| std::fs::rename(&partial, dest).map(|_| stats).map_err(Into::into));
    let stats = match installed {
        Ok(s) => s,
        Err(e) => {
            if let Err(cleanup) = remove_if_exists(&partial) {
                warn!("Couldn't remove {}: {}", partial.display(), cleanup);
            }
            return Err(e);
        }
    };

    info!("Wrote {} rows to {}", stats.total(), dest.display());
    Ok(stats)
}

/// Read and parse a source document, gzipped or not, along with its entities if the format uses them.
pub fn read_document(format: &Format, src: &Path) -> Result<(Element, EntityMap)> {
    let raw = timed("Reading source", || read_source(src))?;
    let text = String::from_utf8(raw).map_err(jblite_xml::Error::from)?;

    let entities = if format.get_entity_table().is_some() {
        expand_entities(&text)?
    } else {
        EntityMap::new()
    };

    let document = timed("Parsing", || parse_document(text.as_bytes(), &entities))?;
    Ok((document, entities))
}

/// Build a database at `path` inside a single transaction.
pub fn build(format: &Format, document: &Element, entities: &EntityMap, path: &Path) -> Result<LoadStats> {
    let mut db = Database::open(path)?;
    let tx = db.transaction()?;
    let stats = populate(format, document, entities, &tx)?;
    timed("Committing", || tx.commit())?;
    Ok(stats)
}

/// Recreate every table of the format in `store` and fill them from `document`.
///
/// This is destructive and not atomic by itself: run it inside a transaction.
pub fn populate(format: &Format, document: &Element, entities: &EntityMap, store: &impl Store) -> Result<LoadStats> {
    let layout = format.get_layout();
    layout.materialize(store)?;

    let surrogates = match format.get_entity_table() {
        Some(table) => store_entities(table, entities, store)?,
        None => EntitySurrogates::default(),
    };

    let stats = timed("Loading", || load(format, document, &surrogates, store))?;

    for index in format.iter_search_indexes() {
        timed(index.table, || index.build(layout, store))?;
    }

    Ok(stats)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|x| x.to_os_string())
        .unwrap_or_else(|| OsString::from("dictionary"));
    name.push(".partial");
    dest.with_file_name(name)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::Error;

    #[test]
    fn partial_paths() {
        assert_eq!(
            partial_path(Path::new("/tmp/x/kanjidic2.sqlite")),
            PathBuf::from("/tmp/x/kanjidic2.sqlite.partial")
        );
        assert_eq!(partial_path(Path::new("jmdict.db")), PathBuf::from("jmdict.db.partial"));
    }

    #[test]
    fn failed_renames_remove_the_partial_database() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("JMdict.xml");
        std::fs::write(&src, "<!DOCTYPE JMdict [\n]>\n<JMdict></JMdict>").unwrap();

        // A non-empty directory can't be replaced by a file.
        let dest = dir.path().join("jmdict.sqlite");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("keep"), "x").unwrap();

        let err = convert(FormatKind::Jmdict, &src, &dest).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{:?}", err);
        assert!(!partial_path(&dest).exists());
        assert!(dest.join("keep").exists());
    }

    #[test]
    fn missing_sources_fail_before_touching_dest() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.sqlite");
        let result = convert(FormatKind::Kanjidic2, &dir.path().join("nope.xml"), &dest);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }
}
