//! Extracting entity declarations from a document's internal DTD subset.
//!
//! This is not a DTD parser.  We find the `<!DOCTYPE ... ]>` block and pull out every general entity declaration of the
//! form `<!ENTITY name "expansion">`; everything else in the block is ignored.
use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::*;
use regex::Regex;

use crate::errors::{Error, Result};

/// Entity name to expansion, in declaration order.
pub type EntityMap = IndexMap<String, String>;

const DTD_START: &str = "<!DOCTYPE";
const DTD_END: &str = "]>";

lazy_static! {
    static ref ENTITY_DECLARATION: Regex =
        Regex::new(r#"<!ENTITY\s+([A-Za-z0-9._-]+)\s+"([^"]*)"\s*>"#)
            .expect("The entity declaration regex is valid");
}

/// Find the internal subset, from `<!DOCTYPE` through the first `]>` after it.
pub fn find_internal_subset(raw: &str) -> Result<&str> {
    let start = raw.find(DTD_START).ok_or_else(|| {
        Error::MalformedDocument("Could not find the start of the internal DTD".into())
    })?;
    let end = raw[start..].find(DTD_END).ok_or_else(|| {
        Error::MalformedDocument("Could not find the end of the internal DTD".into())
    })?;
    Ok(&raw[start..start + end + DTD_END.len()])
}

/// Collect the entity declarations of a raw document.
///
/// If a name is declared more than once, the last declaration wins (and we warn about it).
pub fn expand_entities(raw: &str) -> Result<EntityMap> {
    let dtd = find_internal_subset(raw)?;
    let mut entities = EntityMap::new();

    for caps in ENTITY_DECLARATION.captures_iter(dtd) {
        let name = caps[1].to_string();
        let expansion = caps[2].to_string();
        if let Some(previous) = entities.insert(name.clone(), expansion) {
            warn!(
                "Entity {} is declared more than once; replacing {:?}",
                name, previous
            );
        }
    }

    info!("Found {} entity declarations", entities.len());
    Ok(entities)
}
