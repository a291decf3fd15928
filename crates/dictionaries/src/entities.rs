//! The entity table, and the ids we substitute for entity references while loading.
use std::collections::HashMap;

use jblite_datastore::{materialize_table, Store, TableBuilder, TableDescriptor, Value, ENTITY_EXPANSION_COLUMN};
use jblite_xml::{Element, EntityMap};
use log::*;

use crate::errors::{Error, Result};

pub const ENTITY_NAME_COLUMN: &str = "entity";

/// `(id, entity, expansion)`.
pub fn entity_table(name: &str) -> Result<TableDescriptor> {
    let mut b = TableBuilder::new(name);
    b.add_text_column(ENTITY_NAME_COLUMN, false)?;
    b.add_text_column(ENTITY_EXPANSION_COLUMN, false)?;
    Ok(b.build()?)
}

/// Maps entities to the ids of their rows in the entity table.
#[derive(Debug, Default)]
pub struct EntitySurrogates {
    by_name: HashMap<String, i64>,
    by_expansion: HashMap<String, i64>,
}

impl EntitySurrogates {
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn get_by_name(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    pub fn get_by_expansion(&self, expansion: &str) -> Option<i64> {
        self.by_expansion.get(expansion).copied()
    }

    /// The entity id for an element whose content is an entity.
    ///
    /// A lone reference like `&uk;` is resolved by name; plain text is taken to be an already expanded entity and
    /// resolved by expansion.
    pub fn id_for(&self, element: &Element) -> Result<i64> {
        if let Some(name) = element.entity_reference() {
            return self
                .get_by_name(name)
                .ok_or_else(|| Error::UnknownEntityReference(name.to_string()));
        }

        let text = element.text().ok_or_else(|| {
            Error::MalformedDocument(format!("<{}> should hold an entity but is empty", element.get_name()))
        })?;
        self.get_by_expansion(&text)
            .ok_or(Error::UnknownEntityReference(text))
    }
}

/// (Re)create the entity table and insert every entity, in declaration order.
///
/// When two names share an expansion, the expansion maps to the later one.
pub fn store_entities(table: &TableDescriptor, entities: &EntityMap, store: &impl Store) -> Result<EntitySurrogates> {
    materialize_table(table, store)?;

    let mut surrogates = EntitySurrogates::default();
    for (name, expansion) in entities.iter() {
        let id = store.insert(
            table,
            None,
            &[Value::from(name.as_str()), Value::from(expansion.as_str())],
        )?;
        surrogates.by_name.insert(name.clone(), id);
        surrogates.by_expansion.insert(expansion.clone(), id);
    }

    info!("Stored {} entities in {}", surrogates.len(), table.get_name());
    Ok(surrogates)
}

#[cfg(test)]
mod tests {
    use super::*;

    use jblite_datastore::Database;

    fn setup() -> (Database, TableDescriptor, EntitySurrogates) {
        let db = Database::open_in_memory().unwrap();
        let table = entity_table("entity").unwrap();
        let mut entities = EntityMap::new();
        entities.insert("uk".into(), "word usually written using kana alone".into());
        entities.insert("n".into(), "noun (common) (futsuumeishi)".into());
        let surrogates = store_entities(&table, &entities, &db).unwrap();
        (db, table, surrogates)
    }

    #[test]
    fn assigns_ids_in_declaration_order() {
        let (db, table, surrogates) = setup();
        let uk = surrogates.get_by_name("uk").unwrap();
        let n = surrogates.get_by_name("n").unwrap();
        assert!(uk < n);
        assert_eq!(
            surrogates.get_by_expansion("word usually written using kana alone"),
            Some(uk)
        );

        let row = db.query_by_id(&table, n).unwrap().unwrap();
        assert_eq!(row.data.get_text(ENTITY_NAME_COLUMN), Some("n"));
        assert_eq!(
            row.data.get_text(ENTITY_EXPANSION_COLUMN),
            Some("noun (common) (futsuumeishi)")
        );
    }

    #[test]
    fn resolves_elements() {
        let (_db, _table, surrogates) = setup();

        let mut by_ref = Element::new("misc");
        by_ref.push_entity("uk", "word usually written using kana alone");
        assert_eq!(surrogates.id_for(&by_ref).unwrap(), surrogates.get_by_name("uk").unwrap());

        let mut by_text = Element::new("pos");
        by_text.push_text(" noun (common) (futsuumeishi) ");
        assert_eq!(surrogates.id_for(&by_text).unwrap(), surrogates.get_by_name("n").unwrap());

        let mut unknown = Element::new("misc");
        unknown.push_entity("mystery", "declared but never stored");
        assert!(matches!(
            surrogates.id_for(&unknown),
            Err(Error::UnknownEntityReference(x)) if x == "mystery"
        ));

        let mut unknown_text = Element::new("misc");
        unknown_text.push_text("not an entity");
        assert!(matches!(
            surrogates.id_for(&unknown_text),
            Err(Error::UnknownEntityReference(_))
        ));

        assert!(matches!(
            surrogates.id_for(&Element::new("misc")),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn storing_again_replaces_the_table() {
        let (db, table, _) = setup();
        let mut entities = EntityMap::new();
        entities.insert("uk".into(), "word usually written using kana alone".into());
        let surrogates = store_entities(&table, &entities, &db).unwrap();
        assert_eq!(surrogates.len(), 1);
        assert_eq!(db.count_rows("entity").unwrap(), 1);
    }
}
