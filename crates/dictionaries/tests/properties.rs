//! Properties which hold for any document: round trips, reloads, and id ordering.
mod utils;

use anyhow::Result;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use jblite_datastore::{Database, Record, Store};
use jblite_dictionaries::{populate, Dictionary, FormatKind};

use utils::*;

#[derive(Clone, Debug)]
struct TestEntry {
    kebs: Vec<String>,
    rebs: Vec<String>,
    glosses: Vec<String>,
}

fn entry_strategy() -> impl Strategy<Value = TestEntry> {
    (
        proptest::collection::vec("[一-龯]{1,4}", 0..3),
        proptest::collection::vec("[ぁ-ゖ]{1,6}", 1..3),
        proptest::collection::vec("[a-z]{1,6}( [a-z]{1,6}){0,2}", 0..4),
    )
        .prop_map(|(kebs, rebs, glosses)| TestEntry { kebs, rebs, glosses })
}

fn build_document(entries: &[TestEntry]) -> String {
    let mut doc = String::from("<?xml version=\"1.0\"?>\n<!DOCTYPE JMdict [\n<!ENTITY n \"noun\">\n]>\n<JMdict>\n");
    for (i, e) in entries.iter().enumerate() {
        doc.push_str(&format!("<entry><ent_seq>{}</ent_seq>", 1000000 + i));
        for keb in e.kebs.iter() {
            doc.push_str(&format!("<k_ele><keb>{}</keb></k_ele>", keb));
        }
        for reb in e.rebs.iter() {
            doc.push_str(&format!("<r_ele><reb>{}</reb></r_ele>", reb));
        }
        doc.push_str("<sense><pos>&n;</pos>");
        for gloss in e.glosses.iter() {
            doc.push_str(&format!("<gloss>{}</gloss>", gloss));
        }
        doc.push_str("</sense></entry>\n");
    }
    doc.push_str("</JMdict>\n");
    doc
}

fn values(records: Vec<&Record>) -> Vec<String> {
    records
        .into_iter()
        .map(|r| r.data.get_text("value").unwrap().to_string())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn documents_round_trip(entries in proptest::collection::vec(entry_strategy(), 1..6)) {
        let (dict, stats) = load_in_memory(FormatKind::Jmdict, &build_document(&entries)).unwrap();
        prop_assert_eq!(stats.get("entry"), entries.len() as u64);

        for (i, expected) in entries.iter().enumerate() {
            let record = dict.lookup(i as i64 + 1).unwrap();
            prop_assert_eq!(record.data.get_integer("ent_seq"), Some(1000000 + i as i64));
            prop_assert_eq!(values(record.find_children(&["k_ele"])), expected.kebs.clone());
            prop_assert_eq!(values(record.find_children(&["r_ele"])), expected.rebs.clone());
            prop_assert_eq!(values(record.find_children(&["sense", "gloss"])), expected.glosses.clone());
            prop_assert_eq!(record.children.contains_key("k_ele"), !expected.kebs.is_empty());
        }

        let past_the_end = dict.lookup(entries.len() as i64 + 1).unwrap_err();
        prop_assert!(past_the_end.is_not_found());
    }
}

fn all_entries(dict: &Dictionary) -> Result<Vec<Record>> {
    let table = dict.get_format().get_layout().get_table("entry")?;
    let mut records = vec![];
    for row in dict.get_database().select(table, &[])? {
        records.push(dict.lookup(row.id.unwrap())?);
    }
    Ok(records)
}

#[test]
fn reloading_gives_the_same_dictionary() -> Result<()> {
    for (kind, doc) in [(FormatKind::Jmdict, JMDICT), (FormatKind::Kanjidic2, KANJIDIC2)] {
        let (format, document, entities) = parse(kind, doc)?;
        let mut db = Database::open_in_memory()?;
        let first = populate(&format, &document, &entities, &db)?;
        let tables = db.list_tables()?;
        let counts = tables
            .iter()
            .map(|t| db.count_rows(t))
            .collect::<Result<Vec<_>, _>>()?;

        {
            let tx = db.transaction()?;
            let second = populate(&format, &document, &entities, &tx)?;
            tx.commit()?;
            assert_eq!(first, second);
        }

        assert_eq!(db.list_tables()?, tables);
        assert_eq!(
            tables
                .iter()
                .map(|t| db.count_rows(t))
                .collect::<Result<Vec<_>, _>>()?,
            counts
        );

        let (fresh, _) = load_in_memory(kind, doc)?;
        let reloaded = Dictionary::with_database(kind, db)?;
        if kind == FormatKind::Jmdict {
            assert_eq!(all_entries(&reloaded)?, all_entries(&fresh)?);
        } else {
            assert_eq!(reloaded.lookup(1)?, fresh.lookup(1)?);
            assert_eq!(reloaded.lookup(2)?, fresh.lookup(2)?);
        }
    }
    Ok(())
}

#[test]
fn child_rows_follow_their_parents_in_id_order() -> Result<()> {
    for (kind, doc) in [(FormatKind::Jmdict, JMDICT), (FormatKind::Kanjidic2, KANJIDIC2)] {
        let (dict, _) = load_in_memory(kind, doc)?;
        let layout = dict.get_format().get_layout();

        for (parent, node) in layout.get_schema().iter_preorder() {
            let rows = dict.get_database().select(layout.get_table(node.get_name())?, &[])?;

            let ids: Vec<_> = rows.iter().filter_map(|r| r.id).collect();
            assert!(ids.windows(2).all(|w| w[0] < w[1]), "{} ids {:?}", node.get_name(), ids);

            if parent.is_some() {
                let fks: Vec<_> = rows.iter().map(|r| r.fk.unwrap()).collect();
                assert!(fks.windows(2).all(|w| w[0] <= w[1]), "{} fks {:?}", node.get_name(), fks);
            }
        }
    }
    Ok(())
}

#[test]
fn rolled_back_loads_leave_nothing_behind() -> Result<()> {
    let doc = JMDICT.replace("<ent_seq>1000002</ent_seq>", "");
    let (format, document, entities) = parse(FormatKind::Jmdict, &doc)?;
    let mut db = Database::open_in_memory()?;

    {
        let tx = db.transaction()?;
        assert!(populate(&format, &document, &entities, &tx).is_err());
        // Dropped without committing.
    }

    assert!(db.list_tables()?.is_empty());
    Ok(())
}
