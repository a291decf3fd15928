//! JMdict, the Japanese-multilingual word dictionary.
//!
//! Entries hold kanji and kana spellings (`k_ele`, `r_ele`) and senses, which hold glosses in one or more languages
//! plus part-of-speech and usage notes.  Most of those notes are entities declared in the document's DTD, which we
//! store as ids into the entity table.
use itertools::Itertools;
use jblite_datastore::{Condition, Schema, SchemaBuilder, Store, TableBuilder, TableDescriptor, Value};
use jblite_xml::Element;

use crate::entities::{entity_table, EntitySurrogates};
use crate::errors::Result;
use crate::format::{Format, FormatKind};
use crate::mapping::*;
use crate::tables::{group, key_entity, key_value};

pub const ENTRY_TABLE: &str = "entry";
pub const ENTITY_TABLE: &str = "entity";

/// `xml:lang` is English unless stated.
const DEFAULT_LANG: &str = "eng";

const KEY_VALUE_TABLES: &[&str] = &[
    "ke_pri", "re_restr", "re_pri", "etym", "stagk", "stagr", "xref", "ant", "s_inf", "example", "pri",
];
const KEY_ENTITY_TABLES: &[&str] = &["ke_inf", "re_inf", "pos", "field", "misc", "dial"];

fn schema() -> Result<Schema> {
    let mut b = SchemaBuilder::new();
    b.add_table_with_children(ENTRY_TABLE, |b| {
        b.add_table_with_children("k_ele", |b| {
            b.add_table("ke_inf").add_table("ke_pri");
        });
        b.add_table_with_children("r_ele", |b| {
            b.add_table("re_restr").add_table("re_inf").add_table("re_pri");
        });
        b.add_table("links")
            .add_table("bibl")
            .add_table("etym")
            .add_table("audit");
        b.add_table_with_children("sense", |b| {
            for t in [
                "pos", "field", "misc", "dial", "stagk", "stagr", "xref", "ant", "s_inf", "example", "lsource",
            ] {
                b.add_table(t);
            }
            b.add_table_with_children("gloss", |b| {
                b.add_table("pri");
            });
        });
    });
    Ok(b.build()?)
}

fn tables() -> Result<Vec<TableDescriptor>> {
    let mut tables = vec![];

    let mut entry = TableBuilder::new(ENTRY_TABLE);
    entry.add_integer_column("ent_seq", false)?.add_index(&["ent_seq"])?;
    tables.push(entry.build()?);

    let mut k_ele = TableBuilder::child("k_ele");
    k_ele.add_text_column("value", false)?.add_index(&["value"])?;
    tables.push(k_ele.build()?);

    let mut r_ele = TableBuilder::child("r_ele");
    r_ele
        .add_text_column("value", false)?
        .add_boolean_column("nokanji")?
        .add_index(&["value"])?;
    tables.push(r_ele.build()?);

    let mut links = TableBuilder::child("links");
    links
        .add_text_column("tag", false)?
        .add_text_column("desc", false)?
        .add_text_column("uri", false)?;
    tables.push(links.build()?);

    let mut bibl = TableBuilder::child("bibl");
    bibl.add_text_column("tag", true)?.add_text_column("txt", true)?;
    tables.push(bibl.build()?);

    let mut audit = TableBuilder::child("audit");
    audit
        .add_text_column("update_date", false)?
        .add_text_column("update_details", false)?;
    tables.push(audit.build()?);

    tables.push(group("sense")?);

    let mut lsource = TableBuilder::child("lsource");
    lsource
        .add_text_column("lang", false)?
        .add_boolean_column("partial")?
        .add_boolean_column("wasei")?
        .add_text_column("value", true)?;
    tables.push(lsource.build()?);

    let mut gloss = TableBuilder::child("gloss");
    gloss
        .add_text_column("lang", false)?
        .add_text_column("g_gend", true)?
        .add_text_column("g_type", true)?
        .add_text_column("value", true)?
        .add_boolean_column("pri")?
        .add_index(&["lang"])?
        .add_index(&["value"])?;
    tables.push(gloss.build()?);

    for t in KEY_VALUE_TABLES {
        tables.push(key_value(t)?);
    }
    for t in KEY_ENTITY_TABLES {
        tables.push(key_entity(t)?);
    }

    Ok(tables)
}

fn mappings() -> Vec<(&'static str, TableMapping)> {
    let mut m = vec![
        (ENTRY_TABLE, TableMapping::at(&["entry"], extract_entry)),
        ("k_ele", TableMapping::at(&["k_ele"], extract_k_ele)),
        ("r_ele", TableMapping::at(&["r_ele"], extract_r_ele)),
        ("links", TableMapping::at(&["info", "links"], extract_links)),
        ("bibl", TableMapping::at(&["info", "bibl"], extract_bibl)),
        ("etym", TableMapping::at(&["info", "etym"], extract_value)),
        ("audit", TableMapping::at(&["info", "audit"], extract_audit)),
        ("sense", TableMapping::at(&["sense"], extract_nothing)),
        ("lsource", TableMapping::at(&["lsource"], extract_lsource)),
        (
            "gloss",
            TableMapping::at(&["gloss"], extract_gloss).with_fanout(Fanout {
                table: "pri",
                path: &["pri"],
                when: has_several_pri,
            }),
        ),
        ("pri", TableMapping::from_parent_fanout(extract_value)),
    ];

    // Everything else is named after the element it comes from.
    let same_name: &[(&'static str, &'static [&'static str])] = &[
        ("ke_inf", &["ke_inf"]),
        ("ke_pri", &["ke_pri"]),
        ("re_restr", &["re_restr"]),
        ("re_inf", &["re_inf"]),
        ("re_pri", &["re_pri"]),
        ("pos", &["pos"]),
        ("field", &["field"]),
        ("misc", &["misc"]),
        ("dial", &["dial"]),
        ("stagk", &["stagk"]),
        ("stagr", &["stagr"]),
        ("xref", &["xref"]),
        ("ant", &["ant"]),
        ("s_inf", &["s_inf"]),
        ("example", &["example"]),
    ];
    for (table, path) in same_name.iter().copied() {
        let extract: Extractor = if KEY_ENTITY_TABLES.contains(&table) {
            extract_entity
        } else {
            extract_value
        };
        m.push((table, TableMapping::at(path, extract)));
    }

    m
}

pub(crate) fn format() -> Result<Format> {
    Format::from_parts(
        FormatKind::Jmdict,
        schema()?,
        tables()?,
        ENTRY_TABLE,
        mappings(),
        Some(entity_table(ENTITY_TABLE)?),
        vec![],
    )
}

fn extract_entry(entry: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    let seq = required_child_text(entry, "ent_seq")?;
    Ok(vec![parse_integer(entry, &seq)?.into()])
}

fn extract_k_ele(k_ele: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![required_child_text(k_ele, "keb")?.into()])
}

fn extract_r_ele(r_ele: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        required_child_text(r_ele, "reb")?.into(),
        r_ele.find("re_nokanji").is_some().into(),
    ])
}

fn extract_links(links: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        required_child_text(links, "link_tag")?.into(),
        required_child_text(links, "link_desc")?.into(),
        required_child_text(links, "link_uri")?.into(),
    ])
}

fn extract_bibl(bibl: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        bibl.child_text("bib_tag").into(),
        bibl.child_text("bib_txt").into(),
    ])
}

fn extract_audit(audit: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        required_child_text(audit, "upd_date")?.into(),
        required_child_text(audit, "upd_detl")?.into(),
    ])
}

fn lang(element: &Element) -> Value {
    element.get_attribute("xml:lang").unwrap_or(DEFAULT_LANG).into()
}

fn extract_lsource(lsource: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    let partial = flag_attribute(lsource, "ls_type", false, &[("full", false), ("part", true)])?;
    let wasei = flag_attribute(lsource, "ls_wasei", false, &[("y", true)])?;
    Ok(vec![
        lang(lsource),
        partial.into(),
        wasei.into(),
        lsource.text().into(),
    ])
}

fn extract_gloss(gloss: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        lang(gloss),
        optional_attribute(gloss, "g_gend"),
        optional_attribute(gloss, "g_type"),
        gloss.text().into(),
        has_several_pri(gloss).into(),
    ])
}

/// A lone `<pri>` marker isn't stored; see the gloss `pri` column.
fn has_several_pri(gloss: &Element) -> bool {
    gloss.find_all("pri").nth(1).is_some()
}

/// Ids of entries with a kanji or kana spelling, or a gloss, `LIKE` the query.
///
/// The query is used as given, so callers supply their own wildcards.  Glosses can be limited to one language.  Ids
/// come back in the order first found, spellings before glosses.
pub fn search(format: &Format, store: &impl Store, query: &str, lang: Option<&str>) -> Result<Vec<i64>> {
    let layout = format.get_layout();
    let mut ids = vec![];

    for table in ["k_ele", "r_ele"] {
        for row in store.query_like(layout.get_table(table)?, "value", query)? {
            ids.push(layout.ancestor_id(store, table, &row, ENTRY_TABLE)?);
        }
    }

    let mut conditions = vec![];
    if let Some(l) = lang {
        conditions.push(Condition::Equals("lang", l.into()));
    }
    conditions.push(Condition::Like("value", query.to_string()));
    for row in store.select(layout.get_table("gloss")?, &conditions)? {
        ids.push(layout.ancestor_id(store, "gloss", &row, ENTRY_TABLE)?);
    }

    Ok(ids.into_iter().unique().collect())
}
