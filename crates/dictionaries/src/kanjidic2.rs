//! KANJIDIC2, the kanji dictionary.
//!
//! One `character` per kanji, with its codepoints, radicals, dictionary references and reading/meaning groups.  A
//! handful of the `misc` values (grade, frequency, JLPT level) are pulled up into the character row itself.  Kun'yomi
//! are written with `.` before okurigana and `-` for affixes, so we index a copy with those stripped for searching.
use itertools::Itertools;
use jblite_datastore::{Condition, Schema, SchemaBuilder, Store, TableBuilder, TableDescriptor, Value};
use jblite_xml::Element;

use crate::entities::EntitySurrogates;
use crate::errors::{Error, Result};
use crate::format::{Format, FormatKind};
use crate::mapping::*;
use crate::search_index::SearchIndex;
use crate::tables::{group, key_value, type_value};

pub const ENTRY_TABLE: &str = "character";
pub const KUNYOMI_INDEX: &str = "kunyomi_lookup";

const DEFAULT_MEANING_LANG: &str = "en";

fn schema() -> Result<Schema> {
    let mut b = SchemaBuilder::new();
    b.add_table("header");
    b.add_table_with_children(ENTRY_TABLE, |b| {
        b.add_table("codepoint")
            .add_table("radical")
            .add_table("stroke_count")
            .add_table("variant")
            .add_table("rad_name")
            .add_table("dic_number")
            .add_table("query_code");
        b.add_table_with_children("rmgroup", |b| {
            b.add_table("reading").add_table("meaning");
        });
        b.add_table("nanori");
    });
    Ok(b.build()?)
}

fn tables() -> Result<Vec<TableDescriptor>> {
    let mut tables = vec![];

    let mut header = TableBuilder::new("header");
    header
        .set_generated_id(false)
        .add_text_column("file_version", false)?
        .add_text_column("database_version", false)?
        .add_text_column("date_of_creation", false)?;
    tables.push(header.build()?);

    let mut character = TableBuilder::new(ENTRY_TABLE);
    character
        .add_text_column("literal", false)?
        .add_integer_column("grade", true)?
        .add_integer_column("freq", true)?
        .add_integer_column("jlpt", true)?
        .add_index(&["literal"])?;
    tables.push(character.build()?);

    for t in ["codepoint", "radical", "variant"] {
        tables.push(type_value(t)?);
    }
    for t in ["rad_name", "nanori"] {
        tables.push(key_value(t)?);
    }

    let mut stroke_count = TableBuilder::child("stroke_count");
    stroke_count.add_integer_column("count", false)?;
    tables.push(stroke_count.build()?);

    let mut dic_number = TableBuilder::child("dic_number");
    dic_number
        .add_text_column("type", false)?
        .add_text_column("m_vol", true)?
        .add_text_column("m_page", true)?
        .add_text_column("value", false)?;
    tables.push(dic_number.build()?);

    let mut query_code = TableBuilder::child("query_code");
    query_code
        .add_text_column("type", false)?
        .add_text_column("skip_misclass", true)?
        .add_text_column("value", false)?;
    tables.push(query_code.build()?);

    tables.push(group("rmgroup")?);

    let mut reading = TableBuilder::child("reading");
    reading
        .add_text_column("type", false)?
        .add_text_column("on_type", true)?
        .add_text_column("r_status", true)?
        .add_text_column("value", false)?
        .add_index(&["value"])?;
    tables.push(reading.build()?);

    let mut meaning = TableBuilder::child("meaning");
    meaning
        .add_text_column("lang", false)?
        .add_text_column("value", false)?
        .add_index(&["lang", "value"])?;
    tables.push(meaning.build()?);

    Ok(tables)
}

fn mappings() -> Vec<(&'static str, TableMapping)> {
    vec![
        ("header", TableMapping::at(&["header"], extract_header)),
        (ENTRY_TABLE, TableMapping::at(&["character"], extract_character)),
        ("codepoint", TableMapping::at(&["codepoint", "cp_value"], extract_codepoint)),
        ("radical", TableMapping::at(&["radical", "rad_value"], extract_radical)),
        ("stroke_count", TableMapping::at(&["misc", "stroke_count"], extract_stroke_count)),
        ("variant", TableMapping::at(&["misc", "variant"], extract_variant)),
        ("rad_name", TableMapping::at(&["misc", "rad_name"], extract_value)),
        ("dic_number", TableMapping::at(&["dic_number", "dic_ref"], extract_dic_ref)),
        ("query_code", TableMapping::at(&["query_code", "q_code"], extract_q_code)),
        ("rmgroup", TableMapping::at(&["reading_meaning", "rmgroup"], extract_nothing)),
        ("reading", TableMapping::at(&["reading"], extract_reading)),
        ("meaning", TableMapping::at(&["meaning"], extract_meaning)),
        ("nanori", TableMapping::at(&["reading_meaning", "nanori"], extract_value)),
    ]
}

fn strip_kunyomi_markers(reading: &str) -> String {
    reading.chars().filter(|c| *c != '.' && *c != '-').collect()
}

fn kunyomi_index() -> SearchIndex {
    SearchIndex {
        table: KUNYOMI_INDEX,
        value_column: "reading",
        root_column: "character_id",
        root_table: ENTRY_TABLE,
        source_table: "reading",
        source_column: "value",
        filter: Some(("type", "ja_kun")),
        normalize: strip_kunyomi_markers,
    }
}

pub(crate) fn format() -> Result<Format> {
    Format::from_parts(
        FormatKind::Kanjidic2,
        schema()?,
        tables()?,
        ENTRY_TABLE,
        mappings(),
        None,
        vec![kunyomi_index()],
    )
}

fn required_attribute(element: &Element, name: &str) -> Result<Value> {
    element.get_attribute(name).map(Value::from).ok_or_else(|| {
        Error::MalformedDocument(format!(
            "<{}> is missing the {} attribute",
            element.get_name(),
            name
        ))
    })
}

fn extract_header(header: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        required_child_text(header, "file_version")?.into(),
        required_child_text(header, "database_version")?.into(),
        required_child_text(header, "date_of_creation")?.into(),
    ])
}

fn extract_character(character: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    let literal = required_child_text(character, "literal")?;
    let (grade, freq, jlpt) = match character.find("misc") {
        Some(misc) => (
            optional_child_integer(misc, "grade")?,
            optional_child_integer(misc, "freq")?,
            optional_child_integer(misc, "jlpt")?,
        ),
        None => (None, None, None),
    };
    Ok(vec![literal.into(), grade.into(), freq.into(), jlpt.into()])
}

fn typed_value(element: &Element, type_attribute: &str) -> Result<Vec<Value>> {
    Ok(vec![
        optional_attribute(element, type_attribute),
        element.text().into(),
    ])
}

fn extract_codepoint(cp_value: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    typed_value(cp_value, "cp_type")
}

fn extract_radical(rad_value: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    typed_value(rad_value, "rad_type")
}

fn extract_variant(variant: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    typed_value(variant, "var_type")
}

fn extract_stroke_count(stroke_count: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    let text = required_text(stroke_count)?;
    Ok(vec![parse_integer(stroke_count, &text)?.into()])
}

fn extract_dic_ref(dic_ref: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        required_attribute(dic_ref, "dr_type")?,
        optional_attribute(dic_ref, "m_vol"),
        optional_attribute(dic_ref, "m_page"),
        required_text(dic_ref)?.into(),
    ])
}

fn extract_q_code(q_code: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        required_attribute(q_code, "qc_type")?,
        optional_attribute(q_code, "skip_misclass"),
        required_text(q_code)?.into(),
    ])
}

fn extract_reading(reading: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        required_attribute(reading, "r_type")?,
        optional_attribute(reading, "on_type"),
        optional_attribute(reading, "r_status"),
        required_text(reading)?.into(),
    ])
}

fn extract_meaning(meaning: &Element, _: &EntitySurrogates) -> Result<Vec<Value>> {
    Ok(vec![
        meaning
            .get_attribute("m_lang")
            .unwrap_or(DEFAULT_MEANING_LANG)
            .into(),
        required_text(meaning)?.into(),
    ])
}

/// Ids of characters with a reading, meaning, nanori or stripped kun'yomi containing `query`, in id order.
///
/// Meanings can be limited to one language.
pub fn search(format: &Format, store: &impl Store, query: &str, lang: Option<&str>) -> Result<Vec<i64>> {
    let layout = format.get_layout();
    let pattern = format!("%{}%", query);
    let mut ids = vec![];

    for table in ["reading", "nanori"] {
        for row in store.query_like(layout.get_table(table)?, "value", &pattern)? {
            ids.push(layout.ancestor_id(store, table, &row, ENTRY_TABLE)?);
        }
    }

    let mut conditions = vec![];
    if let Some(l) = lang {
        conditions.push(Condition::Equals("lang", l.into()));
    }
    conditions.push(Condition::Like("value", pattern.clone()));
    for row in store.select(layout.get_table("meaning")?, &conditions)? {
        ids.push(layout.ancestor_id(store, "meaning", &row, ENTRY_TABLE)?);
    }

    if let Some(index) = format.get_search_index(KUNYOMI_INDEX) {
        ids.extend(index.search(store, &pattern)?);
    }

    Ok(ids.into_iter().unique().sorted().collect())
}

/// The id of the character whose literal is exactly `literal`.
pub fn lookup_literal(format: &Format, store: &impl Store, literal: &str) -> Result<Option<i64>> {
    let table = format.get_layout().get_table(ENTRY_TABLE)?;
    Ok(store
        .query_by_exact_match(table, "literal", literal)?
        .into_iter()
        .next()
        .and_then(|row| row.id))
}

/// Render a kun'yomi for people: okurigana after the `.` go in parentheses and `-` becomes `～`.
pub fn convert_kunyomi(reading: &str) -> String {
    let joined = match reading.split_once('.') {
        Some((stem, okurigana)) => format!("{}({})", stem, okurigana),
        None => reading.to_string(),
    };
    joined.replace('-', "～")
}
