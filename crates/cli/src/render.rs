//! Plain-text rendering of entries.
use std::collections::BTreeMap;
use std::fmt::Write;

use jblite_datastore::Record;
use jblite_dictionaries::kanjidic2::convert_kunyomi;
use jblite_dictionaries::FormatKind;

pub fn render(kind: FormatKind, record: &Record) -> String {
    match kind {
        FormatKind::Jmdict => render_word(record),
        FormatKind::Kanjidic2 => render_kanji(record),
    }
}

fn text<'a>(record: &'a Record, column: &str) -> &'a str {
    record.data.get_text(column).unwrap_or_default()
}

fn texts<'a>(records: impl IntoIterator<Item = &'a Record>, column: &str) -> Vec<&'a str> {
    records
        .into_iter()
        .filter_map(|r| r.data.get_text(column))
        .collect()
}

/// Group records by the text of a column, with groups in sorted order.
fn group_by<'a>(records: &'a [Record], column: &str) -> BTreeMap<&'a str, Vec<&'a Record>> {
    let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for r in records {
        groups.entry(text(r, column)).or_default().push(r);
    }
    groups
}

pub fn render_word(entry: &Record) -> String {
    let mut out = String::new();

    for (table, heading) in [("k_ele", "Kanji readings:"), ("r_ele", "Kana readings:")] {
        let spellings = entry.get_children(table);
        if spellings.is_empty() {
            continue;
        }
        writeln!(out, "{}", heading).ok();
        for (i, s) in spellings.iter().enumerate() {
            writeln!(out, "  Reading {}: {}", i + 1, text(s, "value")).ok();
        }
    }

    let senses = entry.get_children("sense");
    if !senses.is_empty() {
        writeln!(out, "Glosses:").ok();
    }
    for (i, sense) in senses.iter().enumerate() {
        writeln!(out, "  Sense {}:", i + 1).ok();

        let pos = texts(sense.get_children("pos"), "entity");
        if !pos.is_empty() {
            writeln!(out, "    Part of speech: {}", pos.join("; ")).ok();
        }

        for (lang, glosses) in group_by(sense.get_children("gloss"), "lang") {
            writeln!(out, "    Lang: {}", lang).ok();
            for (j, g) in glosses.iter().enumerate() {
                writeln!(out, "      Gloss {}: {}", j + 1, text(g, "value")).ok();
            }
        }
    }

    out.trim_end().to_string()
}

fn readings_of_type<'a>(readings: &'a [Record], reading_type: &str) -> Vec<&'a str> {
    readings
        .iter()
        .filter(|r| r.data.get_text("type") == Some(reading_type))
        .map(|r| text(r, "value"))
        .collect()
}

pub fn render_kanji(character: &Record) -> String {
    let mut out = String::new();

    let literal = text(character, "literal");
    match literal.chars().next() {
        Some(c) => writeln!(out, "Literal: {} (0x{:X})", literal, c as u32).ok(),
        None => writeln!(out, "Literal:").ok(),
    };

    for (i, group) in character.get_children("rmgroup").iter().enumerate() {
        writeln!(out, "Group {}:", i + 1).ok();

        let readings = group.get_children("reading");
        let kunyomi: Vec<String> = readings_of_type(readings, "ja_kun")
            .into_iter()
            .map(convert_kunyomi)
            .collect();
        writeln!(out, "  Kun-yomi: {}", kunyomi.join("、")).ok();
        writeln!(out, "  On-yomi: {}", readings_of_type(readings, "ja_on").join("、")).ok();

        for (lang, meanings) in group_by(group.get_children("meaning"), "lang") {
            writeln!(
                out,
                "  Meanings ({}): {}",
                lang,
                texts(meanings, "value").join("; ")
            )
            .ok();
        }
    }

    let nanori = texts(character.get_children("nanori"), "value");
    if !nanori.is_empty() {
        writeln!(out, "Nanori: {}", nanori.join("、")).ok();
    }

    let strokes: Vec<i64> = character
        .get_children("stroke_count")
        .iter()
        .filter_map(|r| r.data.get_integer("count"))
        .collect();
    match strokes.split_first() {
        Some((first, [])) => writeln!(out, "Stroke count: {}", first).ok(),
        Some((first, miscounts)) => writeln!(
            out,
            "Stroke count: {} (miscounts: {})",
            first,
            miscounts.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(", ")
        )
        .ok(),
        None => None,
    };

    for (column, label) in [("freq", "Frequency"), ("grade", "Jouyou grade"), ("jlpt", "JLPT grade")] {
        if let Some(x) = character.data.get_integer(column) {
            writeln!(out, "{}: {}", label, x).ok();
        }
    }

    out.trim_end().to_string()
}
