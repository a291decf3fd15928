//! Small documents in both formats, and a helper to load them into memory.
#![allow(dead_code)]
use anyhow::Result;

use jblite_datastore::Database;
use jblite_dictionaries::{populate, Dictionary, Format, FormatKind, LoadStats};
use jblite_xml::{expand_entities, parse_document, EntityMap};

pub const JMDICT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE JMdict [
<!ELEMENT JMdict (entry*)>
<!ELEMENT entry (ent_seq, k_ele*, r_ele+, info?, sense+)>
<!ENTITY uk "word usually written using kana alone">
<!ENTITY n "noun (common) (futsuumeishi)">
<!ENTITY adj-i "adjective (keiyoushi)">
<!ENTITY v1 "Ichidan verb">
]>
<JMdict>
<entry>
<ent_seq>1000001</ent_seq>
<k_ele>
<keb>猫</keb>
<ke_pri>ichi1</ke_pri>
</k_ele>
<k_ele>
<keb>寝子</keb>
</k_ele>
<r_ele>
<reb>ねこ</reb>
<re_pri>ichi1</re_pri>
</r_ele>
<sense>
<pos>&n;</pos>
<misc>&uk;</misc>
<gloss>cat</gloss>
<gloss xml:lang="ger">Katze</gloss>
</sense>
</entry>
<entry>
<ent_seq>1000002</ent_seq>
<r_ele>
<reb>すごい</reb>
<re_nokanji/>
</r_ele>
<info>
<audit>
<upd_date>2010-01-01</upd_date>
<upd_detl>Entry created</upd_detl>
</audit>
</info>
<sense>
<pos>&adj-i;</pos>
<lsource xml:lang="dut" ls_type="part" ls_wasei="y">zeer</lsource>
<gloss>terrific<pri>a</pri><pri>b</pri><pri>c</pri></gloss>
<gloss>amazing<pri>a</pri></gloss>
</sense>
</entry>
</JMdict>
"#;

pub const KANJIDIC2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE kanjidic2 [
<!ELEMENT kanjidic2 (header,character*)>
]>
<kanjidic2>
<header>
<file_version>4</file_version>
<database_version>2024-001</database_version>
<date_of_creation>2024-01-01</date_of_creation>
</header>
<character>
<literal>生</literal>
<codepoint>
<cp_value cp_type="ucs">751f</cp_value>
<cp_value cp_type="jis208">1-32-24</cp_value>
</codepoint>
<radical>
<rad_value rad_type="classical">100</rad_value>
</radical>
<misc>
<grade>1</grade>
<stroke_count>5</stroke_count>
<freq>29</freq>
<jlpt>4</jlpt>
</misc>
<dic_number>
<dic_ref dr_type="nelson_c">3127</dic_ref>
<dic_ref dr_type="moro" m_vol="7" m_page="0649">21689</dic_ref>
</dic_number>
<query_code>
<q_code qc_type="skip">4-5-3</q_code>
<q_code qc_type="skip" skip_misclass="posn">1-1-4</q_code>
</query_code>
<reading_meaning>
<rmgroup>
<reading r_type="ja_on">セイ</reading>
<reading r_type="ja_on">ショウ</reading>
<reading r_type="ja_kun">い.きる</reading>
<reading r_type="ja_kun">う.まれる</reading>
<reading r_type="ja_kun">なま</reading>
<meaning>life</meaning>
<meaning>genuine</meaning>
<meaning m_lang="fr">vie</meaning>
</rmgroup>
<nanori>いき</nanori>
<nanori>ふ</nanori>
</reading_meaning>
</character>
<character>
<literal>亜</literal>
<codepoint>
<cp_value cp_type="ucs">4e9c</cp_value>
</codepoint>
<radical>
<rad_value rad_type="classical">7</rad_value>
</radical>
<misc>
<grade>8</grade>
<stroke_count>7</stroke_count>
<stroke_count>8</stroke_count>
<variant var_type="jis208">1-48-19</variant>
<freq>1509</freq>
<jlpt>1</jlpt>
</misc>
<reading_meaning>
<rmgroup>
<reading r_type="ja_on">ア</reading>
<reading r_type="ja_kun">つ.ぐ</reading>
<meaning>Asia</meaning>
<meaning>rank next</meaning>
</rmgroup>
</reading_meaning>
</character>
</kanjidic2>
"#;

pub fn parse(kind: FormatKind, doc: &str) -> Result<(Format, jblite_xml::Element, EntityMap)> {
    let format = Format::new(kind)?;
    let entities = if format.get_entity_table().is_some() {
        expand_entities(doc)?
    } else {
        EntityMap::new()
    };
    let document = parse_document(doc.as_bytes(), &entities).map_err(jblite_dictionaries::Error::from)?;
    Ok((format, document, entities))
}

/// Load a document into a fresh in-memory database.
pub fn load_in_memory(kind: FormatKind, doc: &str) -> Result<(Dictionary, LoadStats)> {
    jblite_logging::log_to_stderr(true);

    let (format, document, entities) = parse(kind, doc)?;
    let db = Database::open_in_memory()?;
    let stats = populate(&format, &document, &entities, &db)?;
    Ok((Dictionary::with_database(kind, db)?, stats))
}
