//! The `jblite` command: build dictionary databases and query them.
mod render;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::*;

use jblite_datastore::Record;
use jblite_dictionaries::{convert, Dictionary, FormatKind};

#[derive(Parser, Debug)]
#[command(name = "jblite", version, about = "Convert JMdict and KANJIDIC2 into SQLite, and search them")]
struct Args {
    /// Log progress to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a database from a dictionary document, gzipped or not.
    Convert {
        src: PathBuf,
        dest: PathBuf,
        /// jmdict or kanjidic2.
        #[arg(short, long, default_value = "kanjidic2")]
        format: FormatKind,
    },

    /// Search by reading, meaning or spelling.
    ///
    /// JMdict queries are SQL LIKE patterns used as given; KANJIDIC2 queries match anywhere.
    Search {
        db: PathBuf,
        /// Joined with spaces.
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(short, long, default_value = "kanjidic2")]
        format: FormatKind,
        /// Only match glosses or meanings in this language.
        #[arg(short = 'L', long)]
        lang: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Print the entry with the given id.
    Lookup {
        db: PathBuf,
        id: i64,
        #[arg(short, long, default_value = "kanjidic2")]
        format: FormatKind,
        #[arg(long)]
        json: bool,
    },

    /// Look up each character of a string in a KANJIDIC2 database.
    Kanji {
        db: PathBuf,
        literals: String,
        #[arg(long)]
        json: bool,
    },
}

fn open(kind: FormatKind, path: &Path) -> Result<Dictionary> {
    Dictionary::open(kind, path).with_context(|| format!("Opening {} database {}", kind, path.display()))
}

fn print_records(kind: FormatKind, records: &[Record], json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if json {
        serde_json::to_writer_pretty(&mut out, records)?;
        writeln!(out)?;
        return Ok(());
    }

    if records.is_empty() {
        writeln!(out, "No results found.")?;
        return Ok(());
    }

    for (i, r) in records.iter().enumerate() {
        writeln!(out, "[Entry {}]", i + 1)?;
        writeln!(out, "{}", render::render(kind, r))?;
        writeln!(out)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    jblite_logging::log_to_stderr(args.verbose);
    debug!("{:?}", args);

    match args.command {
        Command::Convert { src, dest, format } => {
            let stats = convert(format, &src, &dest)
                .with_context(|| format!("Converting {} into {}", src.display(), dest.display()))?;
            for (table, rows) in stats.iter() {
                info!("{}: {} rows", table, rows);
            }
        }
        Command::Search {
            db,
            query,
            format,
            lang,
            json,
        } => {
            let dict = open(format, &db)?;
            let query = query.join(" ");
            let records = dict
                .search(&query, lang.as_deref())
                .with_context(|| format!("Searching for {:?}", query))?;
            print_records(format, &records, json)?;
        }
        Command::Lookup { db, id, format, json } => {
            let dict = open(format, &db)?;
            let record = dict.lookup(id).with_context(|| format!("Looking up {}", id))?;
            print_records(format, &[record], json)?;
        }
        Command::Kanji { db, literals, json } => {
            let dict = open(FormatKind::Kanjidic2, &db)?;
            let mut records = vec![];
            for c in literals.chars() {
                let literal = c.to_string();
                match dict.lookup_literal(&literal)? {
                    Some(r) => records.push(r),
                    None => warn!("{} is not in the dictionary", literal),
                }
            }
            print_records(FormatKind::Kanjidic2, &records, json)?;
        }
    }

    Ok(())
}
